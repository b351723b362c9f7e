use thiserror::Error;

/// Failure of a reply exchange.
///
/// Transport errors, non-success statuses and unreadable bodies all collapse
/// into the one variant. The message is for logs, not for display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplyError {
    #[error("request failed: {0}")]
    RequestFailed(String),
}

impl From<reqwest::Error> for ReplyError {
    fn from(err: reqwest::Error) -> Self {
        ReplyError::RequestFailed(err.to_string())
    }
}
