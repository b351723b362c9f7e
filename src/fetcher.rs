use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ReplyError;

pub const DEFAULT_ENDPOINT: &str = "https://secretariadigital.herokuapp.com/answer_query";

#[derive(Serialize)]
struct AnswerRequest<'a> {
    user_message: &'a str,
}

#[derive(Deserialize)]
struct AnswerResponse {
    answer: String,
}

/// Something that turns one user message into one bot reply.
#[async_trait]
pub trait ReplyFetcher: Send + Sync {
    async fn fetch_reply(&self, user_message: &str) -> Result<String, ReplyError>;
}

#[derive(Clone)]
pub struct HttpReplyFetcher {
    client: Client,
    endpoint: String,
}

impl HttpReplyFetcher {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    /// Builds a fetcher whose requests give up after `timeout`.
    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self, ReplyError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReplyFetcher for HttpReplyFetcher {
    async fn fetch_reply(&self, user_message: &str) -> Result<String, ReplyError> {
        debug!(endpoint = %self.endpoint, "posting user message");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&AnswerRequest { user_message })
            .send()
            .await?
            .error_for_status()?;

        let body: AnswerResponse = response.json().await?;
        Ok(body.answer)
    }
}
