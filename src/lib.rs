pub mod app;
pub mod config;
pub mod conversation;
pub mod error;
pub mod fetcher;
pub mod handler;
pub mod input;
pub mod logging;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::{Config, Overrides, Settings};
pub use conversation::{Conversation, Message, RequestId, Row, Sender};
pub use error::ReplyError;
pub use fetcher::{HttpReplyFetcher, ReplyFetcher, DEFAULT_ENDPOINT};
pub use input::InputBuffer;
