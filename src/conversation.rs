//! Conversation state shared by the interactive screen and its tests.
//!
//! Every submitted message walks `Idle -> Sending -> {Resolved, Failed} -> Idle`.
//! A conversation counts how many exchanges are in `Sending`; the typing row is
//! shown while that count is non-zero.

use tracing::{debug, error};

use crate::error::ReplyError;

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// One chat turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender: Sender,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            content: content.into(),
        }
    }

    pub fn bot(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::Bot,
            content: content.into(),
        }
    }
}

/// Identifies one submitted exchange in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A renderable row of the message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Row<'a> {
    Message(&'a Message),
    Typing,
}

#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    in_flight: usize,
    next_id: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_typing(&self) -> bool {
        self.in_flight > 0
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Appends the user's message and moves a new exchange into `Sending`.
    pub fn begin_exchange(&mut self, content: String) -> RequestId {
        let id = RequestId(self.next_id);
        self.next_id += 1;

        self.messages.push(Message::user(content));
        self.in_flight += 1;
        debug!(request = %id, in_flight = self.in_flight, "exchange started");
        id
    }

    /// Settles an exchange. A reply is appended on success; a failure is
    /// logged and handed back so callers can choose to ignore it.
    pub fn complete_exchange(
        &mut self,
        id: RequestId,
        outcome: Result<String, ReplyError>,
    ) -> Result<(), ReplyError> {
        self.in_flight = self.in_flight.saturating_sub(1);

        match outcome {
            Ok(answer) => {
                self.messages.push(Message::bot(answer));
                debug!(request = %id, in_flight = self.in_flight, "exchange resolved");
                Ok(())
            }
            Err(err) => {
                error!(request = %id, in_flight = self.in_flight, "error calling answer service: {}", err);
                Err(err)
            }
        }
    }

    /// Rows in display order, with the typing row last while a reply is pending.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + Clone {
        self.messages
            .iter()
            .map(Row::Message)
            .chain(self.is_typing().then_some(Row::Typing))
    }
}
