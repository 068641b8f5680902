//! Chat gateway contract consumed by the poll controller.
//!
//! Every call returns a [`GatewayResult`]. Callers decide per call whether a
//! transient failure is swallowed or propagated by matching on
//! [`GatewayError::is_transient`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for chat gateway calls.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors returned by [`ChatGateway`] implementations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Timeouts, connection failures, rate limiting and provider outages.
    #[error("transient failure calling {method}: {detail}")]
    Transient { method: &'static str, detail: String },
    /// The API answered but refused the request.
    #[error("{method} rejected (status {status}): {description}")]
    Rejected {
        method: &'static str,
        status: u16,
        description: String,
    },
    #[error("failed to decode {method} response: {detail}")]
    Decode { method: &'static str, detail: String },
    #[error("chat gateway client unavailable: {0}")]
    Client(String),
}

impl GatewayError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Identifiers of a freshly sent poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPoll {
    pub message_id: i64,
    pub poll_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl User {
    /// First and last name joined by a space, skipping a missing last name.
    pub fn display_name(&self) -> String {
        match self.last_name.as_deref().map(str::trim) {
            Some(last) if !last.is_empty() => format!("{} {last}", self.first_name),
            _ => self.first_name.clone(),
        }
    }
}

/// A vote (or retraction, when `option_ids` is empty) in a non-anonymous poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollAnswer {
    pub poll_id: String,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub option_ids: Vec<usize>,
}

/// An update record; only poll answers are modelled, other payloads are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub poll_answer: Option<PollAnswer>,
}

/// Operations the poll controller needs from the chat platform.
pub trait ChatGateway {
    fn send_message(&self, chat_id: &str, text: &str) -> GatewayResult<()>;

    /// Sends a single-choice, non-anonymous poll.
    fn send_poll(&self, chat_id: &str, question: &str, options: &[String])
        -> GatewayResult<SentPoll>;

    /// Closes a poll so no further votes are accepted.
    fn stop_poll(&self, chat_id: &str, message_id: i64) -> GatewayResult<()>;

    /// Lists pending updates starting at `offset`, or all retained updates
    /// when `offset` is `None`. Negative offsets count back from the newest.
    fn get_updates(&self, offset: Option<i64>) -> GatewayResult<Vec<Update>>;
}

impl<G: ChatGateway + ?Sized> ChatGateway for &G {
    fn send_message(&self, chat_id: &str, text: &str) -> GatewayResult<()> {
        (**self).send_message(chat_id, text)
    }

    fn send_poll(
        &self,
        chat_id: &str,
        question: &str,
        options: &[String],
    ) -> GatewayResult<SentPoll> {
        (**self).send_poll(chat_id, question, options)
    }

    fn stop_poll(&self, chat_id: &str, message_id: i64) -> GatewayResult<()> {
        (**self).stop_poll(chat_id, message_id)
    }

    fn get_updates(&self, offset: Option<i64>) -> GatewayResult<Vec<Update>> {
        (**self).get_updates(offset)
    }
}
