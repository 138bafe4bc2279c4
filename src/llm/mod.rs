//! Language-model completion
//!
//! A [`CompletionClient`] takes an ordered list of role-tagged messages and
//! returns one generated assistant message. Callers get no retries; a failed
//! call surfaces straight to the route layer.

mod openai;

pub use openai::OpenAiChat;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A role-tagged message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Generates one reply for a conversation
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Complete the conversation with a single assistant message
    ///
    /// # Errors
    ///
    /// Returns `RateLimited` when throttled, `InvalidRequest` when the API
    /// rejects the input, and `Upstream` for any other failure
    async fn complete(&self, model: &str, messages: &[Message]) -> Result<Message>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::assistant("안녕")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"안녕"}"#);
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), r#""system""#);
    }
}
