/// Chat-completion client used by the chat endpoint
///
/// The API talks to the model only through [`ChatModel`], so handlers can be
/// exercised in tests with a canned implementation. [`OpenAiClient`] is the
/// production implementation against any OpenAI-compatible
/// `/chat/completions` endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod openai;

pub use openai::{OpenAiClient, OpenAiConfig, PLACEHOLDER_API_KEY};

/// One message in the conversation sent to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user` or `assistant`
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Completion request
#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    /// Conversation so far, oldest first
    pub messages: Vec<ChatMessage>,
}

/// Completion result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub content: String,

    /// Model that produced the reply, as reported by the provider
    pub model: String,
}

/// Errors that can occur when calling the model
#[derive(Debug, Error)]
pub enum LlmError {
    /// No usable API key
    #[error("Language model is not configured")]
    NotConfigured,

    #[error("HTTP error (status {status}): {body}")]
    HttpError { status: u16, body: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// The provider answered but without any message content
    #[error("Empty response from provider")]
    EmptyResponse,
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::HttpError {
            status: err.status().map(|s| s.as_u16()).unwrap_or(0),
            body: err.to_string(),
        }
    }
}

/// Interface all chat model implementations satisfy
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Sends the conversation and returns the assistant's reply
    async fn complete(&self, request: ChatRequest) -> Result<ChatReply, LlmError>;

    /// False while the client has no real credentials
    fn is_configured(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_serializes_as_openai_shape() {
        let json = serde_json::to_value(ChatMessage::new("user", "hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hi"}));
    }

    #[test]
    fn test_error_display() {
        let err = LlmError::HttpError {
            status: 429,
            body: "slow down".to_string(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("slow down"));

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(LlmError::from(json_err), LlmError::SerializationError(_)));
    }
}
