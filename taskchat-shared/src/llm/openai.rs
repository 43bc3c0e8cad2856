/// OpenAI-compatible chat-completions client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChatMessage, ChatModel, ChatReply, ChatRequest, LlmError};

/// Default API key value that means "not configured"
pub const PLACEHOLDER_API_KEY: &str = "your_openai_api_key_here";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Connection settings for [`OpenAiClient`]
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,

    /// Base URL without trailing slash, e.g. `https://api.openai.com/v1`
    pub base_url: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    model: Option<String>,
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for `POST {base_url}/chat/completions`
pub struct OpenAiClient {
    http_client: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, LlmError> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::HttpError {
                status: 0,
                body: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            http_client,
            config,
        })
    }

    fn endpoint_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

/// Pulls the first choice's content out of a response body
fn parse_reply(body: &str, requested_model: &str) -> Result<ChatReply, LlmError> {
    let response: CompletionResponse = serde_json::from_str(body)?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(LlmError::EmptyResponse)?;

    Ok(ChatReply {
        content,
        model: response
            .model
            .unwrap_or_else(|| requested_model.to_string()),
    })
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, request: ChatRequest) -> Result<ChatReply, LlmError> {
        if !self.is_configured() {
            return Err(LlmError::NotConfigured);
        }

        let body = CompletionRequest {
            model: &self.config.model,
            messages: &request.messages,
        };

        tracing::debug!(
            model = %self.config.model,
            messages = request.messages.len(),
            "Requesting chat completion"
        );

        let response = self
            .http_client
            .post(self.endpoint_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "Chat completion failed");
            return Err(LlmError::HttpError {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_reply(&text, &self.config.model)
    }

    fn is_configured(&self) -> bool {
        let key = self.config.api_key.trim();
        !key.is_empty() && key != PLACEHOLDER_API_KEY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(api_key: &str, base_url: &str) -> OpenAiClient {
        OpenAiClient::new(OpenAiConfig {
            api_key: api_key.to_string(),
            model: "gpt-4o".to_string(),
            base_url: base_url.to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_is_configured() {
        assert!(!client(PLACEHOLDER_API_KEY, "https://api.openai.com/v1").is_configured());
        assert!(!client("  ", "https://api.openai.com/v1").is_configured());
        assert!(client("sk-real", "https://api.openai.com/v1").is_configured());
    }

    #[test]
    fn test_endpoint_url_ignores_trailing_slash() {
        assert_eq!(
            client("k", "https://api.openai.com/v1/").endpoint_url(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_parse_reply() {
        let body = r#"{
            "id": "chatcmpl-1",
            "model": "gpt-4o-2024-08-06",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Done!"}}]
        }"#;
        let reply = parse_reply(body, "gpt-4o").unwrap();
        assert_eq!(reply.content, "Done!");
        assert_eq!(reply.model, "gpt-4o-2024-08-06");

        assert!(matches!(
            parse_reply(r#"{"choices": []}"#, "gpt-4o"),
            Err(LlmError::EmptyResponse)
        ));
        for content in [r#""""#, r#"" \n ""#, "null"] {
            let body = format!(
                r#"{{"choices": [{{"message": {{"role": "assistant", "content": {}}}}}]}}"#,
                content
            );
            assert!(matches!(
                parse_reply(&body, "gpt-4o"),
                Err(LlmError::EmptyResponse)
            ));
        }
        assert!(matches!(
            parse_reply("not json", "gpt-4o"),
            Err(LlmError::SerializationError(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_without_key_fails_fast() {
        let result = client(PLACEHOLDER_API_KEY, "http://127.0.0.1:9")
            .complete(ChatRequest::default())
            .await;
        assert!(matches!(result, Err(LlmError::NotConfigured)));
    }
}
