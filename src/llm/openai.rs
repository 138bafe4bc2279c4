//! `OpenAI` chat completions backend

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{CompletionClient, Message, Role};
use crate::{Error, Result};

/// Chat completions over the `OpenAI` HTTP API
pub struct OpenAiChat {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl OpenAiChat {
    /// Create a new chat client
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(api_key: SecretString, base_url: &str) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(
                "OpenAI API key required for chat completions".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiChat {
    async fn complete(&self, model: &str, messages: &[Message]) -> Result<Message> {
        tracing::debug!(model, messages = messages.len(), "requesting chat completion");

        let request = ChatCompletionRequest { model, messages };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "chat completion request failed");
                Error::Upstream(format!("chat completion request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "chat completion API error");
            return Err(Error::from_status("chat completion", status, &body));
        }

        let result: ChatCompletionResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse chat completion response");
            Error::Upstream(format!("failed to parse chat completion response: {e}"))
        })?;

        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Upstream("chat completion returned no choices".to_string()))?;

        tracing::debug!(model, chars = content.chars().count(), "chat completion complete");
        Ok(Message {
            role: Role::Assistant,
            content,
        })
    }

    fn name(&self) -> &'static str {
        "openai-chat"
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_api_key() {
        let result = OpenAiChat::new(SecretString::from(String::new()), "https://api.openai.com/v1");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let chat = OpenAiChat::new(SecretString::from("sk-test".to_string()), "http://localhost:9/v1/")
            .unwrap();
        assert_eq!(chat.base_url, "http://localhost:9/v1");
    }

    #[test]
    fn request_serializes_messages_in_order() {
        let messages = [Message::system("persona"), Message::user("안녕하세요")];
        let request = ChatCompletionRequest {
            model: "gpt-4",
            messages: &messages,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "안녕하세요");
    }
}
