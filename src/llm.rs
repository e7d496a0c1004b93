use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::config::LlmConfig;
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

/// Something that turns a conversation into generated text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// `Ok(None)` when the endpoint answered but the body has no usable first choice.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Option<String>, ApiError>;
}

/// OpenAI-compatible chat-completions client (Groq by default).
pub struct LlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl CompletionBackend for LlmClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<Option<String>, ApiError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let url = self.config.completions_url();

        debug!("Sending request to {}: {}", self.config.provider, url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await);
        }

        let body = response.text().await?;
        let value: serde_json::Value = serde_json::from_str(&body)?;
        Ok(first_choice_text(&value))
    }
}

/// `choices[0].message.content`, if the body has that shape.
fn first_choice_text(value: &serde_json::Value) -> Option<String> {
    value
        .pointer("/choices/0/message/content")
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}
