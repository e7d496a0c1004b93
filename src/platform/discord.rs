use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::config::DiscordConfig;
use crate::error::ApiError;
use crate::platform::{ChatChannel, Message};

#[derive(Debug, Serialize)]
struct CreateMessage<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message_reference: Option<MessageReference<'a>>,
}

#[derive(Debug, Serialize)]
struct MessageReference<'a> {
    message_id: &'a str,
}

/// Discord REST client bound to a single channel.
pub struct DiscordChannel {
    client: reqwest::Client,
    base_url: String,
    token: String,
    channel_id: String,
}

impl DiscordChannel {
    pub fn new(config: &DiscordConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            channel_id: config.channel_id.clone(),
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/channels/{}/messages", self.base_url, self.channel_id)
    }
}

#[async_trait]
impl ChatChannel for DiscordChannel {
    async fn fetch_recent(&self, limit: u32) -> Result<Vec<Message>, ApiError> {
        let url = self.messages_url();
        debug!("Fetching {} messages from {}", limit, url);

        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit)])
            .header("Authorization", &self.token)
            .header("Content-Type", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await);
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn send(&self, content: &str, reply_to: Option<&str>) -> Result<(), ApiError> {
        let request = CreateMessage {
            content,
            message_reference: reply_to.map(|message_id| MessageReference { message_id }),
        };

        let response = self
            .client
            .post(self.messages_url())
            .header("Authorization", &self.token)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await);
        }

        Ok(())
    }
}
