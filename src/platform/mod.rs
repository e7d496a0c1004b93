pub mod discord;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ApiError;

/// Author of a channel message.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Author {
    pub id: String,
    #[serde(default)]
    pub username: String,
}

/// A message snapshot as returned by the messaging API. Never stored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    pub id: String,
    /// Empty for attachment- or embed-only messages.
    #[serde(default)]
    pub content: String,
    pub author: Author,
}

/// The channel the responder watches and posts to.
#[async_trait]
pub trait ChatChannel: Send + Sync {
    /// Latest `limit` messages, newest first.
    async fn fetch_recent(&self, limit: u32) -> Result<Vec<Message>, ApiError>;

    /// Post `content`, threaded under `reply_to` when given.
    async fn send(&self, content: &str, reply_to: Option<&str>) -> Result<(), ApiError>;
}
