use async_trait::async_trait;

use crate::{
    domain::{ChatId, SentMessage},
    Result,
};

/// Hexagonal port for the messaging provider.
///
/// Each method maps to exactly one request against the provider. Implementations
/// must not retry and must map failures into `Error::Transport` or
/// `Error::Provider`.
#[async_trait]
pub trait BotApi: Send + Sync {
    async fn send_message(&self, chat_id: &ChatId, text: &str) -> Result<SentMessage>;

    /// Returns the provider's update list verbatim.
    async fn get_updates(&self, limit: i64) -> Result<Vec<serde_json::Value>>;
}
