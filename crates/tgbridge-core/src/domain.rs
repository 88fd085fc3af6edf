use std::fmt;

use serde::{Deserialize, Serialize};

/// Telegram bot token.
///
/// Never printed: `Debug` is redacted and there is no `Display` impl.
#[derive(Clone, PartialEq, Eq)]
pub struct BotToken(String);

impl BotToken {
    /// Returns `None` for an empty or whitespace-only token.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BotToken(***)")
    }
}

/// Telegram chat target: a numeric id or an `@username`, kept as given.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub String);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

/// A message the provider accepted.
#[derive(Clone, Debug)]
pub struct SentMessage {
    pub message_id: MessageId,
    /// Resolved numeric chat id when the provider reports one.
    pub chat_id: Option<i64>,
    /// The provider's `Message` object, untouched.
    pub raw: serde_json::Value,
}

impl SentMessage {
    /// Extract ids from a Telegram `Message` JSON object.
    pub fn from_raw(raw: serde_json::Value) -> Option<Self> {
        let message_id = raw.get("message_id").and_then(|v| v.as_i64())?;
        let chat_id = raw
            .get("chat")
            .and_then(|c| c.get("id"))
            .and_then(|v| v.as_i64());
        Some(Self {
            message_id: MessageId(message_id),
            chat_id,
            raw,
        })
    }
}
