//! Telegram Bot API adapter.
//!
//! Implements the `tgbridge-core` `BotApi` port with one plain HTTPS request per
//! call. Update and message payloads are passed through as raw JSON.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, instrument};

use tgbridge_core::{
    config::Config,
    domain::{BotToken, ChatId, SentMessage},
    errors::Error,
    ports::BotApi,
    Result,
};

/// Telegram response envelope (`{"ok": .., "result": ..}` or an error).
#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    result: Option<Value>,
    description: Option<String>,
    error_code: Option<u16>,
}

#[derive(Debug, Serialize)]
struct SendMessageBody<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Clone)]
pub struct TelegramClient {
    token: BotToken,
    base_url: String,
    http: reqwest::Client,
}

impl TelegramClient {
    pub fn new(
        token: BotToken,
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let http = builder
            .build()
            .map_err(|e| Error::Config(format!("http client build failed: {e}")))?;
        Ok(Self {
            token,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            cfg.telegram_bot_token.clone(),
            cfg.telegram_api_base_url.clone(),
            cfg.http_timeout,
        )
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.base_url, self.token.expose())
    }

    /// Scrub anything that could carry the token (reqwest errors embed the URL).
    fn transport_err(&self, e: reqwest::Error) -> Error {
        let msg = e.without_url().to_string();
        Error::Transport(msg.replace(self.token.expose(), "***"))
    }

    async fn call<B: Serialize + ?Sized>(&self, method: &str, body: &B) -> Result<Value> {
        let resp = self
            .http
            .post(self.method_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_err(e))?;

        let status = resp.status();
        let raw = resp.text().await.map_err(|e| self.transport_err(e))?;
        debug!(method, status = status.as_u16(), "telegram response");

        match serde_json::from_str::<ApiResponse>(&raw) {
            Ok(ApiResponse {
                ok: true,
                result: Some(result),
                ..
            }) if status.is_success() => Ok(result),
            Ok(r) => Err(Error::Provider {
                status: r.error_code.unwrap_or(status.as_u16()),
                message: r.description.unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                }),
            }),
            Err(_) => Err(Error::Provider {
                status: status.as_u16(),
                message: if raw.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("empty response")
                        .to_string()
                } else {
                    raw.chars().take(200).collect()
                },
            }),
        }
    }
}

#[async_trait]
impl BotApi for TelegramClient {
    #[instrument(skip(self, chat_id, text), fields(chat_id = %chat_id))]
    async fn send_message(&self, chat_id: &ChatId, text: &str) -> Result<SentMessage> {
        let result = self
            .call(
                "sendMessage",
                &SendMessageBody {
                    chat_id: &chat_id.0,
                    text,
                },
            )
            .await?;

        SentMessage::from_raw(result).ok_or_else(|| Error::Provider {
            status: 200,
            message: "sendMessage result has no message_id".to_string(),
        })
    }

    #[instrument(skip(self))]
    async fn get_updates(&self, limit: i64) -> Result<Vec<Value>> {
        match self.call("getUpdates", &json!({ "limit": limit })).await? {
            Value::Array(updates) => Ok(updates),
            other => Err(Error::Provider {
                status: 200,
                message: format!("getUpdates returned a non-list result: {other}"),
            }),
        }
    }
}
