//! Tool registry: the fixed set of operations exposed to the host.
//!
//! Arguments are validated here, before the provider port is touched. Each
//! successful validation leads to exactly one provider call.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    domain::{ChatId, SentMessage},
    errors::Error,
    ports::BotApi,
    render, Result,
};

pub const SEND_MESSAGE: &str = "send_telegram_message";
pub const GET_UPDATES: &str = "get_telegram_updates";
pub const DEFAULT_UPDATES_LIMIT: i64 = 10;

/// Tool declaration as advertised to the host.
#[derive(Clone, Debug, Serialize)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

pub fn definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: SEND_MESSAGE,
            description: "Send a message to a Telegram chat",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "chat_id": {
                        "type": "string",
                        "description": "Telegram chat ID or username (e.g., '@mychannel')"
                    },
                    "text": {
                        "type": "string",
                        "description": "Message text to send"
                    }
                },
                "required": ["chat_id", "text"]
            }),
        },
        ToolDefinition {
            name: GET_UPDATES,
            description: "Get recent messages from Telegram bot",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "limit": {
                        "type": "integer",
                        "description": "Number of updates to retrieve (default: 10)",
                        "default": DEFAULT_UPDATES_LIMIT
                    }
                }
            }),
        },
    ]
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendMessageArgs {
    pub chat_id: ChatId,
    pub text: String,
}

impl SendMessageArgs {
    pub fn parse(args: &Value) -> Result<Self> {
        // Numeric chat ids are common in model output; keep their decimal form.
        let chat_id = match args.get("chat_id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let text = args
            .get("text")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        // Presence only: whitespace is forwarded and left to the provider.
        if chat_id.is_empty() || text.is_empty() {
            return Err(Error::Validation(
                "chat_id and text are required".to_string(),
            ));
        }

        Ok(Self {
            chat_id: ChatId(chat_id),
            text,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GetUpdatesArgs {
    pub limit: i64,
}

impl Default for GetUpdatesArgs {
    fn default() -> Self {
        Self {
            limit: DEFAULT_UPDATES_LIMIT,
        }
    }
}

impl GetUpdatesArgs {
    pub fn parse(args: &Value) -> Result<Self> {
        let limit = match args.get("limit") {
            None | Some(Value::Null) => DEFAULT_UPDATES_LIMIT,
            Some(v) => integral(v).ok_or_else(|| {
                Error::Validation(format!("limit must be an integer, got {v}"))
            })?,
        };
        Ok(Self { limit })
    }
}

fn integral(v: &Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    let f = v.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Successful tool output.
#[derive(Clone, Debug)]
pub enum ToolOutput {
    Sent {
        requested: ChatId,
        message: SentMessage,
    },
    Updates(Vec<Value>),
}

/// Tool result in host-facing form: text plus structured content.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolResult {
    pub text: String,
    pub structured: Value,
    pub is_error: bool,
}

impl ToolResult {
    pub fn from_output(out: &ToolOutput) -> Self {
        match out {
            ToolOutput::Sent { requested, message } => Self {
                text: render::sent_summary(requested, message),
                structured: json!({
                    "status": "ok",
                    "message_id": message.message_id.0,
                    "chat_id": message.chat_id,
                }),
                is_error: false,
            },
            ToolOutput::Updates(updates) => Self {
                text: render::updates_summary(updates),
                structured: json!({ "updates": updates }),
                is_error: false,
            },
        }
    }

    pub fn from_error(err: &Error) -> Self {
        let mut structured = json!({
            "status": "error",
            "kind": err.kind(),
            "message": err.to_string(),
        });
        if let Error::Provider { status, message } = err {
            structured["provider_status"] = json!(status);
            structured["message"] = json!(message);
        }
        Self {
            text: format!("Error: {err}"),
            structured,
            is_error: true,
        }
    }
}

/// Dispatches tool calls to the provider port.
#[derive(Clone)]
pub struct ToolRegistry {
    api: Arc<dyn BotApi>,
}

impl ToolRegistry {
    pub fn new(api: Arc<dyn BotApi>) -> Self {
        Self { api }
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        definitions()
    }

    pub async fn send_telegram_message(&self, args: &Value) -> Result<ToolOutput> {
        let args = SendMessageArgs::parse(args)?;
        let message = self.api.send_message(&args.chat_id, &args.text).await?;
        tracing::info!(
            chat_id = %args.chat_id,
            message_id = message.message_id.0,
            "message sent"
        );
        Ok(ToolOutput::Sent {
            requested: args.chat_id,
            message,
        })
    }

    pub async fn get_telegram_updates(&self, args: &Value) -> Result<ToolOutput> {
        let args = GetUpdatesArgs::parse(args)?;
        let updates = self.api.get_updates(args.limit).await?;
        tracing::info!(limit = args.limit, count = updates.len(), "updates fetched");
        Ok(ToolOutput::Updates(updates))
    }

    pub async fn call(&self, name: &str, args: &Value) -> Result<ToolOutput> {
        let res = match name {
            SEND_MESSAGE => self.send_telegram_message(args).await,
            GET_UPDATES => self.get_telegram_updates(args).await,
            other => return Err(Error::UnknownTool(other.to_string())),
        };
        if let Err(e) = &res {
            tracing::warn!(tool = name, kind = e.kind(), "tool call failed: {e}");
        }
        res
    }
}
