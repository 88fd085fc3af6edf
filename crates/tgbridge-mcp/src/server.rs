//! MCP request handling and the stdio serve loop.

use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use tgbridge_core::{
    errors::Error,
    tools::{ToolRegistry, ToolResult},
};

use crate::rpc::{
    RpcRequest, RpcResponse, INVALID_PARAMS, INVALID_REQUEST, METHOD_NOT_FOUND, PARSE_ERROR,
};

pub const SERVER_NAME: &str = "telegram-bot";
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

pub struct McpServer {
    registry: ToolRegistry,
}

impl McpServer {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    /// Handle one request. Notifications (no id) yield `None`.
    pub async fn handle(&self, req: RpcRequest) -> Option<RpcResponse> {
        let Some(id) = req.id else {
            tracing::debug!(method = %req.method, "notification");
            return None;
        };

        match req.method.as_str() {
            "initialize" => {
                let proto = req
                    .params
                    .as_ref()
                    .and_then(|p| p.get("protocolVersion"))
                    .and_then(|v| v.as_str())
                    .unwrap_or(DEFAULT_PROTOCOL_VERSION);

                Some(RpcResponse::ok(
                    id,
                    json!({
                      "protocolVersion": proto,
                      "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") },
                      "capabilities": { "tools": {} }
                    }),
                ))
            }

            "ping" => Some(RpcResponse::ok(id, json!({}))),

            "tools/list" => Some(RpcResponse::ok(
                id,
                json!({ "tools": self.registry.definitions() }),
            )),

            "tools/call" => {
                let Some(params) = req.params.as_ref() else {
                    return Some(RpcResponse::err(id, INVALID_PARAMS, "Missing params"));
                };

                let Some(name) = params
                    .get("name")
                    .and_then(|v| v.as_str())
                    .filter(|n| !n.is_empty())
                else {
                    return Some(RpcResponse::err(id, INVALID_PARAMS, "Missing tool name"));
                };
                let args = params.get("arguments").cloned().unwrap_or(Value::Null);

                let result = match self.registry.call(name, &args).await {
                    Ok(out) => ToolResult::from_output(&out),
                    Err(e @ Error::UnknownTool(_)) => {
                        return Some(RpcResponse::err(id, INVALID_PARAMS, &e.to_string()));
                    }
                    Err(e) => ToolResult::from_error(&e),
                };

                Some(RpcResponse::ok(id, tool_result_json(&result)))
            }

            other => {
                tracing::debug!(method = other, "method not found");
                Some(RpcResponse::err(id, METHOD_NOT_FOUND, "Method not found"))
            }
        }
    }

    /// Handle one raw input line.
    pub async fn handle_line(&self, line: &str) -> Option<RpcResponse> {
        let value: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("unparseable frame: {e}");
                return Some(RpcResponse::err(Value::Null, PARSE_ERROR, "Parse error"));
            }
        };

        let is_response = value.get("result").is_some() || value.get("error").is_some();
        let id = value.get("id").cloned().filter(|id| !id.is_null());

        match serde_json::from_value::<RpcRequest>(value) {
            Ok(req) => self.handle(req).await,
            Err(e) => match id {
                // Malformed request: the host is waiting on this id.
                Some(id) if !is_response => {
                    tracing::warn!("invalid request frame: {e}");
                    Some(RpcResponse::err(id, INVALID_REQUEST, "Invalid Request"))
                }
                _ => {
                    tracing::warn!("ignoring non-request frame: {e}");
                    None
                }
            },
        }
    }

    /// Serve until the reader hits EOF. One request is fully handled before the
    /// next line is read.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let Some(resp) = self.handle_line(&line).await else {
                continue;
            };

            let mut out = serde_json::to_vec(&resp)?;
            out.push(b'\n');
            writer.write_all(&out).await?;
            writer.flush().await?;
        }

        tracing::info!("stdin closed, shutting down");
        Ok(())
    }
}

fn tool_result_json(result: &ToolResult) -> Value {
    json!({
        "content": [ { "type": "text", "text": result.text } ],
        "structuredContent": result.structured,
        "isError": result.is_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use tgbridge_core::{
        domain::{ChatId, MessageId, SentMessage},
        ports::BotApi,
        Result,
    };

    #[derive(Default)]
    struct FakeBot {
        sends: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl BotApi for FakeBot {
        async fn send_message(&self, chat_id: &ChatId, text: &str) -> Result<SentMessage> {
            self.sends
                .lock()
                .unwrap()
                .push((chat_id.0.clone(), text.to_string()));
            Ok(SentMessage {
                message_id: MessageId(31),
                chat_id: Some(5),
                raw: json!({ "message_id": 31 }),
            })
        }

        async fn get_updates(&self, _limit: i64) -> Result<Vec<Value>> {
            Ok(vec![])
        }
    }

    fn server() -> (McpServer, Arc<FakeBot>) {
        let bot = Arc::new(FakeBot::default());
        (McpServer::new(ToolRegistry::new(bot.clone())), bot)
    }

    fn request(id: Option<Value>, method: &str, params: Option<Value>) -> RpcRequest {
        RpcRequest {
            jsonrpc: Some("2.0".to_string()),
            id,
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn initialize_echoes_protocol_version() {
        let (srv, _) = server();
        let resp = srv
            .handle(request(
                Some(json!(1)),
                "initialize",
                Some(json!({ "protocolVersion": "2025-03-26" })),
            ))
            .await
            .unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], json!("2025-03-26"));
        assert_eq!(result["serverInfo"]["name"], json!(SERVER_NAME));
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn tools_list_contains_both_tools() {
        let (srv, _) = server();
        let resp = srv
            .handle(request(Some(json!(2)), "tools/list", None))
            .await
            .unwrap();
        let tools = resp.result.unwrap()["tools"].as_array().unwrap().clone();
        let names: Vec<_> = tools
            .iter()
            .filter_map(|t| t.get("name").and_then(|n| n.as_str()))
            .collect();
        assert_eq!(names, vec!["send_telegram_message", "get_telegram_updates"]);
        assert!(tools.iter().all(|t| t.get("inputSchema").is_some()));
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let (srv, _) = server();
        assert!(srv
            .handle(request(None, "notifications/initialized", None))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let (srv, _) = server();
        let resp = srv
            .handle(request(Some(json!("a")), "resources/list", None))
            .await
            .unwrap();
        assert_eq!(resp.error.unwrap()["code"], json!(METHOD_NOT_FOUND));
    }

    #[tokio::test]
    async fn unknown_tool_is_invalid_params() {
        let (srv, _) = server();
        let resp = srv
            .handle(request(
                Some(json!(3)),
                "tools/call",
                Some(json!({ "name": "nope", "arguments": {} })),
            ))
            .await
            .unwrap();
        assert_eq!(resp.error.unwrap()["code"], json!(INVALID_PARAMS));
    }

    #[tokio::test]
    async fn validation_failure_is_error_result_without_send() {
        let (srv, bot) = server();
        let resp = srv
            .handle(request(
                Some(json!(4)),
                "tools/call",
                Some(json!({
                    "name": "send_telegram_message",
                    "arguments": { "chat_id": "", "text": "hi" }
                })),
            ))
            .await
            .unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], json!(true));
        assert_eq!(result["structuredContent"]["kind"], json!("validation"));
        assert_eq!(
            result["content"][0]["text"],
            json!("Error: chat_id and text are required")
        );
        assert!(bot.sends.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn send_result_carries_message_id() {
        let (srv, bot) = server();
        let resp = srv
            .handle(request(
                Some(json!(5)),
                "tools/call",
                Some(json!({
                    "name": "send_telegram_message",
                    "arguments": { "chat_id": "5", "text": "ping" }
                })),
            ))
            .await
            .unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], json!(false));
        assert_eq!(result["structuredContent"]["message_id"], json!(31));
        assert_eq!(bot.sends.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn garbage_line_is_parse_error() {
        let (srv, _) = server();
        let resp = srv.handle_line("{not json").await.unwrap();
        assert_eq!(resp.id, Value::Null);
        assert_eq!(resp.error.unwrap()["code"], json!(PARSE_ERROR));
    }

    #[tokio::test]
    async fn malformed_request_with_id_is_invalid_request() {
        let (srv, _) = server();
        for line in [
            r#"{"jsonrpc":"2.0","id":7,"method":42}"#,
            r#"{"jsonrpc":"2.0","id":7}"#,
        ] {
            let resp = srv.handle_line(line).await.unwrap();
            assert_eq!(resp.id, json!(7));
            assert_eq!(resp.error.unwrap()["code"], json!(INVALID_REQUEST));
        }
    }

    #[tokio::test]
    async fn response_frames_are_ignored() {
        let (srv, _) = server();
        assert!(srv
            .handle_line(r#"{"jsonrpc":"2.0","id":7,"result":{}}"#)
            .await
            .is_none());
        assert!(srv
            .handle_line(r#"{"jsonrpc":"2.0","id":8,"error":{"code":1,"message":"x"}}"#)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn missing_tool_name_is_reported() {
        let (srv, bot) = server();
        let resp = srv
            .handle(request(
                Some(json!(6)),
                "tools/call",
                Some(json!({ "arguments": { "chat_id": "1", "text": "x" } })),
            ))
            .await
            .unwrap();
        let err = resp.error.unwrap();
        assert_eq!(err["code"], json!(INVALID_PARAMS));
        assert_eq!(err["message"], json!("Missing tool name"));
        assert!(bot.sends.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn serve_writes_one_line_per_request() {
        let (srv, _) = server();
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n"
        );
        let mut out: Vec<u8> = Vec::new();
        srv.serve(input.as_bytes(), &mut out).await.unwrap();

        let lines: Vec<Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["id"], json!(1));
        assert_eq!(lines[1]["id"], json!(2));
    }
}
