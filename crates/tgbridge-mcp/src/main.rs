use std::sync::Arc;

use anyhow::Context;
use tokio::io::BufReader;

use tgbridge_core::{config::Config, tools::ToolRegistry};
use tgbridge_mcp::McpServer;
use tgbridge_telegram::TelegramClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tgbridge_core::logging::init("tgbridge-mcp")?;

    let cfg = Config::load().context("failed to load configuration")?;
    let client = TelegramClient::from_config(&cfg).context("failed to build telegram client")?;
    let server = McpServer::new(ToolRegistry::new(Arc::new(client)));

    tracing::info!(api = %cfg.telegram_api_base_url, "telegram MCP server running on stdio");

    server
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await
}
