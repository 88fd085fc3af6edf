//! MCP server exposing the Telegram tools to a host over stdio.
//!
//! - JSON-RPC 2.0, one frame per line
//! - stdout carries protocol frames only; logs go to stderr

pub mod rpc;
pub mod server;

pub use server::McpServer;
