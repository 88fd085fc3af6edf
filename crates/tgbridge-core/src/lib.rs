//! Core of the Telegram MCP bridge.
//!
//! This crate is transport-agnostic. The Telegram HTTP client lives behind the
//! `BotApi` port and the stdio protocol server lives in its own crate.

pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod ports;
pub mod render;
pub mod tools;

pub use errors::{Error, Result};
