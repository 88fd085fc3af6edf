//! Human-readable text for tool results.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::{ChatId, SentMessage};

pub fn sent_summary(requested: &ChatId, sent: &SentMessage) -> String {
    let chat = sent
        .chat_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| requested.0.clone());
    format!(
        "Message sent successfully!\nChat ID: {chat}\nMessage ID: {}",
        sent.message_id.0
    )
}

/// Render updates in provider order. Updates without a `message` are skipped.
pub fn updates_summary(updates: &[Value]) -> String {
    if updates.is_empty() {
        return "No recent messages".to_string();
    }

    let mut out = String::from("Recent messages:\n\n");
    for msg in updates.iter().filter_map(|u| u.get("message")) {
        out.push_str(&format!("From: {}\n", sender(msg)));
        let chat_id = msg
            .get("chat")
            .and_then(|c| c.get("id"))
            .map(|v| v.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        out.push_str(&format!("Chat ID: {chat_id}\n"));
        let text = msg
            .get("text")
            .or_else(|| msg.get("caption"))
            .and_then(|v| v.as_str())
            .unwrap_or("(no text)");
        out.push_str(&format!("Text: {text}\n"));
        let date = msg
            .get("date")
            .and_then(|v| v.as_i64())
            .map(format_date)
            .unwrap_or_else(|| "unknown".to_string());
        out.push_str(&format!("Date: {date}\n\n"));
    }
    out
}

fn sender(msg: &Value) -> String {
    let Some(from) = msg.get("from") else {
        return "unknown".to_string();
    };
    let first = from
        .get("first_name")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");
    match from.get("username").and_then(|v| v.as_str()) {
        Some(u) => format!("{first} (@{u})"),
        None => first.to_string(),
    }
}

fn format_date(unix: i64) -> String {
    DateTime::<Utc>::from_timestamp(unix, 0)
        .map(|d| d.to_rfc3339())
        .unwrap_or_else(|| unix.to_string())
}
