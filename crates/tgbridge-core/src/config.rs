use std::{env, fs, path::Path, time::Duration};

use crate::{domain::BotToken, errors::Error, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

/// Typed configuration, read once at process start.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: BotToken,
    /// Bot API root without trailing slash (self-hosted servers override it).
    pub telegram_api_base_url: String,
    /// `None` keeps the HTTP client's default.
    pub http_timeout: Option<Duration>,
}

impl Config {
    /// Load from the process environment, after applying `./.env` if present.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .and_then(BotToken::new)
            .ok_or_else(|| {
                Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;

        let telegram_api_base_url = lookup("TELEGRAM_API_BASE_URL")
            .and_then(non_empty)
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let http_timeout = match lookup("TELEGRAM_HTTP_TIMEOUT_SECS").and_then(non_empty) {
            None => None,
            Some(raw) => {
                let secs = raw
                    .trim()
                    .parse::<u64>()
                    .ok()
                    .filter(|s| *s > 0)
                    .ok_or_else(|| {
                        Error::Config(format!(
                            "TELEGRAM_HTTP_TIMEOUT_SECS must be a positive integer: {raw}"
                        ))
                    })?;
                Some(Duration::from_secs(secs))
            }
        };

        Ok(Self {
            telegram_bot_token,
            telegram_api_base_url,
            http_timeout,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim().trim_start_matches("export ").trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, unquote(v.trim()));
    }
}

fn unquote(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        &val[1..val.len() - 1]
    } else {
        val
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
