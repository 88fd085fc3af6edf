/// Core error type for the bridge.
///
/// Adapter crates map their specific errors into this type so the tool layer
/// can report failures consistently (validation vs transport vs provider).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("{0}")]
    Validation(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("telegram error {status}: {message}")]
    Provider { status: u16, message: String },
}

impl Error {
    /// Short, stable name for the error category (used in structured tool results).
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::Validation(_) => "validation",
            Error::UnknownTool(_) => "unknown_tool",
            Error::Transport(_) => "transport",
            Error::Provider { .. } => "provider",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
