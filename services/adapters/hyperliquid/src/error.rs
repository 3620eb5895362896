//! Error types for the Hyperliquid adapter

use thiserror::Error;

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Connection failed to {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Connection timeout to {url} after {timeout_ms}ms")]
    ConnectionTimeout { url: String, timeout_ms: u64 },

    /// No frame arrived within the message timeout
    #[error("No message received for {idle_ms}ms")]
    Stale { idle_ms: u64 },

    #[error("Server closed the connection")]
    Closed,

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    #[error("Parse error for {symbol}: invalid price {value:?}")]
    ParseError { symbol: String, value: String },

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}
