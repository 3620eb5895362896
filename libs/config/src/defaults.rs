//! Service defaults
//!
//! Default values and environment variable names shared by the structure
//! signals services.

/// Environment variable names
pub mod env {
    /// Path of the service TOML file
    pub const CONFIG_PATH: &str = "STRUCTURE_SIGNALS_CONFIG_PATH";

    /// Prefix for `STRUCTURE_SIGNALS__SECTION__KEY` overrides
    pub const OVERRIDE_PREFIX: &str = "STRUCTURE_SIGNALS";

    /// Separator between prefix, sections and keys
    pub const OVERRIDE_SEPARATOR: &str = "__";

    pub const TELEGRAM_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
    pub const TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";
}

/// Default location of the service TOML file
pub const DEFAULT_CONFIG_PATH: &str = "configs/structure_signals.toml";

/// Feed adapter defaults
pub mod adapters {
    pub const HYPERLIQUID_WS_URL: &str = "wss://api.hyperliquid.xyz/ws";

    /// Connection timeout (milliseconds)
    pub const CONNECTION_TIMEOUT_MS: u64 = 10_000;

    /// Reconnection backoff base (milliseconds)
    pub const RECONNECTION_BACKOFF_BASE_MS: u64 = 1_000;

    /// Reconnection backoff ceiling (milliseconds)
    pub const RECONNECTION_BACKOFF_MAX_MS: u64 = 60_000;

    /// Per-symbol tick channel capacity
    pub const TICK_CHANNEL_CAPACITY: usize = 1_024;
}

/// Alert delivery defaults
pub mod alerts {
    /// Pending alerts before new ones are dropped
    pub const QUEUE_CAPACITY: usize = 256;

    /// Delivery attempts per alert
    pub const MAX_ATTEMPTS: u32 = 5;

    pub const RETRY_BASE_MS: u64 = 500;
    pub const RETRY_MAX_MS: u64 = 30_000;

    /// HTTP request timeout for Telegram (milliseconds)
    pub const REQUEST_TIMEOUT_MS: u64 = 10_000;
}

/// Strategy service defaults
pub mod strategies {
    /// Heartbeat log interval (seconds)
    pub const HEARTBEAT_INTERVAL_SECS: u64 = 3_600;

    pub const DEFAULT_LOG_LEVEL: &str = "info";
}
