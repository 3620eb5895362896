//! Configuration for the Hyperliquid mids feed

use crate::{AdapterError, Result};
use serde::{Deserialize, Serialize};
use service_config::defaults::adapters;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedConfig {
    /// Hyperliquid WebSocket URL
    pub websocket_url: String,

    pub connect_timeout_ms: u64,

    /// Reconnect if nothing arrives for this long
    pub message_timeout_ms: u64,

    /// Interval between application-level pings
    pub ping_interval_ms: u64,

    pub reconnect_delay_ms: u64,
    pub max_reconnect_delay_ms: u64,

    /// Per-symbol tick channel capacity
    pub channel_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            websocket_url: adapters::HYPERLIQUID_WS_URL.to_string(),
            connect_timeout_ms: adapters::CONNECTION_TIMEOUT_MS,
            message_timeout_ms: 60_000,
            ping_interval_ms: 30_000,
            reconnect_delay_ms: adapters::RECONNECTION_BACKOFF_BASE_MS,
            max_reconnect_delay_ms: adapters::RECONNECTION_BACKOFF_MAX_MS,
            channel_capacity: adapters::TICK_CHANNEL_CAPACITY,
        }
    }
}

impl FeedConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.websocket_url.starts_with("wss://") && !self.websocket_url.starts_with("ws://") {
            return Err(AdapterError::Configuration(format!(
                "Invalid WebSocket URL scheme: {}",
                self.websocket_url
            )));
        }
        if self.reconnect_delay_ms == 0 || self.max_reconnect_delay_ms < self.reconnect_delay_ms {
            return Err(AdapterError::Configuration(
                "reconnect delays must be positive and max >= base".to_string(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(AdapterError::Configuration(
                "channel_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn message_timeout(&self) -> Duration {
        Duration::from_millis(self.message_timeout_ms)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms.max(1))
    }

    /// Exponential reconnect backoff: `base * 2^attempt`, exponent capped at 6
    pub fn reconnect_backoff(&self, attempt: u32) -> Duration {
        let backoff_ms = self
            .reconnect_delay_ms
            .saturating_mul(2_u64.pow(attempt.min(6)));
        Duration::from_millis(backoff_ms.min(self.max_reconnect_delay_ms))
    }
}
