//! # Alert Sink
//!
//! Outbound notification patterns for the signal services.
//!
//! - [`AlertSink`]: a destination for formatted alert text
//! - [`TelegramSink`] / [`LogSink`]: concrete destinations
//! - [`CircuitBreakerSink`]: fail-fast wrapper around a flaky sink
//! - [`AlertDispatcher`]: bounded queue plus a retrying delivery worker, so the
//!   producer never waits on the network

pub mod circuit_breaker;
pub mod dispatcher;
pub mod error;
pub mod log_sink;
pub mod telegram;
pub mod test_utils;

use async_trait::async_trait;
use std::fmt::Debug;

pub use circuit_breaker::{CircuitBreakerConfig, CircuitBreakerSink, CircuitBreakerStats, CircuitState};
pub use dispatcher::{AlertDispatcher, DispatchConfig, DispatchMetrics, DispatchStats};
pub use error::SinkError;
pub use log_sink::LogSink;
pub use telegram::{TelegramConfig, TelegramSink};

/// A destination for alert text
#[async_trait]
pub trait AlertSink: Send + Sync + Debug {
    /// Deliver a single alert
    async fn notify(&self, text: &str) -> Result<(), SinkError>;

    /// Name used in logs
    fn name(&self) -> &str;
}

#[async_trait]
impl<S: AlertSink + ?Sized> AlertSink for std::sync::Arc<S> {
    async fn notify(&self, text: &str) -> Result<(), SinkError> {
        (**self).notify(text).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{CollectorSink, FailingSink};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_collector_records_alerts() {
        let sink = CollectorSink::new();
        sink.notify("LONG BTC").await.unwrap();
        sink.notify("TP1 BTC").await.unwrap();

        assert_eq!(sink.alert_count(), 2);
        assert_eq!(sink.received(), vec!["LONG BTC".to_string(), "TP1 BTC".to_string()]);
    }

    #[tokio::test]
    async fn test_arc_forwards_to_inner() {
        let sink = Arc::new(FailingSink::default());
        let result = sink.notify("x").await;
        assert!(result.is_err());
        assert_eq!(AlertSink::name(&sink), "failing-sink");
    }
}
