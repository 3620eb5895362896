use crate::{AlertSink, SinkError};
use async_trait::async_trait;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Mutex,
};

/// A sink that collects alerts in memory for testing
#[derive(Debug, Default)]
pub struct CollectorSink {
    alerts: Mutex<Vec<String>>,
    fail_remaining: AtomicU64,
    attempts: AtomicU64,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` notifications with a recoverable error
    pub fn fail_next(&self, n: u64) {
        self.fail_remaining.store(n, Ordering::Relaxed);
    }

    pub fn received(&self) -> Vec<String> {
        self.alerts.lock().map(|a| a.clone()).unwrap_or_default()
    }

    pub fn alert_count(&self) -> usize {
        self.alerts.lock().map(|a| a.len()).unwrap_or(0)
    }

    /// Total notify calls, including failed ones
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AlertSink for CollectorSink {
    async fn notify(&self, text: &str) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);

        let failing = self
            .fail_remaining
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(SinkError::send_failed("Simulated failure"));
        }

        if let Ok(mut alerts) = self.alerts.lock() {
            alerts.push(text.to_string());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "test-collector"
    }
}

/// A sink that always fails
#[derive(Debug)]
pub struct FailingSink {
    error: SinkError,
    attempts: AtomicU64,
}

impl FailingSink {
    pub fn new(error: SinkError) -> Self {
        Self {
            error,
            attempts: AtomicU64::new(0),
        }
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
}

impl Default for FailingSink {
    fn default() -> Self {
        Self::new(SinkError::send_failed("Simulated failure"))
    }
}

#[async_trait]
impl AlertSink for FailingSink {
    async fn notify(&self, _text: &str) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        Err(self.error.clone())
    }

    fn name(&self) -> &str {
        "failing-sink"
    }
}
