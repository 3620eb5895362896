//! Retrying alert dispatcher
//!
//! Producers call [`AlertDispatcher::enqueue`], which never waits: a full queue
//! drops the alert with a warning. A single worker task drains the queue and
//! retries each alert with capped exponential backoff.

use crate::{AlertSink, SinkError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub queue_capacity: usize,
    pub max_attempts: u32,
    pub retry_base: Duration,
    pub retry_max: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            max_attempts: 5,
            retry_base: Duration::from_millis(500),
            retry_max: Duration::from_secs(30),
        }
    }
}

impl DispatchConfig {
    /// Backoff before retry number `retry` (1-based): `base * 2^(retry-1)`, capped
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.retry_base
            .saturating_mul(1u32 << exponent)
            .min(self.retry_max)
    }
}

/// Delivery counters
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    pub enqueued: AtomicU64,
    pub delivered: AtomicU64,
    pub retried: AtomicU64,
    /// Waits on an open circuit breaker
    pub deferred: AtomicU64,
    pub dropped: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchStats {
    pub enqueued: u64,
    pub delivered: u64,
    pub retried: u64,
    pub deferred: u64,
    pub dropped: u64,
}

impl DispatchMetrics {
    pub fn snapshot(&self) -> DispatchStats {
        DispatchStats {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            retried: self.retried.load(Ordering::Relaxed),
            deferred: self.deferred.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Cloneable handle for queueing alerts
#[derive(Debug, Clone)]
pub struct AlertDispatcher {
    tx: mpsc::Sender<String>,
    metrics: Arc<DispatchMetrics>,
}

impl AlertDispatcher {
    /// Start the delivery worker.
    ///
    /// The worker exits once every `AlertDispatcher` clone is dropped and the
    /// queue has drained.
    pub fn spawn<S>(sink: S, config: DispatchConfig) -> (Self, JoinHandle<()>)
    where
        S: AlertSink + 'static,
    {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let metrics = Arc::new(DispatchMetrics::default());

        let worker = tokio::spawn(run_worker(sink, config, rx, metrics.clone()));

        (Self { tx, metrics }, worker)
    }

    /// Queue an alert without waiting. Returns false if it was dropped.
    pub fn enqueue(&self, text: impl Into<String>) -> bool {
        match self.tx.try_send(text.into()) {
            Ok(()) => {
                self.metrics.enqueued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(mpsc::error::TrySendError::Full(text)) => {
                self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(alert = %text, "Alert queue full, dropping alert");
                false
            }
            Err(mpsc::error::TrySendError::Closed(text)) => {
                self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(alert = %text, "Alert worker stopped, dropping alert");
                false
            }
        }
    }

    pub fn metrics(&self) -> Arc<DispatchMetrics> {
        self.metrics.clone()
    }
}

async fn run_worker<S: AlertSink>(
    sink: S,
    config: DispatchConfig,
    mut rx: mpsc::Receiver<String>,
    metrics: Arc<DispatchMetrics>,
) {
    info!(sink = sink.name(), "Alert worker started");

    while let Some(text) = rx.recv().await {
        deliver(&sink, &config, &metrics, &text).await;
    }

    let stats = metrics.snapshot();
    info!(
        sink = sink.name(),
        delivered = stats.delivered,
        retried = stats.retried,
        deferred = stats.deferred,
        dropped = stats.dropped,
        "Alert worker stopped"
    );
}

/// Only calls that reach the destination count toward `max_attempts`. An open
/// circuit defers the alert until the breaker admits a call again.
async fn deliver<S: AlertSink>(sink: &S, config: &DispatchConfig, metrics: &DispatchMetrics, text: &str) {
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match sink.notify(text).await {
            Ok(()) => {
                metrics.delivered.fetch_add(1, Ordering::Relaxed);
                debug!(sink = sink.name(), attempts = attempt + 1, "Alert delivered");
                return;
            }
            Err(SinkError::CircuitOpen { retry_after_ms, .. }) => {
                let delay = Duration::from_millis(retry_after_ms).max(config.retry_base);
                metrics.deferred.fetch_add(1, Ordering::Relaxed);
                debug!(sink = sink.name(), "Circuit open, holding alert for {:?}", delay);
                tokio::time::sleep(delay).await;
            }
            Err(e) if !e.is_recoverable() => {
                metrics.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(sink = sink.name(), error = %e, "Alert rejected, not retrying");
                return;
            }
            Err(e) => {
                attempt += 1;
                if attempt >= max_attempts {
                    metrics.dropped.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        sink = sink.name(),
                        attempts = max_attempts,
                        error = %e,
                        "Alert delivery failed permanently, dropping alert"
                    );
                    return;
                }

                let delay = config.backoff(attempt);
                metrics.retried.fetch_add(1, Ordering::Relaxed);
                warn!(
                    sink = sink.name(),
                    attempt,
                    error = %e,
                    "Alert delivery failed, retrying in {:?}",
                    delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
