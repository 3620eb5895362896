//! Fan-out of parsed mids to per-symbol channels

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use types::Tick;

/// Feed counters
#[derive(Debug, Default)]
pub struct FeedMetrics {
    pub frames_received: AtomicU64,
    pub ticks_routed: AtomicU64,
    /// Receiver lagging: channel full
    pub ticks_dropped: AtomicU64,
    pub parse_errors: AtomicU64,
    pub reconnects: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub frames_received: u64,
    pub ticks_routed: u64,
    pub ticks_dropped: u64,
    pub parse_errors: u64,
    pub reconnects: u64,
}

impl FeedMetrics {
    pub fn snapshot(&self) -> FeedStats {
        FeedStats {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            ticks_routed: self.ticks_routed.load(Ordering::Relaxed),
            ticks_dropped: self.ticks_dropped.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
        }
    }
}

/// Routes `(symbol, price)` pairs to the subscribed symbol channels.
///
/// Routing never waits: a full channel drops the tick.
#[derive(Debug)]
pub struct TickRouter {
    routes: HashMap<String, mpsc::Sender<Tick>>,
    metrics: Arc<FeedMetrics>,
}

impl TickRouter {
    pub fn new(metrics: Arc<FeedMetrics>) -> Self {
        Self {
            routes: HashMap::new(),
            metrics,
        }
    }

    /// Register a symbol and return the receiving end of its tick channel
    pub fn subscribe(&mut self, symbol: impl Into<String>, capacity: usize) -> mpsc::Receiver<Tick> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        self.routes.insert(symbol.into(), tx);
        rx
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Deliver one price. Returns true if the tick was queued.
    pub fn route(&mut self, symbol: &str, price: Decimal, timestamp: DateTime<Utc>) -> bool {
        let Some(tx) = self.routes.get(symbol) else {
            return false;
        };

        match tx.try_send(Tick::new(price, timestamp)) {
            Ok(()) => {
                self.metrics.ticks_routed.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.metrics.ticks_dropped.fetch_add(1, Ordering::Relaxed);
                warn!(symbol, "Tick channel full, dropping tick");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(symbol, "Tick receiver closed, removing route");
                self.routes.remove(symbol);
                false
            }
        }
    }
}
