//! Per-symbol engine counters

use crate::candles::DropReason;
use crate::events::{EngineEvent, TakeProfitLevel};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Thread-safe counters for one engine instance
#[derive(Debug)]
pub struct EngineMetrics {
    start_time: Instant,
    ticks_received: AtomicU64,
    ticks_out_of_order: AtomicU64,
    ticks_invalid: AtomicU64,
    exec_candles: AtomicU64,
    bias_candles: AtomicU64,
    signals: AtomicU64,
    tp1: AtomicU64,
    tp2: AtomicU64,
    stops: AtomicU64,
}

/// Point-in-time copy of `EngineMetrics`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    pub ticks_received: u64,
    pub ticks_out_of_order: u64,
    pub ticks_invalid: u64,
    pub exec_candles: u64,
    pub bias_candles: u64,
    pub signals: u64,
    pub tp1: u64,
    pub tp2: u64,
    pub stops: u64,
}

impl EngineStats {
    pub fn ticks_dropped(&self) -> u64 {
        self.ticks_out_of_order + self.ticks_invalid
    }
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            ticks_received: AtomicU64::new(0),
            ticks_out_of_order: AtomicU64::new(0),
            ticks_invalid: AtomicU64::new(0),
            exec_candles: AtomicU64::new(0),
            bias_candles: AtomicU64::new(0),
            signals: AtomicU64::new(0),
            tp1: AtomicU64::new(0),
            tp2: AtomicU64::new(0),
            stops: AtomicU64::new(0),
        }
    }

    pub fn increment_ticks(&self) {
        self.ticks_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_drop(&self, reason: DropReason) {
        let counter = match reason {
            DropReason::OutOfOrder => &self.ticks_out_of_order,
            DropReason::NonPositivePrice => &self.ticks_invalid,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_exec_candles(&self) {
        self.exec_candles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_bias_candles(&self) {
        self.bias_candles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_event(&self, event: &EngineEvent) {
        let counter = match event {
            EngineEvent::Signal(_) => &self.signals,
            EngineEvent::TakeProfit { level: TakeProfitLevel::Tp1, .. } => &self.tp1,
            EngineEvent::TakeProfit { level: TakeProfitLevel::Tp2, .. } => &self.tp2,
            EngineEvent::Stop { .. } => &self.stops,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> EngineStats {
        EngineStats {
            ticks_received: self.ticks_received.load(Ordering::Relaxed),
            ticks_out_of_order: self.ticks_out_of_order.load(Ordering::Relaxed),
            ticks_invalid: self.ticks_invalid.load(Ordering::Relaxed),
            exec_candles: self.exec_candles.load(Ordering::Relaxed),
            bias_candles: self.bias_candles.load(Ordering::Relaxed),
            signals: self.signals.load(Ordering::Relaxed),
            tp1: self.tp1.load(Ordering::Relaxed),
            tp2: self.tp2.load(Ordering::Relaxed),
            stops: self.stops.load(Ordering::Relaxed),
        }
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
