//! Per-symbol signal engine
//!
//! Ticks in, events out. Every stage runs synchronously inside `on_tick`:
//! candle aggregation, indicator updates, position tracking and the pattern
//! machine. While a position is open the pattern machine is parked; it resumes
//! on the candle that retires the position.

use crate::candles::{CandleAggregator, DropReason, IngestOutcome};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::events::EngineEvent;
use crate::indicators::{IndicatorEngine, IndicatorSnapshot};
use crate::metrics::EngineMetrics;
use crate::pattern::{PatternCounters, PatternMachine, PatternPhase};
use crate::position::Position;
use std::sync::Arc;
use tracing::{debug, info, warn};
use types::{Candle, Tick};

pub struct SignalEngine {
    symbol: String,
    config: EngineConfig,
    aggregator: CandleAggregator,
    exec: IndicatorEngine,
    bias: IndicatorEngine,
    machine: PatternMachine,
    position: Option<Position>,
    metrics: Arc<EngineMetrics>,
}

impl SignalEngine {
    /// Fails when the configuration is inconsistent
    pub fn new(symbol: impl Into<String>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            symbol: symbol.into(),
            aggregator: CandleAggregator::new(config.exec_timeframe_secs, config.bias_timeframe_secs),
            exec: IndicatorEngine::new_exec(&config),
            bias: IndicatorEngine::new_bias(&config),
            machine: PatternMachine::new(config.clone()),
            position: None,
            metrics: Arc::new(EngineMetrics::new()),
            config,
        })
    }

    pub fn on_tick(&mut self, tick: &Tick) -> Vec<EngineEvent> {
        self.metrics.increment_ticks();
        match self.aggregator.ingest(tick) {
            IngestOutcome::Updated => Vec::new(),
            IngestOutcome::Dropped(reason) => {
                self.metrics.record_drop(reason);
                match reason {
                    DropReason::OutOfOrder => debug!(
                        symbol = %self.symbol,
                        timestamp = %tick.timestamp,
                        "Dropping out-of-order tick"
                    ),
                    DropReason::NonPositivePrice => warn!(
                        symbol = %self.symbol,
                        price = %tick.price,
                        "Dropping tick with non-positive price"
                    ),
                }
                Vec::new()
            }
            IngestOutcome::Closed { exec, bias } => {
                // A bias candle closes on the same boundary as its last
                // execution candle and must be visible to that candle's step.
                if let Some(bias) = bias {
                    self.on_bias_close(&bias);
                }
                self.on_exec_close(&exec)
            }
        }
    }

    pub fn on_bias_close(&mut self, candle: &Candle) {
        let snapshot = self.bias.update(candle);
        self.metrics.increment_bias_candles();
        debug!(
            symbol = %self.symbol,
            close = %candle.close,
            trend = ?snapshot.trend(),
            "Bias candle closed"
        );
    }

    pub fn on_exec_close(&mut self, candle: &Candle) -> Vec<EngineEvent> {
        let exec = self.exec.update(candle);
        self.metrics.increment_exec_candles();

        let mut events = Vec::new();
        if let Some(position) = self.position.as_mut() {
            events.extend(position.on_candle(candle, &exec, &self.config));
            if !position.is_closed() {
                self.machine.note_close(candle.close);
                self.record(&events);
                return events;
            }
            self.position = None;
        }

        let bias = self.bias.snapshot();
        if let Some(signal) = self.machine.on_candle(candle, &exec, &bias) {
            self.position = Some(Position::from_signal(&signal));
            events.push(EngineEvent::Signal(signal));
        }

        self.record(&events);
        events
    }

    fn record(&self, events: &[EngineEvent]) {
        for event in events {
            self.metrics.record_event(event);
            match event {
                EngineEvent::Signal(signal) => info!(
                    symbol = %self.symbol,
                    direction = %signal.direction,
                    entry = %signal.entry,
                    stop = %signal.stop,
                    tp1 = %signal.tp1,
                    tp2 = %signal.tp2,
                    "Signal"
                ),
                other => info!(
                    symbol = %self.symbol,
                    event = other.kind(),
                    direction = %other.direction(),
                    terminal = other.is_terminal(),
                    "Position update"
                ),
            }
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn phase(&self) -> PatternPhase {
        self.machine.phase()
    }

    pub fn pattern_counters(&self) -> PatternCounters {
        self.machine.counters()
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn exec_snapshot(&self) -> IndicatorSnapshot {
        self.exec.snapshot()
    }

    pub fn bias_snapshot(&self) -> IndicatorSnapshot {
        self.bias.snapshot()
    }

    /// The execution candle still being built
    pub fn open_candle(&self) -> Option<&Candle> {
        self.aggregator.open_candle()
    }

    pub fn metrics(&self) -> Arc<EngineMetrics> {
        Arc::clone(&self.metrics)
    }
}
