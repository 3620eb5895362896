//! One task per symbol: feed ticks through the engine and queue alerts

use crate::engine::SignalEngine;
use crate::metrics::EngineStats;
use alert_sink::AlertDispatcher;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, warn};
use types::Tick;

pub struct SymbolRunner {
    engine: SignalEngine,
    ticks: mpsc::Receiver<Tick>,
    alerts: AlertDispatcher,
    heartbeat: Duration,
}

impl SymbolRunner {
    pub fn new(
        engine: SignalEngine,
        ticks: mpsc::Receiver<Tick>,
        alerts: AlertDispatcher,
        heartbeat: Duration,
    ) -> Self {
        Self {
            engine,
            ticks,
            alerts,
            heartbeat,
        }
    }

    /// Run until shutdown is signalled or the feed closes. Returns the final
    /// engine counters.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> EngineStats {
        let symbol = self.engine.symbol().to_string();
        info!(symbol = %symbol, phase = %self.engine.phase(), "Symbol runner started");

        let mut heartbeat = time::interval_at(Instant::now() + self.heartbeat, self.heartbeat);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !*shutdown.borrow() {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                tick = self.ticks.recv() => match tick {
                    Some(tick) => self.handle_tick(&tick),
                    None => {
                        warn!(symbol = %symbol, "Tick feed closed, stopping runner");
                        break;
                    }
                },
                _ = heartbeat.tick() => self.log_heartbeat(),
            }
        }

        let stats = self.engine.metrics().snapshot();
        info!(
            symbol = %symbol,
            ticks = stats.ticks_received,
            dropped = stats.ticks_dropped(),
            exec_candles = stats.exec_candles,
            signals = stats.signals,
            "Symbol runner stopped"
        );
        stats
    }

    fn handle_tick(&mut self, tick: &Tick) {
        for event in self.engine.on_tick(tick) {
            let text = event.alert_text(self.engine.symbol());
            if !self.alerts.enqueue(text) {
                warn!(symbol = %self.engine.symbol(), event = event.kind(), "Alert not queued");
            }
        }
    }

    fn log_heartbeat(&self) {
        let metrics = self.engine.metrics();
        let stats = metrics.snapshot();
        let counters = self.engine.pattern_counters();
        let exec = self.engine.exec_snapshot();
        info!(
            symbol = %self.engine.symbol(),
            phase = %self.engine.phase(),
            in_position = self.engine.position().is_some(),
            ticks = stats.ticks_received,
            exec_candles = stats.exec_candles,
            bias_candles = stats.bias_candles,
            breaks = counters.breaks,
            signals = stats.signals,
            atr = ?exec.atr,
            uptime_secs = metrics.uptime().as_secs(),
            "Heartbeat"
        );
    }
}
