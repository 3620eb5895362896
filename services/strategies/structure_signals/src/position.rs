//! Open position tracking against take-profit and stop levels
//!
//! Before TP1 the position holds its initial stop. After TP1 the stop may only
//! tighten: breakeven, a structure trail behind the newest swing confirmed
//! since TP1, and an ATR trail behind the best price since TP1. Each is
//! optional and the tightest one wins. Trails are recomputed at the end of a
//! candle and apply from the next one.

use crate::config::{EngineConfig, PriceTrigger};
use crate::events::{EngineEvent, StopReason, TakeProfitLevel};
use crate::indicators::IndicatorSnapshot;
use crate::pattern::Signal;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};
use types::{Candle, Direction};

/// A position opened by a signal. Exactly one STOP or TP2 retires it.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub direction: Direction,
    pub entry: Decimal,
    pub stop: Decimal,
    pub tp1: Decimal,
    pub tp2: Decimal,
    pub opened_at: DateTime<Utc>,
    atr_at_entry: Decimal,
    /// Reported if the current stop is hit
    stop_reason: StopReason,
    tp1_hit: bool,
    tp2_hit: bool,
    closed: bool,
    bars_held: u32,
    bars_since_tp1: u32,
    /// Open time of the TP1 candle
    tp1_at: Option<DateTime<Utc>>,
    /// Highest high (long) or lowest low (short) since TP1
    best_since_tp1: Option<Decimal>,
    /// Execution (fast, slow) EMAs at the previous candle
    prev_emas: Option<(Decimal, Decimal)>,
}

impl Position {
    pub fn from_signal(signal: &Signal) -> Self {
        Self {
            direction: signal.direction,
            entry: signal.entry,
            stop: signal.stop,
            tp1: signal.tp1,
            tp2: signal.tp2,
            opened_at: signal.time,
            atr_at_entry: signal.atr,
            stop_reason: StopReason::Stop,
            tp1_hit: false,
            tp2_hit: false,
            closed: false,
            bars_held: 0,
            bars_since_tp1: 0,
            tp1_at: None,
            best_since_tp1: None,
            prev_emas: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn tp1_hit(&self) -> bool {
        self.tp1_hit
    }

    pub fn tp2_hit(&self) -> bool {
        self.tp2_hit
    }

    pub fn bars_held(&self) -> u32 {
        self.bars_held
    }

    /// Evaluate one closed execution candle together with the execution
    /// indicators as of that candle. The stop is checked first, so a candle
    /// whose range spans both stop and target counts as a stop.
    pub fn on_candle(
        &mut self,
        candle: &Candle,
        exec: &IndicatorSnapshot,
        config: &EngineConfig,
    ) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        if self.closed {
            return events;
        }

        let prev_emas = self.prev_emas;
        self.prev_emas = exec.ema_fast.zip(exec.ema_slow);

        self.bars_held += 1;
        if self.tp1_hit {
            self.bars_since_tp1 += 1;
        }

        let (adverse, favourable) = self.trigger_prices(candle, config.price_trigger);
        let time = candle.close_time;

        if self.direction.opposite().reached(adverse, self.stop) {
            events.push(self.retire(self.stop_reason, self.stop, time));
            return events;
        }

        if !self.tp1_hit && self.direction.reached(favourable, self.tp1) {
            self.tp1_hit = true;
            self.bars_since_tp1 = 0;
            self.tp1_at = Some(candle.open_time);
            events.push(EngineEvent::TakeProfit {
                level: TakeProfitLevel::Tp1,
                direction: self.direction,
                price: self.tp1,
                entry: self.entry,
                time,
            });
            if config.breakeven_after_tp1 {
                let breakeven = self
                    .direction
                    .offset(self.entry, config.breakeven_buffer_atr * self.atr_at_entry);
                if self.tighten(breakeven, StopReason::Breakeven) {
                    info!(direction = %self.direction, stop = %self.stop, "Stop moved to breakeven");
                }
            }
        }

        if self.tp1_hit && self.direction.reached(favourable, self.tp2) {
            self.tp2_hit = true;
            self.closed = true;
            events.push(EngineEvent::TakeProfit {
                level: TakeProfitLevel::Tp2,
                direction: self.direction,
                price: self.tp2,
                entry: self.entry,
                time,
            });
            return events;
        }

        if !self.tp1_hit {
            return events;
        }

        // The TP1 candle itself never triggers the forced exits
        if config.ema_cross_exit_after_tp1 && self.bars_since_tp1 > 0 {
            if let (Some(prev), Some(now)) = (prev_emas, self.prev_emas) {
                if self.crossed_against(prev, now) {
                    events.push(self.retire(StopReason::EmaCross, candle.close, time));
                    return events;
                }
            }
        }

        if let Some(limit) = config.max_bars_after_tp1 {
            if self.bars_since_tp1 >= limit {
                events.push(self.retire(StopReason::Time, candle.close, time));
                return events;
            }
        }

        self.trail(candle, exec, config);
        events
    }

    /// Ratchet the stop using the structure and ATR trails
    fn trail(&mut self, candle: &Candle, exec: &IndicatorSnapshot, config: &EngineConfig) {
        let extreme = match self.direction {
            Direction::Long => candle.high,
            Direction::Short => candle.low,
        };
        let best = match (self.best_since_tp1, self.direction) {
            (Some(best), Direction::Long) => best.max(extreme),
            (Some(best), Direction::Short) => best.min(extreme),
            (None, _) => extreme,
        };
        self.best_since_tp1 = Some(best);

        let atr = exec.atr.unwrap_or(self.atr_at_entry);
        let back = self.direction.opposite();

        if config.trail_structure_after_tp1 {
            // Swing on the protective side: a low for longs, a high for shorts
            let swing = exec
                .swing_for(back)
                .filter(|pivot| self.tp1_at.is_some_and(|at| pivot.time >= at));
            if let Some(pivot) = swing {
                let level = back.offset(pivot.price, config.structure_pad_atr * atr);
                if self.tighten(level, StopReason::Trail) {
                    debug!(direction = %self.direction, stop = %self.stop, swing = %pivot.price, "Structure trail");
                }
            }
        }

        if config.trail_atr_after_tp1 {
            let level = back.offset(best, config.atr_trail_mult * atr);
            if self.tighten(level, StopReason::Trail) {
                debug!(direction = %self.direction, stop = %self.stop, best = %best, "ATR trail");
            }
        }
    }

    /// Move the stop to `level` if that is tighter. Returns true if it moved.
    fn tighten(&mut self, level: Decimal, reason: StopReason) -> bool {
        if self.direction.is_beyond(level, self.stop) {
            self.stop = level;
            self.stop_reason = reason;
            true
        } else {
            false
        }
    }

    /// Fast EMA crossed through the slow one against the position
    fn crossed_against(&self, prev: (Decimal, Decimal), now: (Decimal, Decimal)) -> bool {
        let (prev_fast, prev_slow) = prev;
        let (fast, slow) = now;
        match self.direction {
            Direction::Long => prev_fast >= prev_slow && fast < slow,
            Direction::Short => prev_fast <= prev_slow && fast > slow,
        }
    }

    /// (adverse, favourable) prices for this candle
    fn trigger_prices(&self, candle: &Candle, trigger: PriceTrigger) -> (Decimal, Decimal) {
        match (trigger, self.direction) {
            (PriceTrigger::Close, _) => (candle.close, candle.close),
            (PriceTrigger::Wick, Direction::Long) => (candle.low, candle.high),
            (PriceTrigger::Wick, Direction::Short) => (candle.high, candle.low),
        }
    }

    fn retire(&mut self, reason: StopReason, price: Decimal, time: DateTime<Utc>) -> EngineEvent {
        self.closed = true;
        EngineEvent::Stop {
            reason,
            direction: self.direction,
            price,
            entry: self.entry,
            time,
        }
    }
}
