//! Break of structure -> retest -> acceptance state machine
//!
//! One machine per symbol, stepped once per execution candle close with the
//! fresh execution and bias indicator snapshots. The searching states
//! (`Idle`, `BiasOk`, `TrendConfirmed`) cascade within a single candle, so a
//! candle that aligns both trends can also be the break candle. The retest is
//! only looked for on later candles.

use crate::config::EngineConfig;
use crate::indicators::IndicatorSnapshot;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use tracing::{debug, info};
use types::{Candle, Direction};

/// A recorded break of structure waiting for its retest
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Setup {
    pub direction: Direction,
    /// Swing level that was broken
    pub break_level: Decimal,
    pub zone_low: Decimal,
    pub zone_high: Decimal,
    /// Opposite swing at break time, used to place the stop
    pub anchor: Option<Decimal>,
    pub atr_at_break: Decimal,
    pub break_time: DateTime<Utc>,
}

impl Setup {
    /// Zone edge a close must cross to invalidate the breakout
    pub fn far_edge(&self) -> Decimal {
        match self.direction {
            Direction::Long => self.zone_low,
            Direction::Short => self.zone_high,
        }
    }

    fn is_invalidated_by(&self, close: Decimal) -> bool {
        self.direction.opposite().is_beyond(close, self.far_edge())
    }
}

/// Entry signal produced when a setup is accepted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    pub direction: Direction,
    pub entry: Decimal,
    pub stop: Decimal,
    pub tp1: Decimal,
    pub tp2: Decimal,
    pub break_level: Decimal,
    /// Execution ATR at the acceptance candle
    pub atr: Decimal,
    /// Close time of the acceptance candle
    pub time: DateTime<Utc>,
}

impl Signal {
    /// Distance from entry to stop
    pub fn risk(&self) -> Decimal {
        (self.entry - self.stop).abs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SignalState {
    Idle,
    BiasOk(Direction),
    TrendConfirmed(Direction),
    RetestWait(Setup),
    AcceptanceWait { setup: Setup, count: u32 },
}

/// Outcome of stepping a waiting state
enum Step {
    Next(SignalState),
    /// Acceptance completed, with or without a usable signal
    Resolved(Option<Signal>),
}

/// Observable view of the machine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternPhase {
    Idle,
    BiasOk(Direction),
    TrendConfirmed(Direction),
    RetestWait(Direction),
    AcceptanceWait { direction: Direction, count: u32 },
}

impl fmt::Display for PatternPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternPhase::Idle => write!(f, "IDLE"),
            PatternPhase::BiasOk(d) => write!(f, "BIAS_OK({})", d),
            PatternPhase::TrendConfirmed(d) => write!(f, "TREND_CONFIRMED({})", d),
            PatternPhase::RetestWait(d) => write!(f, "RETEST_WAIT({})", d),
            PatternPhase::AcceptanceWait { direction, count } => {
                write!(f, "ACCEPTANCE_WAIT({}, {})", direction, count)
            }
        }
    }
}

impl From<&SignalState> for PatternPhase {
    fn from(state: &SignalState) -> Self {
        match state {
            SignalState::Idle => PatternPhase::Idle,
            SignalState::BiasOk(d) => PatternPhase::BiasOk(*d),
            SignalState::TrendConfirmed(d) => PatternPhase::TrendConfirmed(*d),
            SignalState::RetestWait(setup) => PatternPhase::RetestWait(setup.direction),
            SignalState::AcceptanceWait { setup, count } => PatternPhase::AcceptanceWait {
                direction: setup.direction,
                count: *count,
            },
        }
    }
}

/// Running totals of setup outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatternCounters {
    pub breaks: u64,
    pub retests: u64,
    pub invalidations: u64,
    pub cancellations: u64,
    pub signals: u64,
}

#[derive(Debug, Clone)]
pub struct PatternMachine {
    config: EngineConfig,
    state: SignalState,
    prev_close: Option<Decimal>,
    counters: PatternCounters,
}

impl PatternMachine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            state: SignalState::Idle,
            prev_close: None,
            counters: PatternCounters::default(),
        }
    }

    pub fn phase(&self) -> PatternPhase {
        PatternPhase::from(&self.state)
    }

    /// The pending setup, if a break has been recorded
    pub fn setup(&self) -> Option<&Setup> {
        match &self.state {
            SignalState::RetestWait(setup) | SignalState::AcceptanceWait { setup, .. } => {
                Some(setup)
            }
            _ => None,
        }
    }

    pub fn counters(&self) -> PatternCounters {
        self.counters
    }

    /// Record a close without stepping the machine, used while a position
    /// is open so the next break check still sees the true previous close.
    pub fn note_close(&mut self, close: Decimal) {
        self.prev_close = Some(close);
    }

    /// Step the machine with a closed execution candle
    pub fn on_candle(
        &mut self,
        candle: &Candle,
        exec: &IndicatorSnapshot,
        bias: &IndicatorSnapshot,
    ) -> Option<Signal> {
        let prev_close = self.prev_close.replace(candle.close);
        let before = self.phase();

        let step = match self.state {
            SignalState::RetestWait(setup) => {
                Step::Next(self.on_retest_wait(setup, candle, exec, bias))
            }
            SignalState::AcceptanceWait { setup, count } => {
                self.on_acceptance_wait(setup, count, candle, exec, bias)
            }
            searching => Step::Next(searching),
        };

        let signal = match step {
            Step::Next(state @ (SignalState::RetestWait(_) | SignalState::AcceptanceWait { .. })) => {
                self.state = state;
                None
            }
            Step::Next(_) => {
                self.state = self.search(candle, prev_close, exec, bias);
                None
            }
            Step::Resolved(signal) => {
                self.state = SignalState::Idle;
                signal
            }
        };

        let after = self.phase();
        if before != after {
            debug!(from = %before, to = %after, close = %candle.close, "Pattern transition");
        }
        signal
    }

    /// Idle -> BiasOk -> TrendConfirmed -> break check. The searching states
    /// depend only on the current trend readings, so they are re-derived on
    /// every candle; a bias or trend flip drops back automatically.
    fn search(
        &mut self,
        candle: &Candle,
        prev_close: Option<Decimal>,
        exec: &IndicatorSnapshot,
        bias: &IndicatorSnapshot,
    ) -> SignalState {
        let Some(direction) = bias.trend() else {
            return SignalState::Idle;
        };
        if exec.trend() != Some(direction) {
            return SignalState::BiasOk(direction);
        }

        match self.detect_break(direction, candle, prev_close, exec) {
            Some(setup) => {
                self.counters.breaks += 1;
                info!(
                    direction = %direction,
                    break_level = %setup.break_level,
                    zone_low = %setup.zone_low,
                    zone_high = %setup.zone_high,
                    close = %candle.close,
                    "Break of structure"
                );
                SignalState::RetestWait(setup)
            }
            None => SignalState::TrendConfirmed(direction),
        }
    }

    /// A break is a close strictly beyond the last swing in `direction` by
    /// a candle whose predecessor closed at or behind it.
    fn detect_break(
        &self,
        direction: Direction,
        candle: &Candle,
        prev_close: Option<Decimal>,
        exec: &IndicatorSnapshot,
    ) -> Option<Setup> {
        let swing = exec.swing_for(direction)?;
        let atr = exec.atr?;
        let prev_close = prev_close?;

        let crossed = direction.is_beyond(candle.close, swing.price)
            && !direction.is_beyond(prev_close, swing.price);
        if !crossed {
            return None;
        }

        let buffer = self.config.retest_buffer_atr * atr;
        Some(Setup {
            direction,
            break_level: swing.price,
            zone_low: swing.price - buffer,
            zone_high: swing.price + buffer,
            anchor: exec.swing_for(direction.opposite()).map(|p| p.price),
            atr_at_break: atr,
            break_time: candle.close_time,
        })
    }

    fn trend_flipped(
        &self,
        direction: Direction,
        exec: &IndicatorSnapshot,
        bias: &IndicatorSnapshot,
    ) -> bool {
        self.config.cancel_on_trend_flip
            && (bias.trend() != Some(direction) || exec.trend() != Some(direction))
    }

    fn on_retest_wait(
        &mut self,
        setup: Setup,
        candle: &Candle,
        exec: &IndicatorSnapshot,
        bias: &IndicatorSnapshot,
    ) -> SignalState {
        if self.trend_flipped(setup.direction, exec, bias) {
            self.counters.cancellations += 1;
            debug!(direction = %setup.direction, "Setup cancelled on trend flip");
            return SignalState::Idle;
        }
        if setup.is_invalidated_by(candle.close) {
            self.counters.invalidations += 1;
            info!(
                direction = %setup.direction,
                break_level = %setup.break_level,
                close = %candle.close,
                "Breakout invalidated before retest"
            );
            return SignalState::Idle;
        }
        if candle.intersects(setup.zone_low, setup.zone_high) {
            self.counters.retests += 1;
            return SignalState::AcceptanceWait { setup, count: 0 };
        }
        SignalState::RetestWait(setup)
    }

    fn on_acceptance_wait(
        &mut self,
        setup: Setup,
        count: u32,
        candle: &Candle,
        exec: &IndicatorSnapshot,
        bias: &IndicatorSnapshot,
    ) -> Step {
        if self.trend_flipped(setup.direction, exec, bias) {
            self.counters.cancellations += 1;
            debug!(direction = %setup.direction, "Setup cancelled on trend flip");
            return Step::Next(SignalState::Idle);
        }
        if !setup.direction.is_beyond(candle.close, setup.break_level) {
            return Step::Next(SignalState::RetestWait(setup));
        }

        let count = count + 1;
        if count < self.config.accept_bars {
            return Step::Next(SignalState::AcceptanceWait { setup, count });
        }

        match self.activate(&setup, candle, exec) {
            Some(signal) => {
                self.counters.signals += 1;
                Step::Resolved(Some(signal))
            }
            None => {
                self.counters.invalidations += 1;
                debug!(
                    direction = %setup.direction,
                    anchor = ?setup.anchor,
                    "Setup accepted without a usable stop, discarding"
                );
                Step::Resolved(None)
            }
        }
    }

    fn activate(&self, setup: &Setup, candle: &Candle, exec: &IndicatorSnapshot) -> Option<Signal> {
        let direction = setup.direction;
        let anchor = setup.anchor?;
        let atr = exec.atr.unwrap_or(setup.atr_at_break);

        let entry = candle.close;
        let stop = direction.opposite().offset(anchor, self.config.stop_pad_atr * atr);
        let risk = direction.sign() * (entry - stop);
        if risk <= Decimal::ZERO {
            return None;
        }

        Some(Signal {
            direction,
            entry,
            stop,
            tp1: direction.offset(entry, self.config.tp1_r_multiple * risk),
            tp2: direction.offset(entry, self.config.tp2_r_multiple * risk),
            break_level: setup.break_level,
            atr,
            time: candle.close_time,
        })
    }
}
