//! Events the engine emits for alerting

use crate::pattern::Signal;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use types::Direction;

/// Decimal places used in alert text
const ALERT_DP: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TakeProfitLevel {
    Tp1,
    Tp2,
}

impl fmt::Display for TakeProfitLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TakeProfitLevel::Tp1 => write!(f, "TP1"),
            TakeProfitLevel::Tp2 => write!(f, "TP2"),
        }
    }
}

/// Why a position was stopped out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Initial stop reached
    Stop,
    /// Stop reached after it was moved to breakeven
    Breakeven,
    /// Trailing stop reached after TP1
    Trail,
    /// Bar limit after TP1 elapsed
    Time,
    /// Execution EMAs crossed against the position after TP1
    EmaCross,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Stop => write!(f, "stop"),
            StopReason::Breakeven => write!(f, "breakeven"),
            StopReason::Trail => write!(f, "trail"),
            StopReason::Time => write!(f, "time"),
            StopReason::EmaCross => write!(f, "ema cross"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Setup accepted, position opened
    Signal(Signal),
    TakeProfit {
        level: TakeProfitLevel,
        direction: Direction,
        /// Target price that was reached
        price: Decimal,
        entry: Decimal,
        time: DateTime<Utc>,
    },
    Stop {
        reason: StopReason,
        direction: Direction,
        /// Stop level, or the close for a time or EMA cross exit
        price: Decimal,
        entry: Decimal,
        time: DateTime<Utc>,
    },
}

impl EngineEvent {
    /// Short tag for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            EngineEvent::Signal(s) => match s.direction {
                Direction::Long => "LONG",
                Direction::Short => "SHORT",
            },
            EngineEvent::TakeProfit { level: TakeProfitLevel::Tp1, .. } => "TP1",
            EngineEvent::TakeProfit { level: TakeProfitLevel::Tp2, .. } => "TP2",
            EngineEvent::Stop { .. } => "STOP",
        }
    }

    pub fn direction(&self) -> Direction {
        match self {
            EngineEvent::Signal(s) => s.direction,
            EngineEvent::TakeProfit { direction, .. } | EngineEvent::Stop { direction, .. } => {
                *direction
            }
        }
    }

    /// Does this event close the position?
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EngineEvent::TakeProfit { level: TakeProfitLevel::Tp2, .. } | EngineEvent::Stop { .. }
        )
    }

    /// Human-readable notification text
    pub fn alert_text(&self, symbol: &str) -> String {
        match self {
            EngineEvent::Signal(s) => format!(
                "{} {} (BOS+Retest+Accept)\nentry={} stop={}\nTP1={} TP2={}\nbreak={} atr={}",
                symbol,
                s.direction,
                px(s.entry),
                px(s.stop),
                px(s.tp1),
                px(s.tp2),
                px(s.break_level),
                px(s.atr),
            ),
            EngineEvent::TakeProfit {
                level,
                direction,
                price,
                entry,
                ..
            } => format!(
                "{} {} {} hit {} (entry {})",
                symbol,
                direction,
                level,
                px(*price),
                px(*entry)
            ),
            EngineEvent::Stop {
                reason: StopReason::Time,
                direction,
                price,
                entry,
                ..
            } => format!(
                "{} {} STOP time exit at {} (entry {})",
                symbol,
                direction,
                px(*price),
                px(*entry)
            ),
            EngineEvent::Stop {
                reason: StopReason::EmaCross,
                direction,
                price,
                entry,
                ..
            } => format!(
                "{} {} STOP EMA cross exit at {} (entry {})",
                symbol,
                direction,
                px(*price),
                px(*entry)
            ),
            EngineEvent::Stop {
                reason,
                direction,
                price,
                entry,
                ..
            } => format!(
                "{} {} STOP {} hit {} (entry {})",
                symbol,
                direction,
                reason,
                px(*price),
                px(*entry)
            ),
        }
    }
}

fn px(value: Decimal) -> Decimal {
    value.round_dp(ALERT_DP).normalize()
}
