//! Confirmed swing points

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PivotKind {
    High,
    Low,
}

impl fmt::Display for PivotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PivotKind::High => write!(f, "HIGH"),
            PivotKind::Low => write!(f, "LOW"),
        }
    }
}

/// A swing high or low. `time` is the open time of the pivot candle, not the
/// time it was confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pivot {
    pub price: Decimal,
    pub time: DateTime<Utc>,
    pub kind: PivotKind,
}

impl Pivot {
    pub fn high(price: Decimal, time: DateTime<Utc>) -> Self {
        Self {
            price,
            time,
            kind: PivotKind::High,
        }
    }

    pub fn low(price: Decimal, time: DateTime<Utc>) -> Self {
        Self {
            price,
            time,
            kind: PivotKind::Low,
        }
    }
}
