//! Ticks, candles and timeframes

use crate::errors::CandleError;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single mid-price observation from the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    pub price: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Tick {
    pub fn new(price: Decimal, timestamp: DateTime<Utc>) -> Self {
        Self { price, timestamp }
    }
}

/// Which candle series a candle belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    /// Execution timeframe, built directly from ticks
    Exec,
    /// Bias timeframe, re-aggregated from closed execution candles
    Bias,
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeframe::Exec => write!(f, "EXEC"),
            Timeframe::Bias => write!(f, "BIAS"),
        }
    }
}

/// OHLC candle over the half-open window `[open_time, close_time)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub open_time: DateTime<Utc>,
    pub close_time: DateTime<Utc>,
    pub timeframe: Timeframe,
}

impl Candle {
    /// Build a candle, checking the window and OHLC invariants
    pub fn new(
        timeframe: Timeframe,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        open_time: DateTime<Utc>,
        close_time: DateTime<Utc>,
    ) -> Result<Self, CandleError> {
        if open_time >= close_time {
            return Err(CandleError::InvalidWindow {
                open_time: open_time.to_rfc3339(),
                close_time: close_time.to_rfc3339(),
            });
        }

        if low > open.min(close) || high < open.max(close) || low > high {
            return Err(CandleError::InconsistentOhlc {
                open: open.to_string(),
                high: high.to_string(),
                low: low.to_string(),
                close: close.to_string(),
            });
        }

        Ok(Self {
            open,
            high,
            low,
            close,
            open_time,
            close_time,
            timeframe,
        })
    }

    /// Open a fresh candle at the bucket containing `tick`.
    ///
    /// Buckets are aligned to multiples of `duration_secs` since the Unix epoch.
    pub fn from_tick(timeframe: Timeframe, tick: &Tick, duration_secs: i64) -> Self {
        let open_time = bucket_start(tick.timestamp, duration_secs);
        Self {
            open: tick.price,
            high: tick.price,
            low: tick.price,
            close: tick.price,
            open_time,
            close_time: open_time + Duration::seconds(duration_secs),
            timeframe,
        }
    }

    /// True when `timestamp` falls inside this candle's window
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.open_time && timestamp < self.close_time
    }

    /// Fold a price into the still-open candle
    pub fn update(&mut self, price: Decimal) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
    }

    /// Extend this candle with the next candle of the same series
    pub fn absorb(&mut self, next: &Candle) {
        self.high = self.high.max(next.high);
        self.low = self.low.min(next.low);
        self.close = next.close;
        self.close_time = next.close_time;
    }

    /// Re-label this candle for another timeframe
    pub fn with_timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = timeframe;
        self
    }

    /// High minus low
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// Does `[low, high]` intersect the closed interval `[lower, upper]`?
    pub fn intersects(&self, lower: Decimal, upper: Decimal) -> bool {
        self.low <= upper && self.high >= lower
    }
}

/// Start of the `duration_secs` bucket containing `timestamp`
pub fn bucket_start(timestamp: DateTime<Utc>, duration_secs: i64) -> DateTime<Utc> {
    let millis = timestamp.timestamp_millis();
    let width = duration_secs * 1000;
    let start = millis.div_euclid(width) * width;
    DateTime::<Utc>::from_timestamp_millis(start).unwrap_or(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_candle_from_tick_is_bucket_aligned() {
        let tick = Tick::new(dec!(100.5), at(1_700_000_123));
        let candle = Candle::from_tick(Timeframe::Exec, &tick, 300);

        assert_eq!(candle.open_time.timestamp() % 300, 0);
        assert_eq!((candle.close_time - candle.open_time).num_seconds(), 300);
        assert!(candle.contains(tick.timestamp));
        assert_eq!(candle.open, dec!(100.5));
        assert_eq!(candle.close, dec!(100.5));
    }

    #[test]
    fn test_update_tracks_extrema() {
        let mut candle = Candle::from_tick(Timeframe::Exec, &Tick::new(dec!(100), at(0)), 60);
        candle.update(dec!(103));
        candle.update(dec!(98));
        candle.update(dec!(101));

        assert_eq!(candle.high, dec!(103));
        assert_eq!(candle.low, dec!(98));
        assert_eq!(candle.close, dec!(101));
        assert_eq!(candle.open, dec!(100));
        assert_eq!(candle.range(), dec!(5));
    }

    #[test]
    fn test_new_rejects_bad_window_and_ohlc() {
        let err = Candle::new(
            Timeframe::Exec,
            dec!(1),
            dec!(2),
            dec!(0.5),
            dec!(1.5),
            at(60),
            at(60),
        );
        assert!(matches!(err, Err(CandleError::InvalidWindow { .. })));

        let err = Candle::new(
            Timeframe::Exec,
            dec!(3),
            dec!(2),
            dec!(0.5),
            dec!(1.5),
            at(0),
            at(60),
        );
        assert!(matches!(err, Err(CandleError::InconsistentOhlc { .. })));
    }

    #[test]
    fn test_intersects_uses_full_range() {
        let candle = Candle::new(
            Timeframe::Exec,
            dec!(101),
            dec!(101.5),
            dec!(99.9),
            dec!(101),
            at(0),
            at(300),
        )
        .unwrap();

        assert!(candle.intersects(dec!(98), dec!(100)));
        assert!(!candle.intersects(dec!(96), dec!(99.8)));
    }

    #[test]
    fn test_bucket_start_handles_pre_epoch() {
        let ts = Utc.timestamp_opt(-1, 0).unwrap();
        assert_eq!(bucket_start(ts, 60).timestamp(), -60);
    }
}
