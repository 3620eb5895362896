use super::{Atr, Confirmed, Ema, PivotTracker};
use crate::config::EngineConfig;
use rust_decimal::Decimal;
use types::{Candle, Direction, Pivot};

/// Indicator values after a candle close. Each field is `None` until the
/// indicator behind it is warm.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndicatorSnapshot {
    pub ema_fast: Option<Decimal>,
    pub ema_slow: Option<Decimal>,
    pub atr: Option<Decimal>,
    pub last_swing_high: Option<Pivot>,
    pub last_swing_low: Option<Pivot>,
}

impl IndicatorSnapshot {
    /// Fast above slow is bullish, below is bearish. Equal or cold EMAs
    /// carry no direction.
    pub fn trend(&self) -> Option<Direction> {
        let (fast, slow) = (self.ema_fast?, self.ema_slow?);
        if fast > slow {
            Some(Direction::Long)
        } else if fast < slow {
            Some(Direction::Short)
        } else {
            None
        }
    }

    /// Swing level a break in `direction` has to clear
    pub fn swing_for(&self, direction: Direction) -> Option<Pivot> {
        match direction {
            Direction::Long => self.last_swing_high,
            Direction::Short => self.last_swing_low,
        }
    }
}

/// Incremental indicator state for one timeframe.
///
/// The execution timeframe carries ATR and pivots; the bias timeframe only
/// needs its EMA pair.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    fast: Ema,
    slow: Ema,
    atr: Option<Atr>,
    pivots: Option<PivotTracker>,
    candles: u64,
}

impl IndicatorEngine {
    pub fn new_exec(config: &EngineConfig) -> Self {
        Self {
            fast: Ema::new(config.ema_fast),
            slow: Ema::new(config.ema_slow),
            atr: Some(Atr::new(config.atr_period)),
            pivots: Some(PivotTracker::new(config.pivot_lookback)),
            candles: 0,
        }
    }

    pub fn new_bias(config: &EngineConfig) -> Self {
        Self {
            fast: Ema::new(config.ema_fast),
            slow: Ema::new(config.ema_slow),
            atr: None,
            pivots: None,
            candles: 0,
        }
    }

    /// Fold one closed candle into every indicator and return the new snapshot
    pub fn update(&mut self, candle: &Candle) -> IndicatorSnapshot {
        self.update_with_pivots(candle).0
    }

    /// Same as `update`, also returning the pivots this close confirmed
    pub fn update_with_pivots(&mut self, candle: &Candle) -> (IndicatorSnapshot, Confirmed) {
        self.candles += 1;
        self.fast.update(candle.close);
        self.slow.update(candle.close);
        if let Some(atr) = self.atr.as_mut() {
            atr.update(candle);
        }
        let confirmed = self
            .pivots
            .as_mut()
            .map(|p| p.update(candle))
            .unwrap_or_default();
        (self.snapshot(), confirmed)
    }

    pub fn snapshot(&self) -> IndicatorSnapshot {
        IndicatorSnapshot {
            ema_fast: self.fast.current(),
            ema_slow: self.slow.current(),
            atr: self.atr.as_ref().and_then(Atr::current),
            last_swing_high: self.pivots.as_ref().and_then(PivotTracker::last_high),
            last_swing_low: self.pivots.as_ref().and_then(PivotTracker::last_low),
        }
    }

    pub fn pivots(&self) -> Option<&PivotTracker> {
        self.pivots.as_ref()
    }

    /// Candles folded so far
    pub fn candles_seen(&self) -> u64 {
        self.candles
    }
}
