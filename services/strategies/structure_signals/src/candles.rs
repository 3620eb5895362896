//! Tick-to-candle aggregation for the execution and bias timeframes

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;
use types::{Candle, Tick, Timeframe};

/// Why a tick was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Timestamp not after the last accepted tick
    OutOfOrder,
    /// Zero or negative price
    NonPositivePrice,
}

/// Result of feeding one tick
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    /// Tick folded into the open candle (or opened the first one)
    Updated,
    /// Tick crossed a boundary: the previous execution candle closed, and
    /// possibly completed a bias candle
    Closed { exec: Candle, bias: Option<Candle> },
    Dropped(DropReason),
}

#[derive(Debug, Clone)]
struct BiasGroup {
    candle: Candle,
    count: i64,
}

/// Forward-only candle builder.
///
/// Execution windows are aligned to multiples of the execution timeframe
/// since the Unix epoch. A bias candle is started only by an execution candle
/// aligned to the bias timeframe and completed by `N` contiguous execution
/// candles; a gap discards the partial group.
#[derive(Debug, Clone)]
pub struct CandleAggregator {
    exec_secs: i64,
    bias_secs: i64,
    ratio: i64,
    last_tick: Option<DateTime<Utc>>,
    current: Option<Candle>,
    bias: Option<BiasGroup>,
}

impl CandleAggregator {
    /// `bias_secs` must be a positive multiple of `exec_secs`, which
    /// `EngineConfig::validate` enforces.
    pub fn new(exec_secs: i64, bias_secs: i64) -> Self {
        let exec_secs = exec_secs.max(1);
        let ratio = (bias_secs / exec_secs).max(1);
        Self {
            exec_secs,
            bias_secs: exec_secs * ratio,
            ratio,
            last_tick: None,
            current: None,
            bias: None,
        }
    }

    pub fn ingest(&mut self, tick: &Tick) -> IngestOutcome {
        if tick.price <= Decimal::ZERO {
            return IngestOutcome::Dropped(DropReason::NonPositivePrice);
        }
        if matches!(self.last_tick, Some(last) if tick.timestamp <= last) {
            return IngestOutcome::Dropped(DropReason::OutOfOrder);
        }
        self.last_tick = Some(tick.timestamp);

        if let Some(open) = self.current.as_mut().filter(|c| c.contains(tick.timestamp)) {
            open.update(tick.price);
            return IngestOutcome::Updated;
        }

        let next = Candle::from_tick(Timeframe::Exec, tick, self.exec_secs);
        match self.current.replace(next) {
            Some(closed) => {
                let bias = self.fold_bias(&closed);
                IngestOutcome::Closed { exec: closed, bias }
            }
            None => IngestOutcome::Updated,
        }
    }

    /// The execution candle still being built
    pub fn open_candle(&self) -> Option<&Candle> {
        self.current.as_ref()
    }

    fn fold_bias(&mut self, exec: &Candle) -> Option<Candle> {
        if let Some(mut group) = self.bias.take() {
            if group.candle.close_time == exec.open_time {
                group.candle.absorb(exec);
                group.count += 1;
                if group.count == self.ratio {
                    return Some(group.candle);
                }
                self.bias = Some(group);
                return None;
            }
            debug!(
                open_time = %group.candle.open_time,
                candles = group.count,
                "Gap in execution candles, discarding partial bias candle"
            );
        }

        let aligned = exec.open_time.timestamp().rem_euclid(self.bias_secs) == 0;
        if !aligned {
            return None;
        }

        let start = exec.with_timeframe(Timeframe::Bias);
        if self.ratio == 1 {
            return Some(start);
        }
        self.bias = Some(BiasGroup {
            candle: start,
            count: 1,
        });
        None
    }
}
