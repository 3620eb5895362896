use rust_decimal::Decimal;
use types::Candle;

/// Average true range with Wilder smoothing.
///
/// The first true range needs a previous close, so the first candle only
/// primes the indicator. The average is seeded by the mean of the first
/// `period` true ranges and is ready after `period + 1` candles.
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    prev_close: Option<Decimal>,
    seed_sum: Decimal,
    seed_count: usize,
    value: Option<Decimal>,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self {
            period: period.max(1),
            prev_close: None,
            seed_sum: Decimal::ZERO,
            seed_count: 0,
            value: None,
        }
    }

    pub fn update(&mut self, candle: &Candle) -> Option<Decimal> {
        let Some(prev_close) = self.prev_close.replace(candle.close) else {
            return None;
        };

        let tr = true_range(candle, prev_close);
        let n = Decimal::from(self.period);

        self.value = match self.value {
            Some(atr) => Some((atr * (n - Decimal::ONE) + tr) / n),
            None => {
                self.seed_sum += tr;
                self.seed_count += 1;
                if self.seed_count == self.period {
                    Some(self.seed_sum / n)
                } else {
                    None
                }
            }
        };
        self.value
    }

    pub fn current(&self) -> Option<Decimal> {
        self.value
    }

    pub fn is_ready(&self) -> bool {
        self.value.is_some()
    }
}

/// `max(high - low, |high - prev_close|, |low - prev_close|)`
pub fn true_range(candle: &Candle, prev_close: Decimal) -> Decimal {
    let range = candle.high - candle.low;
    let up = (candle.high - prev_close).abs();
    let down = (candle.low - prev_close).abs();
    range.max(up).max(down)
}
