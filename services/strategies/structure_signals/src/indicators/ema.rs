use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Exponential moving average seeded by the simple average of the first
/// `period` values.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    k: Decimal,
    seed_sum: Decimal,
    seen: usize,
    value: Option<Decimal>,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            k: dec!(2) / Decimal::from(period + 1),
            seed_sum: dec!(0),
            seen: 0,
            value: None,
        }
    }

    /// Add a new value and return the EMA once it is warm
    pub fn update(&mut self, price: Decimal) -> Option<Decimal> {
        self.value = match self.value {
            Some(ema) => Some(price * self.k + ema * (Decimal::ONE - self.k)),
            None => {
                self.seed_sum += price;
                self.seen += 1;
                if self.seen == self.period {
                    Some(self.seed_sum / Decimal::from(self.period))
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

    pub fn period(&self) -> usize {
        self.period
    }
}
