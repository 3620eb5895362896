use std::collections::VecDeque;
use types::{Candle, Pivot, PivotKind};

/// Confirmed pivots kept per kind
const RING_CAPACITY: usize = 2;

/// Pivots confirmed by a single candle close
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Confirmed {
    pub high: Option<Pivot>,
    pub low: Option<Pivot>,
}

/// Swing pivot detector over a trailing `2 * lookback + 1` window.
///
/// The centre candle is a swing high when its high is strictly above every
/// other high in the window, a swing low when its low is strictly below every
/// other low. Pivots are therefore confirmed `lookback` closes after the
/// pivot candle, and never revised.
#[derive(Debug, Clone)]
pub struct PivotTracker {
    lookback: usize,
    window: VecDeque<Candle>,
    highs: VecDeque<Pivot>,
    lows: VecDeque<Pivot>,
    confirmed: u64,
}

impl PivotTracker {
    pub fn new(lookback: usize) -> Self {
        let lookback = lookback.max(1);
        Self {
            lookback,
            window: VecDeque::with_capacity(2 * lookback + 1),
            highs: VecDeque::with_capacity(RING_CAPACITY),
            lows: VecDeque::with_capacity(RING_CAPACITY),
            confirmed: 0,
        }
    }

    pub fn update(&mut self, candle: &Candle) -> Confirmed {
        let width = 2 * self.lookback + 1;
        self.window.push_back(*candle);
        if self.window.len() > width {
            self.window.pop_front();
        }
        if self.window.len() < width {
            return Confirmed::default();
        }

        let centre = self.window[self.lookback];
        let others = || {
            self.window
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != self.lookback)
                .map(|(_, c)| c)
        };

        let is_high = others().all(|c| c.high < centre.high);
        let is_low = others().all(|c| c.low > centre.low);

        let mut confirmed = Confirmed::default();
        if is_high {
            let pivot = Pivot::high(centre.high, centre.open_time);
            push_ring(&mut self.highs, pivot);
            self.confirmed += 1;
            confirmed.high = Some(pivot);
        }
        if is_low {
            let pivot = Pivot::low(centre.low, centre.open_time);
            push_ring(&mut self.lows, pivot);
            self.confirmed += 1;
            confirmed.low = Some(pivot);
        }
        confirmed
    }

    pub fn last_high(&self) -> Option<Pivot> {
        self.highs.back().copied()
    }

    pub fn last_low(&self) -> Option<Pivot> {
        self.lows.back().copied()
    }

    /// The two most recent pivots of `kind`, oldest first
    pub fn recent(&self, kind: PivotKind) -> impl Iterator<Item = &Pivot> {
        match kind {
            PivotKind::High => self.highs.iter(),
            PivotKind::Low => self.lows.iter(),
        }
    }

    /// Total pivots confirmed since creation
    pub fn confirmed_count(&self) -> u64 {
        self.confirmed
    }
}

fn push_ring(ring: &mut VecDeque<Pivot>, pivot: Pivot) {
    if ring.len() == RING_CAPACITY {
        ring.pop_front();
    }
    ring.push_back(pivot);
}
