//! Property tests for the aggregation, indicator and pattern invariants

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use structure_signals::indicators::{Ema, PivotTracker};
use structure_signals::{
    CandleAggregator, EngineConfig, IndicatorSnapshot, IngestOutcome, PatternMachine, PatternPhase,
};
use types::{Candle, Direction, Pivot, Tick, Timeframe};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn price(cents: u32) -> Decimal {
    Decimal::new(cents as i64, 2)
}

/// Candle around `close` with independent wick lengths
fn candle(i: i64, close: Decimal, up: Decimal, down: Decimal) -> Candle {
    Candle::new(
        Timeframe::Exec,
        close,
        close + up,
        close - down,
        close,
        at(i * 60),
        at(i * 60 + 60),
    )
    .unwrap()
}

fn ticks_strategy() -> impl Strategy<Value = Vec<(i64, u32)>> {
    // (seconds since previous tick, possibly negative; price in cents)
    prop::collection::vec((-20i64..150, 0u32..20_000), 1..300)
}

proptest! {
    #[test]
    fn prop_exec_candles_increase_and_bias_candles_tile(steps in ticks_strategy(), ratio in 1i64..5) {
        let exec_secs = 60;
        let bias_secs = exec_secs * ratio;
        let mut agg = CandleAggregator::new(exec_secs, bias_secs);
        let mut exec = Vec::new();
        let mut bias = Vec::new();

        let mut now = 1_000_000;
        for (delta, cents) in steps {
            now += delta;
            if let IngestOutcome::Closed { exec: e, bias: b } = agg.ingest(&Tick::new(price(cents), at(now))) {
                exec.push(e);
                bias.extend(b);
            }
        }

        for pair in exec.windows(2) {
            prop_assert!(pair[0].open_time < pair[1].open_time);
        }
        for c in &exec {
            prop_assert!(c.open_time < c.close_time);
            prop_assert!(c.low <= c.open.min(c.close) && c.high >= c.open.max(c.close));
        }

        for b in &bias {
            prop_assert_eq!(b.timeframe, Timeframe::Bias);
            prop_assert_eq!(b.open_time.timestamp().rem_euclid(bias_secs), 0);
            prop_assert_eq!((b.close_time - b.open_time).num_seconds(), bias_secs);

            let members: Vec<_> = exec
                .iter()
                .filter(|e| e.open_time >= b.open_time && e.close_time <= b.close_time)
                .collect();
            prop_assert_eq!(members.len() as i64, ratio);
            for pair in members.windows(2) {
                prop_assert_eq!(pair[0].close_time, pair[1].open_time);
            }
            prop_assert_eq!(b.open, members[0].open);
            prop_assert_eq!(b.close, members[members.len() - 1].close);
            prop_assert_eq!(b.high, members.iter().map(|e| e.high).max().unwrap());
            prop_assert_eq!(b.low, members.iter().map(|e| e.low).min().unwrap());
        }
    }

    #[test]
    fn prop_ema_is_deterministic_under_replay(
        prices in prop::collection::vec(1u32..1_000_000, 1..200),
        period in 1usize..30,
    ) {
        let run = || {
            let mut ema = Ema::new(period);
            prices.iter().map(|p| ema.update(price(*p))).collect::<Vec<_>>()
        };
        let first = run();
        prop_assert_eq!(&first, &run());
        prop_assert_eq!(first.iter().filter(|v| v.is_some()).count(), prices.len().saturating_sub(period - 1));
    }

    #[test]
    fn prop_pivots_are_append_only(
        bars in prop::collection::vec((1u32..10_000, 0u32..500, 0u32..500), 1..150),
        lookback in 1usize..4,
        cut in 0usize..150,
    ) {
        let candles: Vec<_> = bars
            .iter()
            .enumerate()
            .map(|(i, (c, up, down))| candle(i as i64, price(*c + 500), price(*up), price(*down)))
            .collect();

        let confirm_all = |input: &[Candle]| {
            let mut tracker = PivotTracker::new(lookback);
            let mut confirmed: Vec<Pivot> = Vec::new();
            for c in input {
                let step = tracker.update(c);
                confirmed.extend(step.high);
                confirmed.extend(step.low);
            }
            (confirmed, tracker.confirmed_count())
        };

        let (full, count) = confirm_all(&candles);
        let (prefix, _) = confirm_all(&candles[..cut.min(candles.len())]);
        prop_assert_eq!(count as usize, full.len());
        prop_assert!(prefix.len() <= full.len());
        prop_assert_eq!(&full[..prefix.len()], &prefix[..]);
    }

    #[test]
    fn prop_signal_only_after_full_acceptance(
        closes in prop::collection::vec((9_400u32..10_600, 0u32..300, 0u32..300), 1..120),
        accept_bars in 1u32..4,
    ) {
        let config = EngineConfig {
            retest_buffer_atr: dec!(1),
            accept_bars,
            ..EngineConfig::default()
        };
        let mut machine = PatternMachine::new(config);
        let t = at(0);
        let exec = IndicatorSnapshot {
            ema_fast: Some(dec!(2)),
            ema_slow: Some(dec!(1)),
            atr: Some(dec!(2)),
            last_swing_high: Some(Pivot::high(dec!(100), t)),
            last_swing_low: Some(Pivot::low(dec!(95), t)),
        };
        let bias = IndicatorSnapshot {
            ema_fast: Some(dec!(2)),
            ema_slow: Some(dec!(1)),
            ..IndicatorSnapshot::default()
        };

        let mut seen_retest = false;
        for (i, (c, up, down)) in closes.iter().enumerate() {
            let before = machine.phase();
            if matches!(before, PatternPhase::AcceptanceWait { .. }) {
                seen_retest = true;
            }
            let bar = candle(i as i64, price(*c), price(*up), price(*down));
            if let Some(signal) = machine.on_candle(&bar, &exec, &bias) {
                prop_assert_eq!(
                    before,
                    PatternPhase::AcceptanceWait { direction: Direction::Long, count: accept_bars - 1 }
                );
                prop_assert!(seen_retest);
                prop_assert_eq!(signal.break_level, dec!(100));
                prop_assert!(signal.entry > signal.break_level);
                prop_assert!(signal.stop < signal.entry && signal.entry < signal.tp1 && signal.tp1 < signal.tp2);
            }
        }
    }
}
