//! Shared fixtures for the integration tests

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use structure_signals::EngineConfig;
use types::Tick;

/// First candle open, aligned to the 120s bias window
pub const T0: i64 = 1_700_000_040;
pub const EXEC_SECS: i64 = 60;

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

/// Small periods so the whole setup plays out in a dozen candles
pub fn scenario_config() -> EngineConfig {
    EngineConfig {
        exec_timeframe_secs: EXEC_SECS,
        bias_timeframe_secs: 2 * EXEC_SECS,
        ema_fast: 2,
        ema_slow: 3,
        atr_period: 2,
        pivot_lookback: 1,
        retest_buffer_atr: dec!(0.5),
        accept_bars: 1,
        stop_pad_atr: dec!(0.1),
        tp1_r_multiple: dec!(1),
        tp2_r_multiple: dec!(2),
        ..EngineConfig::default()
    }
}

/// (open, high, low, close) per execution candle.
///
/// Uptrend into a swing high at 107 (candle 6) and swing low at 104
/// (candle 7), a break above 107 at candle 9, a retest at candle 10,
/// acceptance and entry at candle 11, then TP1 and TP2.
pub fn scenario_candles() -> Vec<(Decimal, Decimal, Decimal, Decimal)> {
    vec![
        (dec!(100), dec!(101), dec!(99.5), dec!(100.5)),
        (dec!(100.5), dec!(102), dec!(100), dec!(101.5)),
        (dec!(101.5), dec!(103), dec!(101), dec!(102.5)),
        (dec!(102.5), dec!(104), dec!(102), dec!(103.5)),
        (dec!(103.5), dec!(105), dec!(103), dec!(104.5)),
        (dec!(104.5), dec!(106), dec!(104), dec!(105.5)),
        (dec!(105.5), dec!(107), dec!(104.5), dec!(106)),
        (dec!(106), dec!(106.5), dec!(104), dec!(104.5)),
        (dec!(104.5), dec!(105.5), dec!(104.2), dec!(105.2)),
        (dec!(105.2), dec!(107.8), dec!(105), dec!(107.5)),
        (dec!(107.5), dec!(107.6), dec!(106.5), dec!(107.0)),
        (dec!(107), dec!(108.5), dec!(106.8), dec!(108.2)),
        (dec!(108.2), dec!(113), dec!(108), dec!(112.8)),
        (dec!(112.8), dec!(117.5), dec!(112.5), dec!(117.2)),
    ]
}

/// Four ticks per candle (open, high, low, close) plus one tick in the next
/// window so the last candle closes.
pub fn ticks_for(candles: &[(Decimal, Decimal, Decimal, Decimal)]) -> Vec<Tick> {
    let mut ticks = Vec::with_capacity(candles.len() * 4 + 1);
    for (i, (open, high, low, close)) in candles.iter().enumerate() {
        let start = T0 + i as i64 * EXEC_SECS;
        ticks.push(Tick::new(*open, at(start + 1)));
        ticks.push(Tick::new(*high, at(start + 15)));
        ticks.push(Tick::new(*low, at(start + 30)));
        ticks.push(Tick::new(*close, at(start + 45)));
    }
    let next = T0 + candles.len() as i64 * EXEC_SECS;
    if let Some((_, _, _, close)) = candles.last() {
        ticks.push(Tick::new(*close, at(next + 1)));
    }
    ticks
}

pub fn scenario_ticks() -> Vec<Tick> {
    ticks_for(&scenario_candles())
}
