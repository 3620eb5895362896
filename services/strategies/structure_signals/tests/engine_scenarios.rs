//! End-to-end engine behaviour from raw ticks

mod common;

use common::*;
use rust_decimal_macros::dec;
use structure_signals::{EngineEvent, PatternPhase, SignalEngine, TakeProfitLevel};
use types::{Direction, Tick};

fn run(engine: &mut SignalEngine, ticks: &[Tick]) -> Vec<EngineEvent> {
    ticks.iter().flat_map(|tick| engine.on_tick(tick)).collect()
}

#[test]
fn test_full_tick_path_emits_long_then_both_targets() {
    let mut engine = SignalEngine::new("BTC", scenario_config()).unwrap();
    let events = run(&mut engine, &scenario_ticks());

    let kinds: Vec<_> = events.iter().map(EngineEvent::kind).collect();
    assert_eq!(kinds, vec!["LONG", "TP1", "TP2"]);

    let EngineEvent::Signal(signal) = &events[0] else {
        panic!("first event should be the signal");
    };
    assert_eq!(signal.direction, Direction::Long);
    assert_eq!(signal.break_level, dec!(107));
    assert_eq!(signal.entry, dec!(108.2));
    assert_eq!(signal.atr, dec!(1.7046875));
    assert_eq!(signal.stop, dec!(103.82953125));
    assert_eq!(signal.risk(), dec!(4.37046875));
    assert_eq!(signal.tp1, dec!(112.57046875));
    assert_eq!(signal.tp2, dec!(116.9409375));
    // Candle 11 closes at T0 + 12 minutes
    assert_eq!(signal.time, at(T0 + 12 * EXEC_SECS));

    assert!(matches!(
        events[2],
        EngineEvent::TakeProfit { level: TakeProfitLevel::Tp2, .. }
    ));
    assert!(engine.position().is_none());

    let stats = engine.metrics().snapshot();
    assert_eq!(stats.exec_candles, 14);
    assert_eq!(stats.bias_candles, 7);
    assert_eq!(stats.signals, 1);
    assert_eq!(stats.tp1, 1);
    assert_eq!(stats.tp2, 1);
    assert_eq!(stats.stops, 0);
    assert_eq!(stats.ticks_dropped(), 0);
}

#[test]
fn test_phases_through_break_and_retest() {
    let mut engine = SignalEngine::new("BTC", scenario_config()).unwrap();
    let ticks = scenario_ticks();

    // First tick of candle 10 closes the break candle
    let events = run(&mut engine, &ticks[..41]);
    assert!(events.is_empty());
    assert_eq!(engine.phase(), PatternPhase::RetestWait(Direction::Long));
    assert_eq!(engine.exec_snapshot().last_swing_high.unwrap().price, dec!(107));
    assert_eq!(engine.exec_snapshot().last_swing_low.unwrap().price, dec!(104));

    // Candle 10 wicks into the zone
    let events = run(&mut engine, &ticks[41..45]);
    assert!(events.is_empty());
    assert_eq!(
        engine.phase(),
        PatternPhase::AcceptanceWait { direction: Direction::Long, count: 0 }
    );

    // Candle 11 closes above the break level and opens the position
    let events = run(&mut engine, &ticks[45..49]);
    assert_eq!(events.len(), 1);
    assert!(engine.position().is_some());
    assert_eq!(engine.phase(), PatternPhase::Idle);
}

#[test]
fn test_out_of_order_tick_is_dropped() {
    let mut engine = SignalEngine::new("BTC", scenario_config()).unwrap();
    let ticks = scenario_ticks();
    run(&mut engine, &ticks[..6]);
    let before = *engine.open_candle().unwrap();

    let stale = Tick::new(dec!(150), ticks[5].timestamp);
    assert!(engine.on_tick(&stale).is_empty());
    let older = Tick::new(dec!(1), ticks[0].timestamp);
    assert!(engine.on_tick(&older).is_empty());

    assert_eq!(*engine.open_candle().unwrap(), before);
    assert_eq!(engine.metrics().snapshot().ticks_out_of_order, 2);
}

#[test]
fn test_stop_before_target_retires_position() {
    let mut candles = scenario_candles();
    candles.truncate(12);
    candles.push((dec!(108.2), dec!(108.5), dec!(103), dec!(103.5)));
    candles.push((dec!(103.5), dec!(114), dec!(103), dec!(113.9)));

    let mut engine = SignalEngine::new("BTC", scenario_config()).unwrap();
    let events = run(&mut engine, &ticks_for(&candles));

    let kinds: Vec<_> = events.iter().map(EngineEvent::kind).collect();
    assert_eq!(kinds, vec!["LONG", "STOP"]);
    assert!(engine.position().is_none());
}

#[test]
fn test_second_engine_is_independent() {
    let ticks = scenario_ticks();
    let mut btc = SignalEngine::new("BTC", scenario_config()).unwrap();
    let mut eth = SignalEngine::new("ETH", scenario_config()).unwrap();

    let btc_events = run(&mut btc, &ticks);
    run(&mut eth, &ticks[..20]);

    assert_eq!(btc_events.len(), 3);
    assert_eq!(eth.metrics().snapshot().signals, 0);
    assert_eq!(eth.symbol(), "ETH");
}
