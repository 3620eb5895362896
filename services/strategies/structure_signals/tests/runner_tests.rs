//! Symbol runner wiring: ticks in, alert text out

mod common;

use alert_sink::test_utils::CollectorSink;
use alert_sink::{AlertDispatcher, DispatchConfig};
use common::*;
use std::sync::Arc;
use std::time::Duration;
use structure_signals::{SignalEngine, SymbolRunner};
use tokio::sync::{mpsc, watch};

fn fast_dispatch() -> DispatchConfig {
    DispatchConfig {
        queue_capacity: 16,
        max_attempts: 3,
        retry_base: Duration::from_millis(1),
        retry_max: Duration::from_millis(5),
    }
}

#[tokio::test]
async fn test_runner_delivers_alerts_for_every_event() {
    let collector = Arc::new(CollectorSink::new());
    let (dispatcher, worker) = AlertDispatcher::spawn(collector.clone(), fast_dispatch());

    let (tx, rx) = mpsc::channel(256);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let engine = SignalEngine::new("BTC", scenario_config()).unwrap();
    let runner = SymbolRunner::new(engine, rx, dispatcher.clone(), Duration::from_secs(3_600));
    let handle = tokio::spawn(runner.run(shutdown_rx));

    for tick in scenario_ticks() {
        tx.send(tick).await.unwrap();
    }
    drop(tx);

    let stats = handle.await.unwrap();
    assert_eq!(stats.signals, 1);
    assert_eq!(stats.exec_candles, 14);

    drop(dispatcher);
    worker.await.unwrap();

    let alerts = collector.received();
    assert_eq!(alerts.len(), 3);
    assert!(alerts[0].starts_with("BTC LONG (BOS+Retest+Accept)"));
    assert!(alerts[0].contains("entry=108.2 stop=103.83"));
    assert!(alerts[1].starts_with("BTC LONG TP1 hit 112.57"));
    assert!(alerts[2].starts_with("BTC LONG TP2 hit 116.94"));
}

#[tokio::test]
async fn test_alert_failures_do_not_stall_the_runner() {
    let collector = Arc::new(CollectorSink::new());
    collector.fail_next(100);
    let (dispatcher, worker) = AlertDispatcher::spawn(collector.clone(), fast_dispatch());

    let (tx, rx) = mpsc::channel(256);
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let engine = SignalEngine::new("BTC", scenario_config()).unwrap();
    let runner = SymbolRunner::new(engine, rx, dispatcher.clone(), Duration::from_secs(3_600));
    let handle = tokio::spawn(runner.run(shutdown_rx));

    for tick in scenario_ticks() {
        tx.send(tick).await.unwrap();
    }
    drop(tx);

    let stats = handle.await.unwrap();
    assert_eq!(stats.signals, 1);
    assert_eq!(stats.tp2, 1);

    let metrics = dispatcher.metrics();
    drop(dispatcher);
    worker.await.unwrap();

    assert!(collector.received().is_empty());
    assert_eq!(metrics.snapshot().dropped, 3);
}

#[tokio::test]
async fn test_runner_stops_on_shutdown() {
    let collector = Arc::new(CollectorSink::new());
    let (dispatcher, _worker) = AlertDispatcher::spawn(collector, fast_dispatch());

    let (_tx, rx) = mpsc::channel(8);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let engine = SignalEngine::new("ETH", scenario_config()).unwrap();
    let runner = SymbolRunner::new(engine, rx, dispatcher, Duration::from_secs(3_600));
    let handle = tokio::spawn(runner.run(shutdown_rx));

    shutdown_tx.send(true).unwrap();
    let stats = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("runner should stop")
        .unwrap();
    assert_eq!(stats.ticks_received, 0);
}
