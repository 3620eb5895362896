//! Structure Signals Service Entry Point

use alert_sink::{AlertDispatcher, CircuitBreakerSink, LogSink, TelegramConfig, TelegramSink};
use anyhow::{Context, Result};
use clap::Parser;
use hyperliquid_adapter::MidsFeed;
use service_config::defaults::{env, DEFAULT_CONFIG_PATH};
use std::path::PathBuf;
use structure_signals::logging::init_strategy_logging;
use structure_signals::{ServiceSettings, SignalEngine, SymbolRunner};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (overrides STRUCTURE_SIGNALS_CONFIG_PATH)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Comma-separated symbols, e.g. BTC,ETH
    #[arg(short, long, value_delimiter = ',')]
    symbols: Option<Vec<String>>,

    /// Emit JSON logs
    #[arg(long)]
    json_logs: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = load_settings(&args)?;

    if args.print_config {
        println!("{}", service_config::render_toml(&settings)?);
        return Ok(());
    }

    init_strategy_logging("structure_signals", &settings.log_level, settings.log_json)?;
    info!("Starting Structure Signals Service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let engine_config = &settings.engine;
    info!(
        symbols = ?settings.symbols,
        exec_secs = engine_config.exec_timeframe_secs,
        bias_secs = engine_config.bias_timeframe_secs,
        ema_fast = engine_config.ema_fast,
        ema_slow = engine_config.ema_slow,
        accept_bars = engine_config.accept_bars,
        trigger = ?engine_config.price_trigger,
        "Configuration loaded"
    );

    let (dispatcher, alert_worker) = spawn_dispatcher(&settings)?;

    let mut feed = MidsFeed::new(settings.feed.clone()).context("Invalid feed configuration")?;
    let feed_metrics = feed.metrics();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut runners: Vec<(String, JoinHandle<_>)> = Vec::with_capacity(settings.symbols.len());
    for symbol in &settings.symbols {
        let engine = SignalEngine::new(symbol.clone(), settings.engine.clone())
            .with_context(|| format!("Failed to create engine for {}", symbol))?;
        let runner = SymbolRunner::new(
            engine,
            feed.subscribe(symbol),
            dispatcher.clone(),
            settings.heartbeat_interval(),
        );
        let handle = tokio::spawn(runner.run(shutdown_rx.clone()));
        runners.push((symbol.clone(), handle));
    }
    let dispatch_metrics = dispatcher.metrics();
    drop(dispatcher);

    let mut feed_handle = tokio::spawn(feed.run(shutdown_rx));

    info!("Structure Signals Service running. Press Ctrl+C to stop.");
    let feed_result = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            info!("Shutdown signal received");
            None
        }
        result = &mut feed_handle => Some(result),
    };
    let _ = shutdown_tx.send(true);

    let feed_result = match feed_result {
        Some(result) => result,
        None => feed_handle.await,
    };
    match feed_result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("Feed stopped with error: {}", e),
        Err(e) => error!("Feed task panicked: {}", e),
    }
    for (symbol, handle) in runners {
        if let Err(e) = handle.await {
            error!(symbol = %symbol, "Runner task failed: {}", e);
        }
    }

    // Runners held the last dispatcher clones, so the worker drains and exits
    if let Err(e) = alert_worker.await {
        warn!("Alert worker failed: {}", e);
    }

    let feed_stats = feed_metrics.snapshot();
    let alert_stats = dispatch_metrics.snapshot();
    info!(
        frames = feed_stats.frames_received,
        ticks_routed = feed_stats.ticks_routed,
        ticks_dropped = feed_stats.ticks_dropped,
        reconnects = feed_stats.reconnects,
        alerts_delivered = alert_stats.delivered,
        alerts_dropped = alert_stats.dropped,
        "Structure Signals Service stopped"
    );
    Ok(())
}

fn load_settings(args: &Args) -> Result<ServiceSettings> {
    let path = args
        .config
        .clone()
        .unwrap_or_else(|| service_config::resolve_config_path(env::CONFIG_PATH, DEFAULT_CONFIG_PATH));

    let mut settings: ServiceSettings =
        service_config::load_layered(&path, env::OVERRIDE_PREFIX, env::OVERRIDE_SEPARATOR)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    if let Some(symbols) = &args.symbols {
        settings.symbols = symbols
            .iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
    }
    if args.json_logs {
        settings.log_json = true;
    }

    settings.validate().context("Invalid configuration")?;
    Ok(settings)
}

/// Telegram behind a circuit breaker when credentials are present, otherwise
/// alerts go to the log.
fn spawn_dispatcher(settings: &ServiceSettings) -> Result<(AlertDispatcher, JoinHandle<()>)> {
    let dispatch_config = settings.alerts.dispatch_config();

    match TelegramConfig::from_env(env::TELEGRAM_BOT_TOKEN, env::TELEGRAM_CHAT_ID) {
        Some(telegram) => {
            let sink = TelegramSink::new(telegram.with_timeout(settings.alerts.request_timeout()))
                .context("Failed to create Telegram sink")?;
            info!("Alerts will be sent to Telegram");
            Ok(AlertDispatcher::spawn(
                CircuitBreakerSink::new(sink, settings.alerts.circuit_config()),
                dispatch_config,
            ))
        }
        None => {
            warn!(
                "{} / {} not set, alerts will only be logged",
                env::TELEGRAM_BOT_TOKEN,
                env::TELEGRAM_CHAT_ID
            );
            Ok(AlertDispatcher::spawn(LogSink::new(), dispatch_config))
        }
    }
}
