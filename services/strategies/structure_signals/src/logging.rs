//! Tracing subscriber setup for the service binary

use anyhow::{anyhow, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `default_level`; the default filter keeps this
/// service's crates at `default_level` and everything else at `warn`.
pub fn init_strategy_logging(service_name: &str, default_level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!(
            "structure_signals={level},hyperliquid_adapter={level},alert_sink={level},alerts=info,warn",
            level = default_level
        ))
    })?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };
    installed.map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))?;

    tracing::info!(service = service_name, json, "Logging initialised");
    Ok(())
}
