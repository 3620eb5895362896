//! Strategy configuration

use crate::error::{Result, StrategyError};
use alert_sink::{CircuitBreakerConfig, DispatchConfig};
use hyperliquid_adapter::FeedConfig;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use service_config::defaults::{alerts, strategies};
use std::time::Duration;

/// Which candle price decides whether a TP or stop level was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTrigger {
    /// Closing price only
    Close,
    /// High/low extremes of the candle
    Wick,
}

/// Parameters of the per-symbol signal engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Execution timeframe in seconds
    pub exec_timeframe_secs: i64,
    /// Bias timeframe in seconds, a whole multiple of the execution timeframe
    pub bias_timeframe_secs: i64,

    pub ema_fast: usize,
    pub ema_slow: usize,
    pub atr_period: usize,

    /// Candles required on each side of a swing pivot
    pub pivot_lookback: usize,

    /// Retest zone half-width as a multiple of ATR
    pub retest_buffer_atr: Decimal,
    /// Consecutive closes beyond the break level required after the retest
    pub accept_bars: u32,

    /// Stop distance beyond the anchor swing, in ATR
    pub stop_pad_atr: Decimal,
    pub tp1_r_multiple: Decimal,
    pub tp2_r_multiple: Decimal,

    pub price_trigger: PriceTrigger,

    /// Move the stop to entry (plus a small buffer) once TP1 is hit
    pub breakeven_after_tp1: bool,
    pub breakeven_buffer_atr: Decimal,

    /// Close the position this many candles after TP1
    pub max_bars_after_tp1: Option<u32>,

    /// After TP1, trail the stop behind the newest confirmed swing
    pub trail_structure_after_tp1: bool,
    pub structure_pad_atr: Decimal,

    /// After TP1, trail the stop `atr_trail_mult` ATR behind the best price
    pub trail_atr_after_tp1: bool,
    pub atr_trail_mult: Decimal,

    /// After TP1, exit when the execution EMAs cross against the position
    pub ema_cross_exit_after_tp1: bool,

    /// Abandon a pending setup when bias or execution trend turns against it
    pub cancel_on_trend_flip: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            exec_timeframe_secs: 300,
            bias_timeframe_secs: 3_600,
            ema_fast: 9,
            ema_slow: 21,
            atr_period: 14,
            pivot_lookback: 2,
            retest_buffer_atr: dec!(0.30),
            accept_bars: 1,
            stop_pad_atr: dec!(0.10),
            tp1_r_multiple: dec!(1.0),
            tp2_r_multiple: dec!(2.0),
            price_trigger: PriceTrigger::Close,
            breakeven_after_tp1: false,
            breakeven_buffer_atr: dec!(0.10),
            max_bars_after_tp1: None,
            trail_structure_after_tp1: false,
            structure_pad_atr: dec!(0.10),
            trail_atr_after_tp1: false,
            atr_trail_mult: dec!(1.2),
            ema_cross_exit_after_tp1: false,
            cancel_on_trend_flip: true,
        }
    }
}

impl EngineConfig {
    /// Number of execution candles per bias candle
    pub fn bias_ratio(&self) -> i64 {
        self.bias_timeframe_secs / self.exec_timeframe_secs
    }

    pub fn validate(&self) -> Result<()> {
        if self.exec_timeframe_secs <= 0 || self.bias_timeframe_secs <= 0 {
            return Err(StrategyError::configuration("timeframes must be positive"));
        }
        if self.bias_timeframe_secs < self.exec_timeframe_secs
            || self.bias_timeframe_secs % self.exec_timeframe_secs != 0
        {
            return Err(StrategyError::configuration(format!(
                "bias timeframe {}s must be a whole multiple of exec timeframe {}s",
                self.bias_timeframe_secs, self.exec_timeframe_secs
            )));
        }
        if self.ema_fast == 0 || self.ema_slow == 0 || self.atr_period == 0 {
            return Err(StrategyError::configuration("indicator periods must be at least 1"));
        }
        if self.ema_fast >= self.ema_slow {
            return Err(StrategyError::configuration(format!(
                "ema_fast ({}) must be shorter than ema_slow ({})",
                self.ema_fast, self.ema_slow
            )));
        }
        if self.pivot_lookback == 0 {
            return Err(StrategyError::configuration("pivot_lookback must be at least 1"));
        }
        if self.accept_bars == 0 {
            return Err(StrategyError::configuration("accept_bars must be at least 1"));
        }
        for (name, value) in [
            ("retest_buffer_atr", self.retest_buffer_atr),
            ("stop_pad_atr", self.stop_pad_atr),
            ("breakeven_buffer_atr", self.breakeven_buffer_atr),
            ("structure_pad_atr", self.structure_pad_atr),
            ("atr_trail_mult", self.atr_trail_mult),
        ] {
            if value.is_sign_negative() {
                return Err(StrategyError::configuration(format!(
                    "{} must not be negative",
                    name
                )));
            }
        }
        if self.tp1_r_multiple <= Decimal::ZERO || self.tp2_r_multiple <= self.tp1_r_multiple {
            return Err(StrategyError::configuration(
                "take-profit multiples must satisfy 0 < tp1 < tp2",
            ));
        }
        if self.max_bars_after_tp1 == Some(0) {
            return Err(StrategyError::configuration(
                "max_bars_after_tp1 must be at least 1 when set",
            ));
        }
        Ok(())
    }
}

/// Alert delivery settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    pub queue_capacity: usize,
    pub max_attempts: u32,
    pub retry_base_ms: u64,
    pub retry_max_ms: u64,
    pub request_timeout_ms: u64,
    pub circuit_failure_threshold: usize,
    pub circuit_recovery_secs: u64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            queue_capacity: alerts::QUEUE_CAPACITY,
            max_attempts: alerts::MAX_ATTEMPTS,
            retry_base_ms: alerts::RETRY_BASE_MS,
            retry_max_ms: alerts::RETRY_MAX_MS,
            request_timeout_ms: alerts::REQUEST_TIMEOUT_MS,
            circuit_failure_threshold: 5,
            circuit_recovery_secs: 30,
        }
    }
}

impl AlertSettings {
    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            queue_capacity: self.queue_capacity,
            max_attempts: self.max_attempts,
            retry_base: Duration::from_millis(self.retry_base_ms),
            retry_max: Duration::from_millis(self.retry_max_ms),
        }
    }

    pub fn circuit_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.circuit_failure_threshold,
            recovery_timeout: Duration::from_secs(self.circuit_recovery_secs),
            ..CircuitBreakerConfig::default()
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Everything the service binary reads at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Hyperliquid coin names, e.g. "BTC"
    pub symbols: Vec<String>,
    pub log_level: String,
    pub log_json: bool,
    pub heartbeat_interval_secs: u64,
    pub engine: EngineConfig,
    pub feed: FeedConfig,
    pub alerts: AlertSettings,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            symbols: vec!["BTC".to_string()],
            log_level: strategies::DEFAULT_LOG_LEVEL.to_string(),
            log_json: false,
            heartbeat_interval_secs: strategies::HEARTBEAT_INTERVAL_SECS,
            engine: EngineConfig::default(),
            feed: FeedConfig::default(),
            alerts: AlertSettings::default(),
        }
    }
}

impl ServiceSettings {
    pub fn validate(&self) -> Result<()> {
        if self.symbols.is_empty() {
            return Err(StrategyError::configuration("at least one symbol is required"));
        }
        if self.heartbeat_interval_secs == 0 {
            return Err(StrategyError::configuration("heartbeat_interval_secs must be positive"));
        }
        if self.alerts.queue_capacity == 0 || self.alerts.max_attempts == 0 {
            return Err(StrategyError::configuration(
                "alert queue_capacity and max_attempts must be positive",
            ));
        }
        self.feed
            .validate()
            .map_err(|e| StrategyError::configuration(e.to_string()))?;
        self.engine.validate()
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }
}
