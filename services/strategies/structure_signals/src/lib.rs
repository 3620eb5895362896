//! # Structure Signals Strategy
//!
//! Detects break of structure -> retest -> acceptance setups on live mid
//! prices and tracks the resulting positions to TP1/TP2/STOP.
//!
//! Data flows one way per symbol:
//!
//! ```text
//! Tick -> CandleAggregator -> IndicatorEngine (exec, bias)
//!      -> PatternMachine -> Position -> EngineEvent -> AlertDispatcher
//! ```
//!
//! [`SignalEngine`] is the synchronous core and has no I/O. [`SymbolRunner`]
//! drives one engine from a tick channel inside a tokio task.

pub mod candles;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod indicators;
pub mod logging;
pub mod metrics;
pub mod pattern;
pub mod position;
pub mod runner;

pub use candles::{CandleAggregator, DropReason, IngestOutcome};
pub use config::{AlertSettings, EngineConfig, PriceTrigger, ServiceSettings};
pub use engine::SignalEngine;
pub use error::{Result, StrategyError};
pub use events::{EngineEvent, StopReason, TakeProfitLevel};
pub use indicators::{IndicatorEngine, IndicatorSnapshot};
pub use metrics::{EngineMetrics, EngineStats};
pub use pattern::{PatternCounters, PatternMachine, PatternPhase, Setup, Signal};
pub use position::Position;
pub use runner::SymbolRunner;
