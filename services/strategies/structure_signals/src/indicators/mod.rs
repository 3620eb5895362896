//! Incremental technical indicators updated once per closed candle

pub mod atr;
pub mod ema;
pub mod engine;
pub mod pivots;

pub use atr::{true_range, Atr};
pub use ema::Ema;
pub use engine::{IndicatorEngine, IndicatorSnapshot};
pub use pivots::{Confirmed, PivotTracker};
