//! Error types for candle construction

use thiserror::Error;

/// Errors raised when a candle would violate its OHLC or time-window invariants
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CandleError {
    /// Window is empty or reversed
    #[error("Invalid candle window: open_time {open_time} must be before close_time {close_time}")]
    InvalidWindow { open_time: String, close_time: String },

    /// open/close outside the high/low range
    #[error("Inconsistent OHLC: low {low} <= open {open}, close {close} <= high {high} violated")]
    InconsistentOhlc {
        open: String,
        high: String,
        low: String,
        close: String,
    },
}
