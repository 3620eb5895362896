//! # Structure Signals Shared Types
//!
//! Domain types shared by the feed adapter and the signal strategy.
//!
//! ## Design Philosophy
//!
//! - **No Precision Loss**: all prices are `rust_decimal::Decimal`
//! - **Validated Construction**: candles can only be built with consistent OHLC
//!   and a non-empty time window
//! - **Clear Boundaries**: the feed produces [`Tick`]s, everything downstream
//!   works on closed [`Candle`]s
//!
//! ## Quick Start
//!
//! ```rust
//! use types::{Candle, Tick, Timeframe};
//! use chrono::{TimeZone, Utc};
//! use rust_decimal::Decimal;
//!
//! let open_time = Utc.timestamp_opt(1_700_000_100, 0).unwrap();
//! let tick = Tick::new(Decimal::new(10125, 2), open_time);
//! let candle = Candle::from_tick(Timeframe::Exec, &tick, 300);
//! assert_eq!(candle.open, tick.price);
//! ```

pub mod direction;
pub mod errors;
pub mod market;
pub mod pivot;

pub use direction::Direction;
pub use errors::CandleError;
pub use market::{Candle, Tick, Timeframe};
pub use pivot::{Pivot, PivotKind};

/// Re-export so downstream crates agree on the decimal type
pub use rust_decimal::Decimal;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: shared types can move across tokio tasks.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<Tick>();
        require_sync::<Tick>();
        require_send::<Candle>();
        require_sync::<Candle>();
        require_send::<Pivot>();
        require_sync::<Pivot>();
        require_send::<Direction>();
        require_sync::<Direction>();
    }
}
