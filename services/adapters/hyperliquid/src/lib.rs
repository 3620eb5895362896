//! # Hyperliquid Mids Adapter
//!
//! Subscribes to the Hyperliquid `allMids` websocket channel and fans mid
//! prices out to one bounded [`tokio::sync::mpsc`] channel per subscribed
//! symbol. Each frame is timestamped at receipt.
//!
//! ```rust,no_run
//! use hyperliquid_adapter::{FeedConfig, MidsFeed};
//! use tokio::sync::watch;
//!
//! # async fn demo() -> hyperliquid_adapter::Result<()> {
//! let mut feed = MidsFeed::new(FeedConfig::default())?;
//! let mut btc = feed.subscribe("BTC");
//! let (_shutdown_tx, shutdown_rx) = watch::channel(false);
//!
//! tokio::spawn(feed.run(shutdown_rx));
//! while let Some(tick) = btc.recv().await {
//!     println!("{} @ {}", tick.price, tick.timestamp);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod feed;
pub mod messages;
pub mod router;

pub use config::FeedConfig;
pub use error::{AdapterError, Result};
pub use feed::{ConnectionState, MidsFeed};
pub use router::{FeedMetrics, FeedStats, TickRouter};
