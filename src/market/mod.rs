//! Derived market state built from the trade feed.
//!
//! - [`tape`] - bounded, newest-first trade history
//! - [`candles`] - fixed-width OHLC buckets
//! - [`depth`] - synthetic bid/ask ladder for display

pub mod candles;
pub mod depth;
pub mod tape;

pub use candles::{CANDLE_INTERVAL_SECS, CandleAggregator};
pub use depth::{DEPTH_LEVELS, DepthProjector, project};
pub use tape::{TAPE_CAPACITY, TradeTape};
