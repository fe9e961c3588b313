//! Synthetic depth ladder models.
//!
//! These levels are generated for display only. They are not order-book
//! data and carry no information about real liquidity.

use serde::Serialize;

/// A single price level of the synthetic ladder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DepthLevel {
    pub price: f64,
    pub quantity: f64,
}

/// Bid and ask ladders, nearest level first on both sides.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Depth {
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
}

impl Depth {
    /// Returns `true` before the first price has been projected.
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}
