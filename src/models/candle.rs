//! OHLC candlestick model.

use serde::{Deserialize, Serialize};

/// A single OHLC bar, serialized in the `{time, open, high, low, close}`
/// shape charting widgets consume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Start of the bucket in seconds since the Unix epoch.
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    /// Opens a new candle where all four prices equal `price`.
    #[must_use]
    pub fn open_at(time: i64, price: f64) -> Self {
        Self {
            time,
            open: price,
            high: price,
            low: price,
            close: price,
        }
    }

    /// Folds one more trade price into the candle.
    pub fn update(&mut self, price: f64) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.close = price;
    }
}
