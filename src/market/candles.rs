//! Incremental OHLC aggregation over fixed-width time buckets.

use std::collections::BTreeMap;

use tracing::debug;

use crate::models::candle::Candle;
use crate::models::trade::Trade;

/// Default bucket width: one real-time minute.
pub const CANDLE_INTERVAL_SECS: i64 = 60;

/// Maps bucket start (epoch seconds) to its candle.
///
/// The series is append-only: candles are created on the first trade in a
/// bucket and updated in place afterwards, never removed. Trades older
/// than the newest bucket still land in their own historical bucket.
#[derive(Debug, Clone)]
pub struct CandleAggregator {
    interval_secs: i64,
    candles: BTreeMap<i64, Candle>,
}

impl CandleAggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::with_interval(CANDLE_INTERVAL_SECS)
    }

    /// Creates an aggregator with a custom bucket width (at least 1 s).
    #[must_use]
    pub fn with_interval(interval_secs: i64) -> Self {
        Self {
            interval_secs: interval_secs.max(1),
            candles: BTreeMap::new(),
        }
    }

    /// Start of the bucket containing `timestamp_ms`, in epoch seconds.
    pub fn bucket_start(&self, timestamp_ms: i64) -> i64 {
        let secs = timestamp_ms.div_euclid(1_000);
        secs.div_euclid(self.interval_secs) * self.interval_secs
    }

    /// Folds `trade` into its bucket and returns the affected candle.
    pub fn ingest(&mut self, trade: &Trade) -> Candle {
        let bucket = self.bucket_start(trade.timestamp());
        let price = trade.price();

        let candle = self
            .candles
            .entry(bucket)
            .and_modify(|candle| candle.update(price))
            .or_insert_with(|| {
                debug!(bucket, price, "Opened candle");
                Candle::open_at(bucket, price)
            });

        *candle
    }

    /// Iterates candles by bucket start, oldest first.
    pub fn series(&self) -> impl Iterator<Item = &Candle> {
        self.candles.values()
    }

    pub fn get(&self, bucket_start: i64) -> Option<&Candle> {
        self.candles.get(&bucket_start)
    }

    /// The candle with the greatest bucket start.
    pub fn latest(&self) -> Option<&Candle> {
        self.candles.values().next_back()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn interval_secs(&self) -> i64 {
        self.interval_secs
    }

    /// Copies the series out, oldest first.
    pub fn to_vec(&self) -> Vec<Candle> {
        self.candles.values().copied().collect()
    }
}

impl Default for CandleAggregator {
    fn default() -> Self {
        Self::new()
    }
}
