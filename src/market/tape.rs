//! Bounded trade tape.

use std::collections::VecDeque;

use crate::models::trade::Trade;

/// Maximum number of trades kept on the tape.
pub const TAPE_CAPACITY: usize = 250;

/// Most-recent-first trade history capped at a fixed length.
///
/// Index 0 is always the newest trade. Pushing past the cap drops the
/// oldest entries from the tail.
#[derive(Debug, Clone)]
pub struct TradeTape {
    trades: VecDeque<Trade>,
    capacity: usize,
}

impl TradeTape {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(TAPE_CAPACITY)
    }

    /// Creates a tape holding at most `capacity` trades (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            trades: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Puts `trade` at the front, evicting from the tail past capacity.
    pub fn push(&mut self, trade: Trade) {
        self.trades.push_front(trade);
        self.trades.truncate(self.capacity);
    }

    /// Iterates newest first.
    pub fn iter(&self) -> impl Iterator<Item = &Trade> {
        self.trades.iter()
    }

    /// Returns the `n` newest trades, newest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Trade> {
        self.trades.iter().take(n)
    }

    pub fn get(&self, index: usize) -> Option<&Trade> {
        self.trades.get(index)
    }

    /// The newest trade, if any.
    pub fn front(&self) -> Option<&Trade> {
        self.trades.front()
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Copies the tape out, newest first.
    pub fn to_vec(&self) -> Vec<Trade> {
        self.trades.iter().cloned().collect()
    }
}

impl Default for TradeTape {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::trade::Side;

    fn trade(ts: i64) -> Trade {
        Trade::new(ts, 1.0, 10.0, Side::Buy, format!("tx-{ts}"))
    }

    #[test]
    fn push_puts_newest_first() {
        let mut tape = TradeTape::new();
        tape.push(trade(1));
        tape.push(trade(2));

        assert_eq!(tape.len(), 2);
        assert_eq!(tape.front().map(Trade::timestamp), Some(2));
        assert_eq!(tape.get(1).map(Trade::timestamp), Some(1));
    }

    #[test]
    fn evicts_oldest_past_capacity() {
        let mut tape = TradeTape::new();
        for ts in 0..=TAPE_CAPACITY as i64 {
            tape.push(trade(ts));
            assert!(tape.len() <= TAPE_CAPACITY);
            assert_eq!(tape.front().map(Trade::timestamp), Some(ts));
        }

        assert_eq!(tape.len(), TAPE_CAPACITY);
        let timestamps: Vec<i64> = tape.iter().map(Trade::timestamp).collect();
        let expected: Vec<i64> = (1..=TAPE_CAPACITY as i64).rev().collect();
        assert_eq!(timestamps, expected);
    }

    #[test]
    fn recent_limits_rows() {
        let mut tape = TradeTape::with_capacity(5);
        for ts in 0..5 {
            tape.push(trade(ts));
        }

        let rows: Vec<i64> = tape.recent(3).map(Trade::timestamp).collect();
        assert_eq!(rows, vec![4, 3, 2]);
        assert_eq!(tape.recent(10).count(), 5);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut tape = TradeTape::with_capacity(0);
        tape.push(trade(1));
        tape.push(trade(2));

        assert_eq!(tape.capacity(), 1);
        assert_eq!(tape.to_vec(), vec![trade(2)]);
    }
}
