//! Derived board state and the single path that mutates it.
//!
//! [`Board`] owns the tape, the candle series, the synthetic depth and the
//! connection state. Every mutation ends with a snapshot published to the
//! board's [`StatePublisher`]. Applying one trade (tape, candle, depth,
//! publish) happens inside one `&mut self` call, so a caller that guards
//! the board with a lock gets per-frame atomicity for free. The crate's
//! session task uses the `record_*` halves instead, so it can publish
//! after downgrading its write lock.

use tracing::{debug, info, warn};

use crate::market::{CandleAggregator, DepthProjector, TradeTape};
use crate::models::ConnectionState;
use crate::models::candle::Candle;
use crate::models::depth::Depth;
use crate::models::trade::Trade;
use crate::publisher::{BoardSnapshot, StatePublisher};
use crate::websocket::{DecodeError, decode_frame};

/// A mutation that listeners have not been told about yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Change {
    Unchanged,
    State,
    Trade(Candle),
}

/// Everything the presentation layer can see, plus its publisher.
#[derive(Debug)]
pub struct Board {
    state: ConnectionState,
    last_price: Option<f64>,
    tape: TradeTape,
    candles: CandleAggregator,
    projector: DepthProjector,
    depth: Depth,
    publisher: StatePublisher,
}

impl Board {
    /// Creates an idle board with default capacities and an entropy-seeded
    /// depth projector.
    #[must_use]
    pub fn new(publisher: StatePublisher) -> Self {
        Self::with_parts(
            publisher,
            TradeTape::new(),
            CandleAggregator::new(),
            DepthProjector::new(),
        )
    }

    /// Creates an idle board from explicit components, e.g. a seeded
    /// projector in tests or a wider candle interval.
    #[must_use]
    pub fn with_parts(
        publisher: StatePublisher,
        tape: TradeTape,
        candles: CandleAggregator,
        projector: DepthProjector,
    ) -> Self {
        Self {
            state: ConnectionState::Idle,
            last_price: None,
            tape,
            candles,
            projector,
            depth: Depth::default(),
            publisher,
        }
    }

    /// Decodes one raw frame and applies it.
    ///
    /// Returns the updated candle, or the decode error after logging it.
    /// A failed frame leaves the board untouched.
    ///
    /// # Errors
    ///
    /// Returns the [`DecodeError`] that caused the frame to be dropped.
    pub fn apply_frame(&mut self, text: &str) -> Result<Candle, DecodeError> {
        let candle = self.record_frame(text)?;
        self.publish(Change::Trade(candle));
        Ok(candle)
    }

    /// Applies a decoded trade: tape, then candle, then depth, then publish.
    pub fn apply_trade(&mut self, trade: Trade) -> Candle {
        let candle = self.record_trade(trade);
        self.publish(Change::Trade(candle));
        candle
    }

    /// Moves to `state` and publishes, unless already there.
    pub fn set_state(&mut self, state: ConnectionState) {
        let change = self.record_state(state);
        self.publish(change);
    }

    /// [`apply_frame`](Self::apply_frame) without the publish.
    pub(crate) fn record_frame(&mut self, text: &str) -> Result<Candle, DecodeError> {
        match decode_frame(text) {
            Ok(trade) => Ok(self.record_trade(trade)),
            Err(e) if e.is_ignorable() => {
                debug!(error = %e, "Ignoring non-trade frame");
                Err(e)
            }
            Err(e) => {
                warn!(error = %e, "Dropping undecodable frame");
                Err(e)
            }
        }
    }

    pub(crate) fn record_trade(&mut self, trade: Trade) -> Candle {
        let price = trade.price();
        debug!(
            ts = trade.timestamp(),
            price,
            size = trade.size(),
            side = %trade.side(),
            tx = trade.tx_id(),
            "Trade"
        );

        self.last_price = Some(price);
        self.tape.push(trade.clone());
        let candle = self.candles.ingest(&trade);
        self.depth = self.projector.project(price);
        candle
    }

    pub(crate) fn record_state(&mut self, state: ConnectionState) -> Change {
        if self.state == state {
            return Change::Unchanged;
        }
        info!(from = %self.state, to = %state, "Connection state changed");
        self.state = state;
        Change::State
    }

    /// Notifies listeners of `change`; [`Change::Unchanged`] is a no-op.
    pub(crate) fn publish(&self, change: Change) {
        let updated_candle = match change {
            Change::Unchanged => return,
            Change::State => None,
            Change::Trade(candle) => Some(candle),
        };
        let snapshot = self.snapshot_with(updated_candle);
        self.publisher.publish(&snapshot);
    }

    fn snapshot_with(&self, updated_candle: Option<Candle>) -> BoardSnapshot<'_> {
        BoardSnapshot {
            connection_state: self.state,
            last_price: self.last_price,
            tape: &self.tape,
            candles: &self.candles,
            depth: &self.depth,
            updated_candle,
        }
    }

    /// Current state as a borrowed snapshot.
    pub fn snapshot(&self) -> BoardSnapshot<'_> {
        self.snapshot_with(None)
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn last_price(&self) -> Option<f64> {
        self.last_price
    }

    pub fn tape(&self) -> &TradeTape {
        &self.tape
    }

    pub fn candles(&self) -> &CandleAggregator {
        &self.candles
    }

    /// Synthetic ladder around the last price; not real liquidity.
    pub fn depth(&self) -> &Depth {
        &self.depth
    }

    pub fn publisher(&self) -> &StatePublisher {
        &self.publisher
    }
}
