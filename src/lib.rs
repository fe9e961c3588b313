//! Live trade board core for a PumpPortal token feed.
//!
//! Ingests the `tokenTrade` WebSocket channel, keeps a bounded trade tape,
//! one-minute OHLC candles and a synthetic depth ladder, and publishes
//! snapshots of that state to presentation-layer listeners.

pub mod board;
pub mod config;
pub mod error;
pub mod market;
pub mod models;
pub mod publisher;
pub mod websocket;

pub use board::Board;
pub use error::{PerpboardError, Result};
pub use publisher::{BoardSnapshot, StatePublisher, Subscription};
pub use websocket::{BoardHandle, StreamManager};
