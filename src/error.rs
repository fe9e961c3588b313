//! Crate-level error types.
//!
//! [`PerpboardError`] unifies every error source (configuration, WebSocket,
//! JSON, frame decoding) behind a single enum so callers can match on the
//! variant they care about while still using the `?` operator for easy
//! propagation.

use crate::websocket::DecodeError;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PerpboardError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum PerpboardError {
    /// Missing or invalid configuration, including bad arguments to
    /// [`StreamManager::start`](crate::websocket::StreamManager::start).
    #[error("configuration error: {0}")]
    Config(String),

    /// A WebSocket operation (connect, send, receive) failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// An inbound feed frame could not be turned into a trade.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}
