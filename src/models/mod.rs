//! Shared models for the PumpPortal WebSocket feed.
//!
//! Contains channel and method definitions, subscription requests, the
//! feed's acknowledgement notice, and the connection state published to
//! the presentation layer.

pub mod candle;
pub mod depth;
pub mod trade;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Feed channels this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Per-token trade events (wire name: `"tokenTrade"`).
    TokenTrade,
}

impl Channel {
    /// Returns the wire-format channel name used by the feed.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::TokenTrade => "tokenTrade",
        }
    }
}

/// Request methods accepted by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    SubscribeTokenTrade,
    UnsubscribeTokenTrade,
}

impl Method {
    /// Returns the wire-format method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::SubscribeTokenTrade => "subscribeTokenTrade",
            Method::UnsubscribeTokenTrade => "unsubscribeTokenTrade",
        }
    }
}

/// A `subscribeTokenTrade` request, sent once right after the socket opens.
#[derive(Debug, Serialize)]
pub struct SubscribeRequest {
    pub method: String,
    pub keys: Vec<String>,
}

impl SubscribeRequest {
    /// Builds a trade subscription for the given token mints.
    #[must_use]
    pub fn new(keys: &[String]) -> Self {
        Self {
            method: Method::SubscribeTokenTrade.as_str().to_string(),
            keys: keys.to_vec(),
        }
    }
}

/// An `unsubscribeTokenTrade` request, sent on an orderly stop.
#[derive(Debug, Serialize)]
pub struct UnsubscribeRequest {
    pub method: String,
    pub keys: Vec<String>,
}

impl UnsubscribeRequest {
    /// Builds a trade unsubscription for the given token mints.
    #[must_use]
    pub fn new(keys: &[String]) -> Self {
        Self {
            method: Method::UnsubscribeTokenTrade.as_str().to_string(),
            keys: keys.to_vec(),
        }
    }
}

/// Plain-text notice the feed sends in reply to requests, e.g.
/// `{"message":"Successfully subscribed to keys."}`.
#[derive(Debug, Deserialize)]
pub struct FeedNotice {
    pub message: String,
}

/// Lifecycle of the feed connection as seen by observers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Connected,
    Closed,
    Errored,
}

impl ConnectionState {
    /// Returns the lowercase name used in logs and serialized snapshots.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Closed => "closed",
            ConnectionState::Errored => "errored",
        }
    }

    /// Returns `true` once a session has ended, by close or by error.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConnectionState::Closed | ConnectionState::Errored)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
