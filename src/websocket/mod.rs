//! Async WebSocket client for the PumpPortal trade feed.
//!
//! This module is organized by domain:
//! - [`subscription`] - Token trade subscribe/unsubscribe requests
//! - [`handler`] - Incoming frame decoding
//! - [`connection`] - Connection lifecycle and the public [`StreamManager`]

mod connection;
mod handler;
mod subscription;

use futures_util::StreamExt;
use futures_util::stream::{SplitSink, SplitStream};
use tokio::net::TcpStream;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::info;
use tungstenite::Message;

use crate::Result;

// Re-export submodule items at the module level for convenience
pub use connection::{BoardHandle, StreamManager};
pub use handler::{DecodeError, decode_frame, decode_frame_at, feed_notice};
pub use subscription::{subscribe, unsubscribe};

/// Write half of a feed WebSocket connection.
pub type WsWriter = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Read half of a feed WebSocket connection.
pub type WsReader = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Establishes a WebSocket connection to the given URL.
///
/// # Errors
///
/// Returns a [`PerpboardError`](crate::PerpboardError) if the connection or TLS handshake fails.
pub async fn connect(url: &str) -> Result<(WsWriter, WsReader)> {
    let (ws_stream, _) = connect_async(url).await?;
    info!("WebSocket handshake completed");

    Ok(ws_stream.split())
}
