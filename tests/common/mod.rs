//! Shared test utilities and constants.
#![allow(dead_code)]

use std::time::Duration;

use futures_util::StreamExt;
use perpboard::StreamManager;
use perpboard::publisher::OwnedSnapshot;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{WebSocketStream, accept_async};
use tungstenite::Message;

/// PumpPortal public WebSocket endpoint URL.
pub const PUMPPORTAL_WS_URL: &str = "wss://pumpportal.fun/api/data";

/// Token mint used as the subscription key in tests.
pub const TEST_MINT: &str = "9BB6NFEcjBCtnNLFko2FqVQBq8HHM13kCyYcdQbgpump";

/// How long a test waits for an expected snapshot.
pub const WAIT: Duration = Duration::from_secs(5);

/// Server side of a test connection.
pub type ServerSocket = WebSocketStream<TcpStream>;

/// Binds a local feed listener and returns it with its `ws://` URL.
pub async fn local_feed() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind local listener");
    let url = format!(
        "ws://{}",
        listener.local_addr().expect("listener has no address")
    );
    (listener, url)
}

/// Accepts one client and completes the WebSocket handshake.
pub async fn accept(listener: &TcpListener) -> ServerSocket {
    let (stream, _) = tokio::time::timeout(WAIT, listener.accept())
        .await
        .expect("timeout waiting for client")
        .expect("failed to accept client");
    accept_async(stream).await.expect("handshake failed")
}

/// Reads the next text frame from the client as JSON.
pub async fn next_json(socket: &mut ServerSocket) -> serde_json::Value {
    loop {
        let msg = tokio::time::timeout(WAIT, socket.next())
            .await
            .expect("timeout waiting for client frame");
        match msg {
            Some(Ok(Message::Text(text))) => {
                return serde_json::from_str(text.as_str()).expect("client sent invalid JSON");
            }
            Some(Ok(_)) => continue,
            other => panic!("expected a text frame, got {other:?}"),
        }
    }
}

/// Builds a `tokenTrade` frame.
pub fn trade_frame(ts: i64, price: f64, side: &str) -> String {
    serde_json::json!({
        "channel": "tokenTrade",
        "data": { "ts": ts, "price": price, "size": 100.0, "side": side, "tx": format!("sig-{ts}") }
    })
    .to_string()
}

/// Forwards a copy of every published snapshot to a channel.
pub fn watch(manager: &StreamManager) -> mpsc::UnboundedReceiver<OwnedSnapshot> {
    let (tx, rx) = mpsc::unbounded_channel();
    // Listener stays registered for the manager's lifetime.
    let _ = manager.subscribe(move |snapshot| {
        let _ = tx.send(snapshot.to_owned_snapshot());
    });
    rx
}

/// Waits for the first snapshot matching `predicate`.
pub async fn wait_until<F>(rx: &mut mpsc::UnboundedReceiver<OwnedSnapshot>, predicate: F) -> OwnedSnapshot
where
    F: Fn(&OwnedSnapshot) -> bool,
{
    tokio::time::timeout(WAIT, async {
        while let Some(snapshot) = rx.recv().await {
            if predicate(&snapshot) {
                return snapshot;
            }
        }
        panic!("snapshot channel closed");
    })
    .await
    .expect("timeout waiting for snapshot")
}
