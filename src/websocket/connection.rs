//! WebSocket connection lifecycle management.
//!
//! [`StreamManager`] owns at most one feed session at a time. A session is
//! a spawned task that connects, subscribes, feeds every frame through the
//! shared [`Board`], and reports close and error events as connection
//! states. An optional [`ReconnectPolicy`] brings a session back after it
//! ends on its own; without one the feed stays down.
//!
//! The board sits behind a `parking_lot::RwLock`. Mutations take the write
//! lock and then downgrade it to a read lock to notify listeners, so a
//! listener may read the board again through a [`BoardHandle`] without
//! deadlocking, and no other writer can slip in before it is notified.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::{RwLock, RwLockWriteGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tungstenite::Message as WsMessage;

use super::{WsReader, WsWriter, connect, feed_notice, subscribe, unsubscribe};
use crate::Result;
use crate::board::{Board, Change};
use crate::config::{ReconnectPolicy, validate_endpoint};
use crate::models::ConnectionState;
use crate::models::candle::Candle;
use crate::models::depth::Depth;
use crate::models::trade::Trade;
use crate::publisher::{BoardSnapshot, StatePublisher, Subscription};

/// Why a single connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// The feed closed the socket or the stream ended.
    Closed,
    /// Connecting, sending or reading failed.
    Errored,
    /// The manager cancelled the session.
    Stopped,
}

/// A running session task and the token that cancels it.
struct Session {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Public entry point for the presentation layer: start and stop the feed,
/// subscribe to snapshots, and read the current derived state.
pub struct StreamManager {
    board: BoardHandle,
    publisher: StatePublisher,
    reconnect: Option<ReconnectPolicy>,
    session: Option<Session>,
}

impl StreamManager {
    /// Creates an idle manager with an empty board and no reconnect policy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_board(Board::new(StatePublisher::new()))
    }

    /// Creates an idle manager around a prepared board.
    #[must_use]
    pub fn with_board(board: Board) -> Self {
        let publisher = board.publisher().clone();
        Self {
            board: BoardHandle {
                board: Arc::new(RwLock::new(board)),
            },
            publisher,
            reconnect: None,
            session: None,
        }
    }

    /// Enables automatic reconnection for sessions started afterwards.
    #[must_use]
    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = Some(policy);
        self
    }

    /// Connects to `endpoint` and subscribes to trades for
    /// `subscription_key`, replacing any running session.
    ///
    /// Returns once the session task is spawned; connection progress is
    /// reported through the published connection state.
    ///
    /// # Errors
    ///
    /// Returns [`PerpboardError::Config`](crate::PerpboardError::Config)
    /// without touching the current session if either argument is blank or
    /// the endpoint is not a WebSocket URL.
    pub async fn start(&mut self, endpoint: &str, subscription_key: &str) -> Result<()> {
        validate_endpoint(endpoint, subscription_key)?;

        self.stop().await;

        let cancel = CancellationToken::new();
        commit(&self.board.board, |b| b.record_state(ConnectionState::Connecting));

        let task = tokio::spawn(run_session(
            endpoint.trim().to_string(),
            subscription_key.trim().to_string(),
            Arc::clone(&self.board.board),
            cancel.clone(),
            self.reconnect.clone(),
        ));
        self.session = Some(Session { cancel, task });

        Ok(())
    }

    /// Stops the running session, if any, and waits until its transport
    /// is released.
    ///
    /// Safe to call at any time, including while connecting, and any
    /// number of times. Leaves the state `Closed` after a session and
    /// `Idle` if none was ever started.
    pub async fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        session.cancel.cancel();
        if let Err(e) = session.task.await {
            error!("Feed session task failed: {e}");
        }
        commit(&self.board.board, |b| b.record_state(ConnectionState::Closed));
        info!("Feed stopped");
    }

    /// Registers a snapshot listener.
    ///
    /// Listeners run synchronously on the session task. They may read the
    /// board through a [`BoardHandle`] from [`handle`](Self::handle), which
    /// shows the same state as the snapshot they were given.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&BoardSnapshot<'_>) + Send + Sync + 'static,
    {
        self.publisher.subscribe(listener)
    }

    /// Returns a cloneable read-only handle to the board.
    pub fn handle(&self) -> BoardHandle {
        self.board.clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.board.state()
    }

    pub fn is_connected(&self) -> bool {
        self.board.is_connected()
    }

    pub fn last_price(&self) -> Option<f64> {
        self.board.last_price()
    }

    /// Recent trades, newest first.
    pub fn tape(&self) -> Vec<Trade> {
        self.board.tape()
    }

    /// Candle series, oldest first.
    pub fn candles(&self) -> Vec<Candle> {
        self.board.candles()
    }

    pub fn latest_candle(&self) -> Option<Candle> {
        self.board.latest_candle()
    }

    /// Synthetic ladder around the last price; not real liquidity.
    pub fn depth(&self) -> Depth {
        self.board.depth()
    }

    /// Runs `f` against a consistent snapshot of the whole board.
    pub fn with_snapshot<T>(&self, f: impl FnOnce(&BoardSnapshot<'_>) -> T) -> T {
        self.board.with_snapshot(f)
    }
}

/// Read-only access to a manager's board that can be moved into
/// listeners and other tasks.
///
/// Reads take a recursive read lock, so they are safe inside a listener
/// callback.
#[derive(Clone)]
pub struct BoardHandle {
    board: Arc<RwLock<Board>>,
}

impl BoardHandle {
    pub fn state(&self) -> ConnectionState {
        self.board.read_recursive().state()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub fn last_price(&self) -> Option<f64> {
        self.board.read_recursive().last_price()
    }

    /// Recent trades, newest first.
    pub fn tape(&self) -> Vec<Trade> {
        self.board.read_recursive().tape().to_vec()
    }

    /// Candle series, oldest first.
    pub fn candles(&self) -> Vec<Candle> {
        self.board.read_recursive().candles().to_vec()
    }

    pub fn latest_candle(&self) -> Option<Candle> {
        self.board.read_recursive().candles().latest().copied()
    }

    /// Synthetic ladder around the last price; not real liquidity.
    pub fn depth(&self) -> Depth {
        self.board.read_recursive().depth().clone()
    }

    /// Runs `f` against a consistent snapshot of the whole board.
    pub fn with_snapshot<T>(&self, f: impl FnOnce(&BoardSnapshot<'_>) -> T) -> T {
        let board = self.board.read_recursive();
        f(&board.snapshot())
    }
}

impl std::fmt::Debug for BoardHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardHandle")
            .field("state", &self.state())
            .finish()
    }
}

impl Default for StreamManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StreamManager {
    fn drop(&mut self) {
        if let Some(session) = &self.session {
            session.cancel.cancel();
        }
    }
}

/// Runs connections back to back until cancelled, or until one ends and
/// the reconnect policy (if any) declines another attempt.
async fn run_session(
    url: String,
    key: String,
    board: Arc<RwLock<Board>>,
    cancel: CancellationToken,
    reconnect: Option<ReconnectPolicy>,
) {
    let initial_backoff = reconnect
        .as_ref()
        .map_or(Duration::ZERO, |p| p.initial_backoff);
    let mut backoff = initial_backoff;
    let mut attempts: u32 = 0;

    loop {
        let (end, was_connected) = run_connection(&url, &key, &board, &cancel).await;
        if end == SessionEnd::Stopped {
            debug!("Feed session cancelled");
            return;
        }

        let Some(policy) = reconnect.as_ref() else {
            return;
        };

        // Reset backoff on a connection that got as far as subscribing
        if was_connected {
            backoff = initial_backoff;
            attempts = 0;
        }

        if !policy.allows(attempts) {
            warn!(attempts, "Reconnect attempts exhausted, feed stays down");
            return;
        }
        attempts += 1;

        info!(
            backoff_ms = backoff.as_millis() as u64,
            attempt = attempts,
            "Backing off before reconnect"
        );
        tokio::select! {
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(backoff) => {}
        }
        backoff = policy.next_backoff(backoff);

        if !update(&board, &cancel, |b| b.record_state(ConnectionState::Connecting)) {
            return;
        }
    }
}

/// Drives one connection from connect to close. Also reports whether the
/// connection reached `Connected`.
async fn run_connection(
    url: &str,
    key: &str,
    board: &RwLock<Board>,
    cancel: &CancellationToken,
) -> (SessionEnd, bool) {
    info!(url = %url, "Connecting to WebSocket");
    let connected = tokio::select! {
        () = cancel.cancelled() => return (SessionEnd::Stopped, false),
        result = connect(url) => result,
    };

    let (mut write, read) = match connected {
        Ok(pair) => pair,
        Err(e) => {
            error!("Connection failed: {e}");
            return (finish(board, cancel, SessionEnd::Errored), false);
        }
    };

    let keys = vec![key.to_string()];
    if let Err(e) = subscribe(&mut write, &keys).await {
        error!("Subscribe failed: {e}");
        return (finish(board, cancel, SessionEnd::Errored), false);
    }

    if !update(board, cancel, |b| b.record_state(ConnectionState::Connected)) {
        release(&mut write, &keys).await;
        return (SessionEnd::Stopped, false);
    }
    info!("WebSocket connected and subscribed");

    let end = read_loop(read, board, cancel).await;
    if end == SessionEnd::Stopped {
        release(&mut write, &keys).await;
    }

    (end, true)
}

/// Feeds frames into the board until the connection ends or the session
/// is cancelled.
async fn read_loop(
    mut read: WsReader,
    board: &RwLock<Board>,
    cancel: &CancellationToken,
) -> SessionEnd {
    loop {
        tokio::select! {
            () = cancel.cancelled() => return SessionEnd::Stopped,

            msg = read.next() => {
                match msg {
                    Some(Ok(WsMessage::Text(text))) => {
                        let applied = update(board, cancel, |b| match b.record_frame(text.as_str()) {
                            Ok(candle) => Change::Trade(candle),
                            Err(e) => {
                                if e.is_ignorable() {
                                    if let Some(notice) = feed_notice(text.as_str()) {
                                        info!(notice = %notice.message, "Feed notice");
                                    }
                                }
                                Change::Unchanged
                            }
                        });
                        if !applied {
                            return SessionEnd::Stopped;
                        }
                    }
                    Some(Ok(WsMessage::Close(frame))) => {
                        info!(?frame, "Feed closed the connection");
                        return finish(board, cancel, SessionEnd::Closed);
                    }
                    Some(Ok(_)) => {} // Binary/Ping/Pong frames
                    Some(Err(e)) => {
                        warn!("WebSocket error: {e}");
                        return finish(board, cancel, SessionEnd::Errored);
                    }
                    None => {
                        warn!("WebSocket stream ended");
                        return finish(board, cancel, SessionEnd::Closed);
                    }
                }
            }
        }
    }
}

/// Runs `f` on the board unless the session has been cancelled.
///
/// The cancellation check happens under the write lock, so once
/// [`StreamManager::stop`] has cancelled the token no later mutation from
/// this session can land.
fn update(
    board: &RwLock<Board>,
    cancel: &CancellationToken,
    f: impl FnOnce(&mut Board) -> Change,
) -> bool {
    let guard = board.write();
    if cancel.is_cancelled() {
        return false;
    }
    apply(guard, f);
    true
}

/// Applies `f` under the write lock, then notifies listeners under the
/// downgraded read lock.
fn commit(board: &RwLock<Board>, f: impl FnOnce(&mut Board) -> Change) {
    apply(board.write(), f);
}

fn apply(mut guard: RwLockWriteGuard<'_, Board>, f: impl FnOnce(&mut Board) -> Change) {
    let change = f(&mut guard);
    RwLockWriteGuard::downgrade(guard).publish(change);
}

/// Publishes the terminal state for `end`, unless cancelled meanwhile.
fn finish(board: &RwLock<Board>, cancel: &CancellationToken, end: SessionEnd) -> SessionEnd {
    let state = match end {
        SessionEnd::Closed => ConnectionState::Closed,
        SessionEnd::Errored => ConnectionState::Errored,
        SessionEnd::Stopped => return end,
    };

    if update(board, cancel, |b| b.record_state(state)) {
        end
    } else {
        SessionEnd::Stopped
    }
}

/// Best-effort orderly shutdown: unsubscribe, then send a close frame.
async fn release(write: &mut WsWriter, keys: &[String]) {
    if let Err(e) = unsubscribe(write, keys).await {
        debug!("Unsubscribe on stop failed: {e}");
    }
    if let Err(e) = write.close().await {
        debug!("Close on stop failed: {e}");
    }
}
