//! Snapshot fan-out to the presentation layer.
//!
//! [`StatePublisher`] keeps nothing but its listener list. Each
//! [`publish`](StatePublisher::publish) call hands every listener the same
//! borrowed [`BoardSnapshot`], synchronously and in subscription order.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::Serialize;

use crate::market::{CandleAggregator, TradeTape};
use crate::models::ConnectionState;
use crate::models::candle::Candle;
use crate::models::depth::Depth;

/// Read-only view of the derived state at one point in time.
///
/// The views borrow from the state holder, so a listener that needs to
/// keep data past the callback must copy it out (`tape.to_vec()`,
/// `candles.to_vec()`, `depth.clone()`).
#[derive(Debug, Clone, Copy)]
pub struct BoardSnapshot<'a> {
    pub connection_state: ConnectionState,
    pub last_price: Option<f64>,
    pub tape: &'a TradeTape,
    pub candles: &'a CandleAggregator,
    /// Synthetic ladder; see [`crate::market::depth`].
    pub depth: &'a Depth,
    /// The candle touched by the trade that caused this snapshot, if any.
    pub updated_candle: Option<Candle>,
}

impl BoardSnapshot<'_> {
    pub fn is_connected(&self) -> bool {
        self.connection_state == ConnectionState::Connected
    }

    /// Copies the snapshot into an owned, serializable form.
    pub fn to_owned_snapshot(&self) -> OwnedSnapshot {
        OwnedSnapshot {
            connection_state: self.connection_state,
            last_price: self.last_price,
            tape: self.tape.to_vec(),
            candles: self.candles.to_vec(),
            depth: self.depth.clone(),
        }
    }
}

/// Owned copy of a [`BoardSnapshot`], e.g. for handing to a UI thread.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnedSnapshot {
    pub connection_state: ConnectionState,
    pub last_price: Option<f64>,
    pub tape: Vec<crate::models::trade::Trade>,
    pub candles: Vec<Candle>,
    pub depth: Depth,
}

type Listener = Arc<dyn Fn(&BoardSnapshot<'_>) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Delivers snapshots to subscribed listeners.
///
/// Cloning yields another handle to the same listener list.
#[derive(Clone, Default)]
pub struct StatePublisher {
    registry: Arc<Mutex<Registry>>,
}

impl StatePublisher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for every later snapshot.
    ///
    /// May be called from inside a listener; the new listener is first
    /// invoked on the next `publish`.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&BoardSnapshot<'_>) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, Arc::new(listener)));

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Calls every listener registered at the time of the call, in
    /// subscription order.
    ///
    /// The listener list is copied before the first call, so listeners may
    /// subscribe or unsubscribe while being notified; such changes apply
    /// from the next `publish`.
    pub fn publish(&self, snapshot: &BoardSnapshot<'_>) {
        let listeners: Vec<Listener> = self
            .registry
            .lock()
            .listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in listeners {
            listener(snapshot);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.registry.lock().listeners.len()
    }
}

impl std::fmt::Debug for StatePublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatePublisher")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Handle returned by [`StatePublisher::subscribe`].
///
/// Dropping the handle keeps the listener registered; call
/// [`unsubscribe`](Subscription::unsubscribe) to remove it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Removes the listener. Takes effect from the next `publish`.
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}
