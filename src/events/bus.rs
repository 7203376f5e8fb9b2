//! # Event bus for broadcasting pool events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`]. The executor, every
//! worker and the feedback sink publish into it; a single listener task inside the
//! executor forwards events to the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ```text
//! Publishers (many):                Listener (one):
//!   Executor ──┐
//!   Worker 1 ──┼─────► Bus ───────► event listener ────► SubscriberSet
//!   Worker N ──┤  (broadcast chan)   (in Executor)
//!   Sink     ──┘
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never waits.
//! - **Bounded ring buffer**: receivers that fall more than `capacity` behind observe
//!   `RecvError::Lagged(n)` and skip the `n` oldest events.
//! - **No persistence**: events published with no receiver are dropped.
//! - **Closing**: once the last `Bus` clone is dropped, receivers drain and see `Closed`.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for pool events. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus; capacity is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers; dropped if there are none.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver that observes events sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
