//! # Watching a pool run from the outside.
//!
//! A [`Subscribe`] implementation sees the same events the orchestrator, the workers and
//! the feedback sink publish on the bus: protocol steps (`TerminateSent`, `WorkersJoined`,
//! ...), per-item outcomes (`TaskFailed`, `RetryScheduled`, `TaskSkipped`) and sink
//! trouble (`FeedbackFailed`, `SinkCrashed`).
//!
//! The executor's listener stops forwarding at `PoolFinished` and waits for every
//! subscriber queue to drain before `perform` returns. Delivery happens off the hot
//! path: a subscriber that sleeps or does I/O never holds up a worker taking its next
//! item, nor the sink handling its next message. When its queue is full the event is
//! dropped for that subscriber and `SubscriberOverflow` is published.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use async_trait::async_trait;
//! use poolvisor::{Event, EventKind, Subscribe};
//!
//! /// Counts items that were given up on, per run.
//! #[derive(Default)]
//! struct SkippedItems(AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for SkippedItems {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::TaskSkipped {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "skipped-items" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Observer of pool events.
///
/// Handlers run on their own task. Keep them non-blocking and handle errors in place;
/// a panic is caught and turned into `SubscriberPanicked`, and the subscriber keeps
/// receiving later events.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event. Events arrive in publication order.
    async fn on_event(&self, event: &Event);

    /// Name carried by `SubscriberOverflow` and `SubscriberPanicked` events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue length before events are dropped for this subscriber (at least 1).
    ///
    /// A run publishes a handful of events per item, so a subscriber watching a large
    /// burst of failures may want more than the default 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
