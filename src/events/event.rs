//! # Lifecycle events emitted by the executor, workers and the feedback sink.
//!
//! The [`EventKind`] enum classifies events into four groups:
//! - **Pool protocol**: the orchestrator's linear steps (start, feed, terminate, join)
//! - **Workers**: start/stop/crash and per-item failures, timeouts and retries
//! - **Feedback sink**: start/stop and handler failures
//! - **Subscribers**: overflow and panics inside the fan-out itself
//!
//! ## Ordering guarantees
//! Each event carries a process-wide sequence number (`seq`) that increases
//! monotonically. Use it to restore the order in which things happened, e.g. to check
//! that `FeedbackTerminateSent` follows every `WorkerStopped`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use poolvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskFailed)
//!     .with_worker(2)
//!     .with_attempt(1)
//!     .with_reason("boom")
//!     .with_timeout(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::TaskFailed);
//! assert_eq!(ev.worker, Some(2));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of pool events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Pool protocol ===
    /// `perform` started.
    ///
    /// Sets: `count` = number of workers.
    PoolStarting,

    /// The task source ran out of items.
    ///
    /// Sets: `count` = items sent to the input channel.
    SourceExhausted,

    /// The task source yielded an error; feeding stopped.
    ///
    /// Sets: `count` = items sent before the error, `reason`.
    SourceFailed,

    /// Termination markers were sent to the input channel.
    ///
    /// Sets: `count` = markers sent (always equal to the number of workers).
    TerminateSent,

    /// Every worker has been joined.
    ///
    /// Sets: `count` = workers joined.
    WorkersJoined,

    /// The single termination marker was sent to the feedback channel.
    FeedbackTerminateSent,

    /// The feedback sink did not finish within the grace period.
    ///
    /// Sets: `timeout_ms` = grace.
    GraceExceeded,

    /// Last event of a run. The executor's listener stops forwarding after it.
    ///
    /// Sets: `count` = items fed.
    PoolFinished,

    // === Workers ===
    /// A worker began pulling from the input channel.
    ///
    /// Sets: `worker`.
    WorkerStarted,

    /// A worker took its termination marker and exited.
    ///
    /// Sets: `worker`, `count` = items processed successfully.
    WorkerStopped,

    /// A worker exited without taking a marker (failure policy, fatal error or panic).
    ///
    /// Sets: `worker`, `reason`.
    WorkerCrashed,

    /// One attempt at an item failed.
    ///
    /// Sets: `worker`, `attempt`, `reason`.
    TaskFailed,

    /// One attempt exceeded the per-item timeout (followed by `TaskFailed`).
    ///
    /// Sets: `worker`, `attempt`, `timeout_ms`.
    TimeoutHit,

    /// The same item will be retried after a delay.
    ///
    /// Sets: `worker`, `attempt` (the failed one), `delay_ms`, `reason`.
    RetryScheduled,

    /// An item was given up on; the worker moves to the next one.
    ///
    /// Sets: `worker`, `attempt` (last one), `reason`.
    TaskSkipped,

    // === Feedback sink ===
    /// The feedback sink began pulling from the feedback channel.
    SinkStarted,

    /// The feedback sink took its termination marker and exited.
    ///
    /// Sets: `count` = messages handled successfully.
    SinkStopped,

    /// The feedback handler failed or panicked on one message; the sink continues.
    ///
    /// Sets: `reason`.
    FeedbackFailed,

    /// The feedback sink task died (aborted or panicked outside the handler) and
    /// could not be joined.
    ///
    /// Sets: `reason`.
    SinkCrashed,

    // === Subscribers ===
    /// A subscriber dropped an event (queue full or worker gone).
    ///
    /// Sets: `name` = subscriber, `reason`.
    SubscriberOverflow,

    /// A subscriber panicked while handling an event.
    ///
    /// Sets: `name` = subscriber, `reason` = panic info.
    SubscriberPanicked,
}

/// Pool event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Worker index (`0..workers`), if applicable.
    pub worker: Option<u32>,
    /// Attempt number for the current item (starting from 1).
    pub attempt: Option<u32>,
    /// Counter attached to protocol events (workers, items, markers).
    pub count: Option<u64>,
    /// Per-item timeout or grace in milliseconds.
    pub timeout_ms: Option<u32>,
    /// Retry delay in milliseconds.
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Component name (subscriber events).
    pub name: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            worker: None,
            attempt: None,
            count: None,
            timeout_ms: None,
            delay_ms: None,
            reason: None,
            name: None,
        }
    }

    /// Attaches a worker index.
    #[inline]
    pub fn with_worker(mut self, worker: usize) -> Self {
        self.worker = Some(worker.min(u32::MAX as usize) as u32);
        self
    }

    /// Attaches an attempt number.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a counter.
    #[inline]
    pub fn with_count(mut self, n: u64) -> Self {
        self.count = Some(n);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a component name.
    #[inline]
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(millis(d));
        self
    }

    /// Attaches a retry delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(millis(d));
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_name(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_name(subscriber)
            .with_reason(info)
    }

    /// Returns `true` for events produced by the subscriber fan-out itself.
    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

fn millis(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}
