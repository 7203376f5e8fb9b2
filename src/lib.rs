//! # poolvisor
//!
//! **Poolvisor** is a parallel task executor for Rust.
//!
//! A fixed number of workers compete for items on one shared input channel, push
//! zero-or-more feedback messages each, and a single feedback sink interprets those
//! messages one at a time. Shutdown is cooperative: the executor enqueues one
//! termination marker per worker after the last item, joins every worker, and only
//! then enqueues the one marker that stops the sink.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                          ┌──────────────────────────────┐
//!   TaskSource ──items──►  │  Executor (orchestrator)     │
//!                          │  - input Channel<T>          │
//!                          │  - feedback Channel<F>       │
//!                          │  - Bus (broadcast events)    │
//!                          └──────┬───────────────────────┘
//!                                 │ send(Item) × n, then Terminate × w
//!                                 ▼
//!                   ┌──────── input channel (FIFO) ────────┐
//!                   ▼                 ▼                    ▼
//!             ┌──────────┐      ┌──────────┐         ┌──────────┐
//!             │ Worker 0 │      │ Worker 1 │   ...   │ Worker w │   Process::process(item)
//!             └────┬─────┘      └────┬─────┘         └────┬─────┘
//!                  │ FeedbackWriter::write(msg)           │
//!                  ▼                 ▼                    ▼
//!                   └──────── feedback channel ───────────┘
//!                                 │ ... then Terminate × 1 (after all workers joined)
//!                                 ▼
//!                          ┌──────────────┐
//!                          │ FeedbackSink │   Feedback::on_feedback(msg), serialized
//!                          └──────────────┘
//!
//!   Executor / Workers / Sink ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//! ```
//!
//! ### Lifecycle of `perform`
//! ```text
//! construct ─► spawn sink + w workers ─► feed all items ─► w markers ─► join workers
//!           ─► 1 feedback marker ─► join sink (Barrier) | hand back handle (Detached)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                            |
//! |-------------------|--------------------------------------------------------------|-----------------------------------------------|
//! | **Execution**     | Run a pool to completion and inspect the outcome.            | [`Executor`], [`PoolReport`]                  |
//! | **Work**          | Per-item processing and feedback handling.                   | [`Process`], [`ProcessFn`], [`Feedback`], [`FeedbackFn`] |
//! | **Input**         | Lazy one-shot item sequences, fallible or not.               | [`TaskSource`], [`PoolSpec`]                  |
//! | **Transport**     | MPMC channel carrying items and a termination marker.        | [`Channel`], [`Message`]                      |
//! | **Policies**      | Retry, skip or exit on failures; backoff between retries.    | [`FailurePolicy`], [`BackoffPolicy`]          |
//! | **Observability** | Lifecycle events and subscribers.                            | [`Event`], [`EventKind`], [`Subscribe`]       |
//! | **Errors**        | Typed errors for the lifecycle and for items.                | [`RuntimeError`], [`TaskError`]               |
//! | **Configuration** | Sink mode, grace, timeouts, bus capacity.                    | [`Config`], [`SinkMode`]                      |
//!
//! ## Optional features
//! - `logging`: exports the built-in [`LogWriter`] subscriber, which turns events into
//!   `tracing` records.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use poolvisor::{
//!     Config, Executor, FeedbackFn, FeedbackWriter, PoolSpec, ProcessFn, TaskError, TaskSource,
//! };
//!
//! #[tokio::main(flavor = "multi_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn poolvisor::Subscribe>> = vec![Arc::new(poolvisor::LogWriter::default())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn poolvisor::Subscribe>> = Vec::new();
//!
//!     let spec = PoolSpec::new(
//!         4,
//!         ProcessFn::arc(|word: String, fb: FeedbackWriter<String>, _ctx: CancellationToken| async move {
//!             fb.write(word.to_uppercase());
//!             Ok::<_, TaskError>(())
//!         }),
//!         FeedbackFn::new(|shout: String| async move {
//!             println!("{shout}");
//!             Ok::<_, TaskError>(())
//!         }),
//!         TaskSource::iter(["alpha", "beta", "gamma"].map(String::from)),
//!     );
//!
//!     let report = Executor::builder(spec)
//!         .with_config(Config::default())
//!         .with_subscribers(subs)
//!         .build()?
//!         .perform()
//!         .await?;
//!
//!     assert_eq!(report.markers_sent, 4);
//!     assert_eq!(report.processed(), 3);
//!     Ok(())
//! }
//! ```
mod channel;
mod core;
mod error;
mod events;
mod policies;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use channel::{Channel, Message, Receiver, Sender};
pub use core::{
    Config, Executor, ExecutorBuilder, PoolReport, SinkMode, SinkOutcome, SinkReport, WorkerExit,
    WorkerReport,
};
pub use error::{ChannelError, RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, FailurePolicy, JitterPolicy};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{
    Feedback, FeedbackFn, FeedbackWriter, PoolSpec, Process, ProcessFn, ProcessorRef, SourceError,
    TaskSource,
};

// Optional: expose a built-in tracing subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
