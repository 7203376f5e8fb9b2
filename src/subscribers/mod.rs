//! # Event subscribers.
//!
//! ```text
//! Worker / Sink / Executor ── publish(Event) ──► Bus ──► executor listener
//!                                                            │
//!                                                      SubscriberSet::emit
//!                                                   ┌────────┼────────┐
//!                                                   ▼        ▼        ▼
//!                                               LogWriter  Metrics  Custom
//! ```
//!
//! - [`Subscribe`] trait for custom observers
//! - [`SubscriberSet`] per-subscriber queues and workers
//! - [`LogWriter`] built-in tracing subscriber (feature `logging`)

#[cfg(feature = "logging")]
mod embedded;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
pub(crate) use subscriber_set::panic_message;
