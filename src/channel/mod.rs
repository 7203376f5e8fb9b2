//! In-memory transport between the executor, its workers and the feedback sink.
//!
//! ## Contents
//! - [`Message`] element type: an item or the termination marker
//! - [`Channel`] unbounded FIFO owned by the executor
//! - [`Sender`], [`Receiver`] cloneable endpoints handed to producers/consumers
//!
//! ## Wiring
//! ```text
//! Executor ── send(Item) / terminate() ──► input channel ──► Receiver (worker 1..N, competing)
//! Worker   ── FeedbackWriter::write()  ──► feedback channel ──► Receiver (sink, single)
//! Executor ── terminate() ───────────────────────┘
//! ```

mod channel;
mod message;

pub use channel::{Channel, Receiver, Sender};
pub use message::Message;
