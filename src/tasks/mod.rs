//! # Caller-supplied pieces of a pool run.
//!
//! - [`Process`] / [`ProcessFn`] / [`ProcessorRef`] - per-item work run by every worker
//! - [`Feedback`] / [`FeedbackFn`] - feedback interpretation run by the single sink
//! - [`FeedbackWriter`] - worker-side handle onto the feedback channel
//! - [`TaskSource`] - one-shot lazy sequence of items
//! - [`PoolSpec`] - the bundle handed to the executor

mod feedback;
mod process;
mod source;
mod spec;

pub use feedback::{Feedback, FeedbackFn, FeedbackWriter};
pub use process::{Process, ProcessFn, ProcessorRef};
pub use source::{SourceError, TaskSource};
pub use spec::PoolSpec;
