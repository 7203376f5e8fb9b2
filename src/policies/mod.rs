//! Failure and retry policies.
//!
//! ## Contents
//! - [`FailurePolicy`] what a worker does after an item fails (exit / skip / retry)
//! - [`BackoffPolicy`] how retry delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization to keep retrying workers from lining up
//!
//! ## Quick wiring
//! ```text
//! Config { failure: FailurePolicy, backoff: BackoffPolicy, timeout }
//!      └─► core::worker::Worker uses:
//!           - failure to decide retry / skip / exit
//!           - backoff.next(retry) to delay the next attempt of the same item
//! ```
//!
//! ## Defaults
//! - `FailurePolicy::Skip`.
//! - `BackoffPolicy::default()` → first=50ms, factor=2.0, max=5s, jitter=None.

mod backoff;
mod failure;
mod jitter;

pub use backoff::BackoffPolicy;
pub use failure::FailurePolicy;
pub use jitter::JitterPolicy;
