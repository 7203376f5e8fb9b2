//! # Built-in subscribers
//!
//! - [`LogWriter`]: writes pool events as `tracing` records.

mod log;

pub use log::LogWriter;
