//! Runtime core: orchestration and lifecycle.
//!
//! The public entry point is [`Executor`], built directly or through
//! [`ExecutorBuilder`], and configured with [`Config`].
//!
//! Internal modules:
//! - [`runner`]: executes one attempt with timeout, panic capture and event publishing;
//! - [`worker`]: drains the input channel, applying the failure policy per item;
//! - [`sink`]: the single consumer of the feedback channel;
//! - [`executor`]: the linear spawn / feed / terminate / join protocol;
//! - [`report`]: what `perform` hands back.

mod builder;
mod config;
mod executor;
mod report;
mod runner;
mod sink;
mod worker;

pub use builder::ExecutorBuilder;
pub use config::{Config, SinkMode};
pub use executor::Executor;
pub use report::{PoolReport, SinkOutcome, SinkReport, WorkerExit, WorkerReport};
