//! # What a finished run looked like.
//!
//! [`PoolReport`] is returned by [`Executor::perform`](crate::Executor::perform). It is the
//! cross-task failure path: item failures and worker crashes that the channels themselves
//! never report back end up here and on the event bus.

use tokio::task::{JoinError, JoinHandle};

/// How a worker left its loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkerExit {
    /// Took its termination marker.
    Drained,
    /// Stopped early; its termination marker was left in the input channel.
    Crashed {
        /// The failure that stopped the worker.
        error: String,
    },
}

/// Per-worker outcome.
#[derive(Clone, Debug)]
pub struct WorkerReport {
    /// Worker index (`0..workers`).
    pub worker: usize,
    /// Items processed successfully.
    pub processed: u64,
    /// Items given up on (skipped, or the one that stopped the worker).
    pub failed: u64,
    /// How the worker stopped.
    pub exit: WorkerExit,
}

impl WorkerReport {
    /// Returns `true` if the worker stopped without taking a marker.
    pub fn is_crashed(&self) -> bool {
        matches!(self.exit, WorkerExit::Crashed { .. })
    }
}

/// Feedback sink outcome.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SinkReport {
    /// Messages handled successfully.
    pub handled: u64,
    /// Messages whose handler failed or panicked (plus a failed `finish`).
    pub failed: u64,
}

/// State of the feedback sink when `perform` returned.
#[derive(Debug)]
pub enum SinkOutcome {
    /// Barrier mode: the sink drained and was joined.
    Joined(SinkReport),
    /// Detached mode: the sink may still be draining.
    Detached(JoinHandle<SinkReport>),
}

impl SinkOutcome {
    /// Waits for the sink if needed and returns its report.
    pub async fn join(self) -> Result<SinkReport, JoinError> {
        match self {
            SinkOutcome::Joined(report) => Ok(report),
            SinkOutcome::Detached(handle) => handle.await,
        }
    }

    /// The report, if the sink was already joined.
    pub fn report(&self) -> Option<&SinkReport> {
        match self {
            SinkOutcome::Joined(report) => Some(report),
            SinkOutcome::Detached(_) => None,
        }
    }
}

/// Outcome of one [`Executor::perform`](crate::Executor::perform) call.
#[derive(Debug)]
pub struct PoolReport {
    /// Items taken from the task source and sent to the input channel.
    pub fed: u64,
    /// Termination markers sent to the input channel (equals the worker count).
    pub markers_sent: usize,
    /// One entry per spawned worker, ordered by index.
    pub workers: Vec<WorkerReport>,
    /// The feedback sink.
    pub sink: SinkOutcome,
}

impl PoolReport {
    /// Items processed successfully across all workers.
    pub fn processed(&self) -> u64 {
        self.workers.iter().map(|w| w.processed).sum()
    }

    /// Items given up on across all workers.
    pub fn failed(&self) -> u64 {
        self.workers.iter().map(|w| w.failed).sum()
    }

    /// Workers that stopped early.
    pub fn crashed(&self) -> usize {
        self.workers.iter().filter(|w| w.is_crashed()).count()
    }
}
