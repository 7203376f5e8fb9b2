//! # LogWriter: pool events as tracing records
//!
//! Forwards every [`Event`] to `tracing`. Failures are `warn`, crashes and panics
//! `error`, protocol steps `info`, per-worker chatter `debug`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  poolvisor: pool starting workers=3
//! DEBUG poolvisor: worker started worker=0
//! WARN  poolvisor: task failed worker=1 attempt=1 reason="processing failed: boom"
//! INFO  poolvisor: termination markers sent markers=3
//! INFO  poolvisor: workers joined workers=3
//! INFO  poolvisor: feedback termination sent
//! INFO  poolvisor: feedback sink stopped handled=20
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::PoolStarting => info!(target: "poolvisor", workers = e.count, "pool starting"),
            EventKind::SourceExhausted => {
                info!(target: "poolvisor", fed = e.count, "task source exhausted")
            }
            EventKind::SourceFailed => {
                error!(target: "poolvisor", fed = e.count, reason, "task source failed")
            }
            EventKind::TerminateSent => {
                info!(target: "poolvisor", markers = e.count, "termination markers sent")
            }
            EventKind::WorkersJoined => {
                info!(target: "poolvisor", workers = e.count, "workers joined")
            }
            EventKind::FeedbackTerminateSent => {
                info!(target: "poolvisor", "feedback termination sent")
            }
            EventKind::GraceExceeded => {
                error!(target: "poolvisor", grace_ms = e.timeout_ms, "feedback sink grace exceeded")
            }
            EventKind::PoolFinished => info!(target: "poolvisor", "pool finished"),
            EventKind::WorkerStarted => debug!(target: "poolvisor", worker = e.worker, "worker started"),
            EventKind::WorkerStopped => {
                debug!(target: "poolvisor", worker = e.worker, processed = e.count, "worker stopped")
            }
            EventKind::WorkerCrashed => {
                error!(target: "poolvisor", worker = e.worker, reason, "worker crashed")
            }
            EventKind::TaskFailed => warn!(
                target: "poolvisor",
                worker = e.worker,
                attempt = e.attempt,
                reason,
                "task failed"
            ),
            EventKind::TimeoutHit => warn!(
                target: "poolvisor",
                worker = e.worker,
                attempt = e.attempt,
                timeout_ms = e.timeout_ms,
                "task timed out"
            ),
            EventKind::RetryScheduled => info!(
                target: "poolvisor",
                worker = e.worker,
                after_attempt = e.attempt,
                delay_ms = e.delay_ms,
                "retry scheduled"
            ),
            EventKind::TaskSkipped => {
                warn!(target: "poolvisor", worker = e.worker, attempt = e.attempt, reason, "task skipped")
            }
            EventKind::SinkStarted => debug!(target: "poolvisor", "feedback sink started"),
            EventKind::SinkStopped => {
                info!(target: "poolvisor", handled = e.count, "feedback sink stopped")
            }
            EventKind::FeedbackFailed => {
                warn!(target: "poolvisor", reason, "feedback handler failed")
            }
            EventKind::SinkCrashed => error!(target: "poolvisor", reason, "feedback sink crashed"),
            EventKind::SubscriberOverflow => warn!(
                target: "poolvisor",
                subscriber = e.name.as_deref().unwrap_or("unknown"),
                reason,
                "subscriber overflow"
            ),
            EventKind::SubscriberPanicked => error!(
                target: "poolvisor",
                subscriber = e.name.as_deref().unwrap_or("unknown"),
                reason,
                "subscriber panicked"
            ),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
