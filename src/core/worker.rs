//! # Worker: drains the input channel until its termination marker.
//!
//! ```text
//! loop {
//!   ├─► next_item()  ── Terminate ──► publish WorkerStopped, exit (Drained)
//!   │       │
//!   │      Item
//!   │       ▼
//!   │   attempt += 1
//!   │   run_item() ─────► processor.process(item, feedback, ctx)
//!   │       │
//!   │       ├─ Ok  ──► processed += 1, next item
//!   │       └─ Err ──► FailurePolicy:
//!   │                    ├─ Retry (retryable, budget left) ─► RetryScheduled, sleep, same item
//!   │                    ├─ Fatal error or Exit ────────────► WorkerCrashed, exit (Crashed)
//!   │                    └─ otherwise ──────────────────────► TaskSkipped, next item
//! }
//! ```
//!
//! ## Rules
//! - A worker consumes **at most one** termination marker and never re-enqueues it.
//! - A crashed worker leaves its marker in the channel; the surviving workers each
//!   still take exactly one, so nobody waits forever.
//! - Attempts for one item run sequentially; the attempt counter restarts per item.

use std::time::Duration;

use tokio::time;

use crate::{
    channel::Receiver,
    core::{
        report::{WorkerExit, WorkerReport},
        runner::{run_item, Attempt},
    },
    error::TaskError,
    events::{Bus, Event, EventKind},
    policies::{BackoffPolicy, FailurePolicy},
    tasks::{FeedbackWriter, ProcessorRef},
};

/// Failure handling parameters, taken from [`Config`](crate::Config).
#[derive(Clone, Copy, Debug)]
pub(crate) struct WorkerParams {
    pub failure: FailurePolicy,
    pub backoff: BackoffPolicy,
    pub timeout: Option<Duration>,
}

/// What happened to one item.
enum ItemOutcome {
    Done,
    Skipped,
    Exit(TaskError),
}

/// One pool worker bound to the input channel and the feedback writer.
pub(crate) struct Worker<T, F> {
    id: usize,
    processor: ProcessorRef<T, F>,
    input: Receiver<T>,
    feedback: FeedbackWriter<F>,
    params: WorkerParams,
    bus: Bus,
}

impl<T, F> Worker<T, F>
where
    T: Clone + Send + 'static,
    F: Send + 'static,
{
    pub fn new(
        id: usize,
        processor: ProcessorRef<T, F>,
        input: Receiver<T>,
        feedback: FeedbackWriter<F>,
        params: WorkerParams,
        bus: Bus,
    ) -> Self {
        Self {
            id,
            processor,
            input,
            feedback,
            params,
            bus,
        }
    }

    /// Runs until the worker takes a termination marker or its failure policy stops it.
    pub async fn run(self) -> WorkerReport {
        self.bus
            .publish(Event::new(EventKind::WorkerStarted).with_worker(self.id));
        tracing::debug!(worker = self.id, "worker started");

        let mut processed = 0u64;
        let mut failed = 0u64;

        while let Some(item) = self.input.next_item().await {
            match self.handle(item).await {
                ItemOutcome::Done => processed += 1,
                ItemOutcome::Skipped => failed += 1,
                ItemOutcome::Exit(err) => {
                    failed += 1;
                    tracing::error!(worker = self.id, error = %err, "worker stopping on failure");
                    self.bus.publish(
                        Event::new(EventKind::WorkerCrashed)
                            .with_worker(self.id)
                            .with_reason(err.to_string()),
                    );
                    return WorkerReport {
                        worker: self.id,
                        processed,
                        failed,
                        exit: WorkerExit::Crashed {
                            error: err.to_string(),
                        },
                    };
                }
            }
        }

        self.bus.publish(
            Event::new(EventKind::WorkerStopped)
                .with_worker(self.id)
                .with_count(processed),
        );
        tracing::debug!(worker = self.id, processed, failed, "worker drained");
        WorkerReport {
            worker: self.id,
            processed,
            failed,
            exit: WorkerExit::Drained,
        }
    }

    /// Runs every attempt the failure policy allows for one item.
    async fn handle(&self, item: T) -> ItemOutcome {
        let mut number = 0u32;
        loop {
            number += 1;
            let attempt = Attempt {
                worker: self.id,
                number,
            };
            let err = match run_item(
                self.processor.as_ref(),
                item.clone(),
                &self.feedback,
                self.params.timeout,
                attempt,
                &self.bus,
            )
            .await
            {
                Ok(()) => return ItemOutcome::Done,
                Err(e) => e,
            };

            if self.params.failure.should_retry(number, err.is_retryable()) {
                let delay = self.params.backoff.next(number - 1);
                self.bus.publish(
                    Event::new(EventKind::RetryScheduled)
                        .with_worker(self.id)
                        .with_attempt(number)
                        .with_delay(delay)
                        .with_reason(err.to_string()),
                );
                time::sleep(delay).await;
                continue;
            }

            if err.is_fatal() || self.params.failure.exits_worker() {
                return ItemOutcome::Exit(err);
            }

            tracing::warn!(worker = self.id, attempt = number, error = %err, "item skipped");
            self.bus.publish(
                Event::new(EventKind::TaskSkipped)
                    .with_worker(self.id)
                    .with_attempt(number)
                    .with_reason(err.to_string()),
            );
            return ItemOutcome::Skipped;
        }
    }
}
