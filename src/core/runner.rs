//! # Run a single attempt at one item.
//!
//! Executes one call of [`Process::process`] with an optional timeout and panic capture,
//! publishing failure events to [`Bus`].
//!
//! ## Event flow
//! ```text
//! Success:
//!   process() → Ok(())            → (nothing published)
//!
//! Failure:
//!   process() → Err(e)            → publish TaskFailed
//!
//! Panic:
//!   process() → panic             → Err(Panicked) → publish TaskFailed
//!
//! Timeout:
//!   timeout exceeded → drop attempt future → cancel ctx → publish TimeoutHit
//!                                                      → Err(Timeout) → publish TaskFailed
//! ```
//!
//! ## Rules
//! - Every failed attempt publishes **exactly one** `TaskFailed`
//! - `TimeoutHit` is published **in addition to** `TaskFailed` on timeout
//! - Each attempt gets a fresh [`CancellationToken`]
//! - On timeout the token is cancelled after the attempt's future is dropped; only
//!   tasks the attempt spawned with a clone of the token can observe it

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::{
    error::TaskError,
    events::{Bus, Event, EventKind},
    subscribers::panic_message,
    tasks::{FeedbackWriter, Process},
};

/// Identifies the attempt being run, for events.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Attempt {
    pub worker: usize,
    pub number: u32,
}

/// Executes one attempt of `processor` on `item`.
pub(crate) async fn run_item<T, F>(
    processor: &dyn Process<T, F>,
    item: T,
    feedback: &FeedbackWriter<F>,
    timeout: Option<Duration>,
    attempt: Attempt,
    bus: &Bus,
) -> Result<(), TaskError>
where
    T: Send + 'static,
    F: Send + 'static,
{
    let ctx = CancellationToken::new();
    let guarded = AssertUnwindSafe(processor.process(item, feedback, ctx.clone())).catch_unwind();

    let res = match timeout {
        Some(dur) => match time::timeout(dur, guarded).await {
            Ok(caught) => caught.unwrap_or_else(|p| Err(panicked(p))),
            Err(_elapsed) => {
                ctx.cancel();
                publish_timeout(bus, attempt, dur);
                Err(TaskError::Timeout { timeout: dur })
            }
        },
        None => guarded.await.unwrap_or_else(|p| Err(panicked(p))),
    };

    if let Err(e) = &res {
        tracing::debug!(worker = attempt.worker, attempt = attempt.number, error = %e, "attempt failed");
        publish_failed(bus, attempt, e);
    }
    res
}

fn panicked(payload: Box<dyn std::any::Any + Send>) -> TaskError {
    TaskError::Panicked {
        info: panic_message(payload.as_ref()),
    }
}

/// Publishes `TaskFailed` event with error details.
fn publish_failed(bus: &Bus, attempt: Attempt, err: &TaskError) {
    bus.publish(
        Event::new(EventKind::TaskFailed)
            .with_worker(attempt.worker)
            .with_attempt(attempt.number)
            .with_reason(err.to_string()),
    );
}

/// Publishes `TimeoutHit` event (always followed by `TaskFailed`).
fn publish_timeout(bus: &Bus, attempt: Attempt, dur: Duration) {
    bus.publish(
        Event::new(EventKind::TimeoutHit)
            .with_worker(attempt.worker)
            .with_attempt(attempt.number)
            .with_timeout(dur),
    );
}
