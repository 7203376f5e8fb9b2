//! # Executor: one full pool lifecycle per [`Executor::perform`] call.
//!
//! The executor owns both channels, the processor, the feedback handler and the task
//! source. `perform` consumes it and walks a strictly linear protocol:
//!
//! ```text
//! perform(self)
//!   ├─► listener: Bus.subscribe() ─► SubscriberSet::emit(&Event)   (until PoolFinished)
//!   ├─► spawn FeedbackSink            (reads feedback channel)
//!   ├─► spawn Worker 0..N             (compete on input channel)
//!   ├─► feed: source ─► input.send(item) ...          ─► SourceExhausted | SourceFailed
//!   ├─► input.terminate() × N                         ─► TerminateSent
//!   ├─► join every worker                             ─► WorkersJoined
//!   ├─► feedback.terminate() × 1                      ─► FeedbackTerminateSent
//!   ├─► SinkMode::Barrier   → join sink within grace  (timeout → abort, GraceExceeded;
//!   │                                                  join error → SinkCrashed)
//!   │   SinkMode::Detached  → hand the JoinHandle back in PoolReport
//!   └─► PoolFinished, flush subscribers, return
//! ```
//!
//! ## Rules
//! - Exactly `workers` input markers and exactly one feedback marker are sent.
//! - The feedback marker is sent only after every worker has been joined, so the sink
//!   handles every message a worker wrote before it takes its marker.
//! - A failing source still goes through shutdown; nothing is left running except a
//!   detached sink. When the sink also fails, the source failure is the one returned.
//! - Feeding yields after every item, so workers make progress even on a
//!   current-thread runtime and with an endless source.
//! - In detached mode the sink may publish events after `PoolFinished`; those reach
//!   [`Executor::subscribe`] receivers but not the [`Subscribe`] set.

use std::sync::Arc;

use futures::StreamExt;
use tokio::{
    sync::broadcast,
    task::{JoinHandle, JoinSet},
    time,
};

use crate::{
    channel::Channel,
    core::{
        builder::ExecutorBuilder,
        config::{Config, SinkMode},
        report::{PoolReport, SinkOutcome, SinkReport, WorkerExit, WorkerReport},
        sink::FeedbackSink,
        worker::{Worker, WorkerParams},
    },
    error::RuntimeError,
    events::{Bus, Event, EventKind},
    subscribers::{Subscribe, SubscriberSet},
    tasks::{Feedback, FeedbackWriter, PoolSpec, ProcessorRef, TaskSource},
};

/// Parallel task executor.
///
/// Built from a [`PoolSpec`] with [`Executor::new`] (default [`Config`]) or
/// [`Executor::builder`]. Single use: [`Executor::perform`] consumes it.
///
/// ## Example
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use poolvisor::{Executor, FeedbackFn, FeedbackWriter, PoolSpec, ProcessFn, TaskError, TaskSource};
///
/// #[tokio::main(flavor = "multi_thread")]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let spec = PoolSpec::new(
///         3,
///         ProcessFn::arc(|n: u64, fb: FeedbackWriter<u64>, _ctx: CancellationToken| async move {
///             fb.write(n * n);
///             Ok::<_, TaskError>(())
///         }),
///         FeedbackFn::new(|sq: u64| async move {
///             println!("{sq}");
///             Ok::<_, TaskError>(())
///         }),
///         TaskSource::iter(1..=10u64),
///     );
///
///     let report = Executor::new(spec)?.perform().await?;
///     assert_eq!(report.fed, 10);
///     assert_eq!(report.processed(), 10);
///     Ok(())
/// }
/// ```
pub struct Executor<T, F> {
    cfg: Config,
    workers: usize,
    processor: ProcessorRef<T, F>,
    handler: Box<dyn Feedback<F>>,
    source: TaskSource<T>,
    input: Channel<T>,
    feedback: Channel<F>,
    writer: FeedbackWriter<F>,
    bus: Bus,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<T, F> Executor<T, F>
where
    T: Clone + Send + 'static,
    F: Send + 'static,
{
    /// Validates `spec` and builds an executor with the default [`Config`].
    pub fn new(spec: PoolSpec<T, F>) -> Result<Self, RuntimeError> {
        Self::builder(spec).build()
    }

    /// Starts a builder for custom configuration and subscribers.
    pub fn builder(spec: PoolSpec<T, F>) -> ExecutorBuilder<T, F> {
        ExecutorBuilder::new(spec)
    }

    pub(crate) fn assemble(
        cfg: Config,
        spec: PoolSpec<T, F>,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        let parts = spec.into_parts();
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let input = Channel::new();
        let feedback = Channel::new();
        let writer = FeedbackWriter::new(feedback.sender());
        Self {
            cfg,
            workers: parts.workers,
            processor: parts.processor,
            handler: parts.feedback,
            source: parts.source,
            input,
            feedback,
            writer,
            bus,
            subscribers,
        }
    }

    /// Number of workers `perform` will spawn.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// The configuration this executor runs with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Returns a raw receiver of every event published from now on.
    ///
    /// Call before [`perform`](Self::perform) to observe the whole run.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Runs the pool to completion.
    ///
    /// Returns `Ok` even when individual items failed; inspect the [`PoolReport`] or the
    /// event stream for those. Errors are reserved for the lifecycle itself: a failing
    /// task source, a closed channel, or a sink that outlived its grace period.
    pub async fn perform(mut self) -> Result<PoolReport, RuntimeError> {
        let listener = spawn_listener(&self.bus, std::mem::take(&mut self.subscribers));
        let bus = self.bus.clone();

        let res = self.drive().await;

        let fed = match &res {
            Ok(report) => report.fed,
            Err(RuntimeError::SourceFailed { fed, .. }) => *fed,
            Err(_) => 0,
        };
        match &res {
            Ok(report) => tracing::info!(
                fed,
                processed = report.processed(),
                failed = report.failed(),
                crashed = report.crashed(),
                "pool finished"
            ),
            Err(err) => tracing::error!(error = %err, label = err.as_label(), "pool finished with error"),
        }
        bus.publish(Event::new(EventKind::PoolFinished).with_count(fed));
        drop(bus);

        if let Some(handle) = listener {
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "event listener ended abnormally");
            }
        }
        res
    }

    /// Spawn, feed, signal, join: everything between the first and the last event.
    async fn drive(self) -> Result<PoolReport, RuntimeError> {
        let Executor {
            cfg,
            workers,
            processor,
            handler,
            source,
            input,
            feedback,
            writer,
            bus,
            subscribers: _,
        } = self;

        bus.publish(Event::new(EventKind::PoolStarting).with_count(workers as u64));
        tracing::info!(workers, sink = ?cfg.sink, failure = ?cfg.failure, "pool starting");

        let mut sink_task =
            tokio::spawn(FeedbackSink::new(handler, feedback.receiver(), bus.clone()).run());

        let params = WorkerParams {
            failure: cfg.failure,
            backoff: cfg.backoff,
            timeout: cfg.item_timeout(),
        };
        let mut set = JoinSet::new();
        for id in 0..workers {
            let worker = Worker::new(
                id,
                Arc::clone(&processor),
                input.receiver(),
                writer.clone(),
                params,
                bus.clone(),
            );
            set.spawn(worker.run());
        }
        drop(writer);

        let (fed, mut failure) = feed(source, &input, &bus).await;

        let mut markers_sent = 0;
        for _ in 0..workers {
            if input.terminate().is_err() {
                failure.get_or_insert(RuntimeError::ChannelClosed { channel: "input" });
                break;
            }
            markers_sent += 1;
        }
        bus.publish(Event::new(EventKind::TerminateSent).with_count(markers_sent as u64));
        tracing::debug!(markers_sent, "termination markers sent");

        let reports = join_workers(&mut set, workers, &bus).await;
        bus.publish(Event::new(EventKind::WorkersJoined).with_count(reports.len() as u64));
        tracing::debug!(joined = reports.len(), "workers joined");

        if feedback.terminate().is_err() {
            failure.get_or_insert(RuntimeError::ChannelClosed {
                channel: "feedback",
            });
        }
        bus.publish(Event::new(EventKind::FeedbackTerminateSent));
        tracing::debug!("feedback termination marker sent");

        let sink = match cfg.sink {
            SinkMode::Detached => SinkOutcome::Detached(sink_task),
            SinkMode::Barrier => match join_sink(&mut sink_task, &cfg, &bus).await {
                Ok(report) => SinkOutcome::Joined(report),
                // An earlier source or channel failure is the root cause; report it first.
                Err(err) => return Err(failure.unwrap_or(err)),
            },
        };

        if let Some(err) = failure {
            return Err(err);
        }
        Ok(PoolReport {
            fed,
            markers_sent,
            workers: reports,
            sink,
        })
    }
}

/// Sends every source item to the input channel, in order.
///
/// Returns the number of items sent and the error that stopped feeding, if any.
async fn feed<T>(source: TaskSource<T>, input: &Channel<T>, bus: &Bus) -> (u64, Option<RuntimeError>) {
    let mut items = source.into_stream();
    let mut fed = 0u64;

    while let Some(next) = items.next().await {
        match next {
            Ok(item) => {
                if input.send(item).is_err() {
                    return (fed, Some(RuntimeError::ChannelClosed { channel: "input" }));
                }
                fed += 1;
                // Unbounded sends never hit the coop budget; let workers run on a
                // current-thread runtime while the source is still producing.
                tokio::task::yield_now().await;
            }
            Err(err) => {
                let error = err.to_string();
                tracing::error!(fed, %error, "task source failed; stopping feed");
                bus.publish(
                    Event::new(EventKind::SourceFailed)
                        .with_count(fed)
                        .with_reason(error.clone()),
                );
                return (fed, Some(RuntimeError::SourceFailed { error, fed }));
            }
        }
    }

    bus.publish(Event::new(EventKind::SourceExhausted).with_count(fed));
    tracing::debug!(fed, "task source exhausted");
    (fed, None)
}

/// Joins every worker; a worker whose task died records as crashed.
async fn join_workers(
    set: &mut JoinSet<WorkerReport>,
    workers: usize,
    bus: &Bus,
) -> Vec<WorkerReport> {
    let mut reports = Vec::with_capacity(workers);
    let mut lost = Vec::new();

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(report) => reports.push(report),
            Err(err) => {
                tracing::error!(error = %err, "worker task failed to join");
                lost.push(err.to_string());
            }
        }
    }

    if !lost.is_empty() {
        let mut seen = vec![false; workers];
        for r in &reports {
            seen[r.worker] = true;
        }
        let missing = seen.iter().enumerate().filter(|(_, s)| !**s).map(|(i, _)| i);
        for (id, error) in missing.zip(lost) {
            bus.publish(
                Event::new(EventKind::WorkerCrashed)
                    .with_worker(id)
                    .with_reason(error.clone()),
            );
            reports.push(WorkerReport {
                worker: id,
                processed: 0,
                failed: 0,
                exit: WorkerExit::Crashed { error },
            });
        }
    }

    reports.sort_by_key(|r| r.worker);
    reports
}

/// Barrier mode: waits for the sink, bounded by the grace period.
async fn join_sink(
    sink: &mut JoinHandle<SinkReport>,
    cfg: &Config,
    bus: &Bus,
) -> Result<SinkReport, RuntimeError> {
    let joined = match cfg.sink_grace() {
        None => sink.await,
        Some(grace) => match time::timeout(grace, &mut *sink).await {
            Ok(joined) => joined,
            Err(_elapsed) => {
                sink.abort();
                tracing::error!(?grace, "feedback sink exceeded grace; aborted");
                bus.publish(Event::new(EventKind::GraceExceeded).with_timeout(grace));
                return Err(RuntimeError::GraceExceeded { grace });
            }
        },
    };

    joined.map_err(|err| {
        let error = err.to_string();
        tracing::error!(%error, "feedback sink task failed to join");
        bus.publish(Event::new(EventKind::SinkCrashed).with_reason(error.clone()));
        RuntimeError::SinkCrashed { error }
    })
}

/// Forwards bus events to the subscriber set until `PoolFinished`, then flushes it.
fn spawn_listener(bus: &Bus, subscribers: Vec<Arc<dyn Subscribe>>) -> Option<JoinHandle<()>> {
    if subscribers.is_empty() {
        return None;
    }
    let mut rx = bus.subscribe();
    let set = SubscriberSet::new(subscribers, bus.clone());

    Some(tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => {
                    let last = ev.kind == EventKind::PoolFinished;
                    set.emit(&ev);
                    if last {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event listener lagged; events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        set.shutdown().await;
    }))
}
