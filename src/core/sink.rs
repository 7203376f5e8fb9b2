//! # Feedback sink: the single consumer of the feedback channel.
//!
//! ```text
//! loop {
//!   next_item() ── Terminate ──► handler.finish(), publish SinkStopped, exit
//!       │
//!      msg ──► handler.on_feedback(msg)
//!                 ├─ Ok          ──► handled += 1
//!                 └─ Err / panic ──► FeedbackFailed, failed += 1, keep draining
//! }
//! ```
//!
//! Messages are handled strictly one at a time and in channel order. A failing handler
//! never stops the sink: the executor is waiting for it to take its marker.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::{
    channel::Receiver,
    core::report::SinkReport,
    error::TaskError,
    events::{Bus, Event, EventKind},
    subscribers::panic_message,
    tasks::Feedback,
};

pub(crate) struct FeedbackSink<F> {
    handler: Box<dyn Feedback<F>>,
    input: Receiver<F>,
    bus: Bus,
}

impl<F: Send + 'static> FeedbackSink<F> {
    pub fn new(handler: Box<dyn Feedback<F>>, input: Receiver<F>, bus: Bus) -> Self {
        Self { handler, input, bus }
    }

    /// Drains the feedback channel until the termination marker.
    pub async fn run(mut self) -> SinkReport {
        self.bus.publish(Event::new(EventKind::SinkStarted));
        tracing::debug!("feedback sink started");

        let mut report = SinkReport::default();
        while let Some(msg) = self.input.next_item().await {
            let res = AssertUnwindSafe(self.handler.on_feedback(msg))
                .catch_unwind()
                .await
                .unwrap_or_else(|p| {
                    Err(TaskError::Panicked {
                        info: panic_message(p.as_ref()),
                    })
                });
            match res {
                Ok(()) => report.handled += 1,
                Err(err) => {
                    report.failed += 1;
                    self.failed(&err);
                }
            }
        }

        let finished = AssertUnwindSafe(self.handler.finish())
            .catch_unwind()
            .await
            .unwrap_or_else(|p| {
                Err(TaskError::Panicked {
                    info: panic_message(p.as_ref()),
                })
            });
        if let Err(err) = finished {
            report.failed += 1;
            self.failed(&err);
        }

        self.bus
            .publish(Event::new(EventKind::SinkStopped).with_count(report.handled));
        tracing::debug!(handled = report.handled, failed = report.failed, "feedback sink stopped");
        report
    }

    fn failed(&self, err: &TaskError) {
        tracing::warn!(error = %err, "feedback handler failed");
        self.bus
            .publish(Event::new(EventKind::FeedbackFailed).with_reason(err.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    struct Collect {
        seen: Arc<Mutex<Vec<u32>>>,
        finished: Arc<Mutex<bool>>,
    }

    #[async_trait]
    impl Feedback<u32> for Collect {
        async fn on_feedback(&mut self, n: u32) -> Result<(), TaskError> {
            match n {
                0 => Err(TaskError::fail("zero")),
                99 => panic!("ninety-nine"),
                _ => {
                    self.seen.lock().unwrap().push(n);
                    Ok(())
                }
            }
        }

        async fn finish(&mut self) -> Result<(), TaskError> {
            *self.finished.lock().unwrap() = true;
            Ok(())
        }
    }

    #[tokio::test]
    async fn keeps_draining_past_errors_and_panics() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let finished = Arc::new(Mutex::new(false));
        let ch: Channel<u32> = Channel::new();
        for n in [1, 0, 2, 99, 3] {
            ch.send(n).unwrap();
        }
        ch.terminate().unwrap();

        let bus = Bus::new(32);
        let mut rx = bus.subscribe();
        let sink = FeedbackSink::new(
            Box::new(Collect {
                seen: seen.clone(),
                finished: finished.clone(),
            }),
            ch.receiver(),
            bus,
        );
        let report = sink.run().await;

        assert_eq!(report, SinkReport { handled: 3, failed: 2 });
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
        assert!(*finished.lock().unwrap());

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert_eq!(
            kinds,
            vec![
                EventKind::SinkStarted,
                EventKind::FeedbackFailed,
                EventKind::FeedbackFailed,
                EventKind::SinkStopped,
            ]
        );
    }

    #[tokio::test]
    async fn messages_after_marker_stay_queued() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let ch: Channel<u32> = Channel::new();
        ch.send(1).unwrap();
        ch.terminate().unwrap();
        ch.send(2).unwrap();

        let sink = FeedbackSink::new(
            Box::new(Collect {
                seen: seen.clone(),
                finished: Arc::new(Mutex::new(false)),
            }),
            ch.receiver(),
            Bus::new(8),
        );
        assert_eq!(sink.run().await.handled, 1);
        assert_eq!(ch.receiver().next_item().await, Some(2));
    }
}
