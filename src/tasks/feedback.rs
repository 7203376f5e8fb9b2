//! # Feedback path: writer on the worker side, handler on the sink side.
//!
//! ```text
//! worker ── FeedbackWriter::write(msg) ──► feedback channel ──► FeedbackSink ──► Feedback::on_feedback(msg)
//!   (many, fire-and-forget)                                        (exactly one, serialized)
//! ```
//!
//! The handler takes `&mut self`: only the single sink task ever owns it, so handlers may
//! keep plain mutable state (open files, counters) without locks.

use std::future::Future;

use async_trait::async_trait;

use crate::channel::Sender;
use crate::error::{ChannelError, TaskError};

/// Worker-side handle that enqueues feedback messages without waiting.
///
/// Every worker gets its own clone, bound to the same feedback channel.
pub struct FeedbackWriter<F> {
    tx: Sender<F>,
}

impl<F> Clone for FeedbackWriter<F> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<F> FeedbackWriter<F> {
    pub(crate) fn new(tx: Sender<F>) -> Self {
        Self { tx }
    }

    /// Enqueues a feedback message. Fire-and-forget: never waits for the sink.
    ///
    /// If the feedback channel is already gone, the message is dropped with a warning.
    pub fn write(&self, msg: F) {
        if self.try_write(msg).is_err() {
            tracing::warn!("feedback channel closed; message dropped");
        }
    }

    /// Enqueues a feedback message, reporting a closed channel to the caller.
    pub fn try_write(&self, msg: F) -> Result<(), ChannelError> {
        self.tx.send(msg)
    }
}

/// # Feedback interpretation logic.
///
/// Invoked by the feedback sink for every message, strictly one at a time.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use poolvisor::{Feedback, TaskError};
///
/// #[derive(Default)]
/// struct Tally {
///     total: u64,
/// }
///
/// #[async_trait]
/// impl Feedback<u64> for Tally {
///     async fn on_feedback(&mut self, n: u64) -> Result<(), TaskError> {
///         self.total += n;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Feedback<F>: Send + 'static
where
    F: Send + 'static,
{
    /// Handles one feedback message.
    ///
    /// An error is reported as `EventKind::FeedbackFailed`; the sink keeps draining.
    async fn on_feedback(&mut self, msg: F) -> Result<(), TaskError>;

    /// Called once after the sink has taken its termination marker.
    ///
    /// Use it to flush buffered output. Default: no-op.
    async fn finish(&mut self) -> Result<(), TaskError> {
        Ok(())
    }
}

/// Closure-backed feedback handler: `FnMut(F) -> Fut`.
pub struct FeedbackFn<H> {
    f: H,
}

impl<H> FeedbackFn<H> {
    /// Wraps a closure.
    pub fn new(f: H) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F, H, Fut> Feedback<F> for FeedbackFn<H>
where
    F: Send + 'static,
    H: FnMut(F) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    async fn on_feedback(&mut self, msg: F) -> Result<(), TaskError> {
        (self.f)(msg).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;

    #[tokio::test]
    async fn writer_enqueues_without_waiting_for_consumer() {
        let ch: Channel<&'static str> = Channel::new();
        let writer = FeedbackWriter::new(ch.sender());
        writer.write("a");
        writer.clone().write("b");
        ch.terminate().unwrap();

        let rx = ch.receiver();
        assert_eq!(rx.next_item().await, Some("a"));
        assert_eq!(rx.next_item().await, Some("b"));
        assert_eq!(rx.next_item().await, None);
    }

    #[tokio::test]
    async fn try_write_reports_closed_channel() {
        let ch: Channel<u8> = Channel::new();
        let writer = FeedbackWriter::new(ch.sender());
        drop(ch);
        assert_eq!(writer.try_write(1), Err(ChannelError::Closed));
        writer.write(2); // dropped with a warning, no panic
    }

    #[tokio::test]
    async fn feedback_fn_keeps_mutable_state() {
        let mut seen = Vec::new();
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut handler = FeedbackFn::new(move |n: u32| {
            let tx = tx.clone();
            async move {
                tx.send(n).map_err(|e| TaskError::fail(e.to_string()))?;
                Ok(())
            }
        });
        handler.on_feedback(1).await.unwrap();
        handler.on_feedback(2).await.unwrap();
        handler.finish().await.unwrap();
        drop(handler);
        while let Some(n) = rx.recv().await {
            seen.push(n);
        }
        assert_eq!(seen, vec![1, 2]);
    }
}
