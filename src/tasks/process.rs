//! # Per-item unit of work.
//!
//! The [`Process`] trait is what every worker runs for each item it takes from the
//! input channel. [`ProcessFn`] adapts a closure; [`ProcessorRef`] is the shared handle
//! (`Arc<dyn Process>`) cloned into every worker.
//!
//! A processor receives the item by value, a [`FeedbackWriter`] for emitting zero or
//! more feedback messages, and a [`CancellationToken`] that fires when the per-item
//! timeout elapses.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::feedback::FeedbackWriter;

/// Shared handle to a processor, cloned into every worker.
pub type ProcessorRef<T, F> = Arc<dyn Process<T, F>>;

/// # Processing logic for one item.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use poolvisor::{FeedbackWriter, Process, TaskError};
///
/// struct Upper;
///
/// #[async_trait]
/// impl Process<String, String> for Upper {
///     async fn process(
///         &self,
///         item: String,
///         feedback: &FeedbackWriter<String>,
///         _ctx: CancellationToken,
///     ) -> Result<(), TaskError> {
///         feedback.write(item.to_uppercase());
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Process<T, F>: Send + Sync + 'static
where
    T: Send + 'static,
    F: Send + 'static,
{
    /// Processes one item.
    ///
    /// When the attempt times out, this future is dropped first and `ctx` is cancelled
    /// right after, so the future itself never observes the cancellation. Work it hands
    /// off to other tasks (spawned I/O, child processes) should keep a clone of `ctx`
    /// and stop once it is cancelled; by then the attempt is counted as timed out.
    async fn process(
        &self,
        item: T,
        feedback: &FeedbackWriter<F>,
        ctx: CancellationToken,
    ) -> Result<(), TaskError>;
}

/// Closure-backed processor.
///
/// Wraps `Fn(T, FeedbackWriter<F>, CancellationToken) -> Fut`, producing a fresh future per
/// item. Shared state must be captured explicitly (`Arc<...>`).
///
/// ## Example
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use poolvisor::{FeedbackWriter, ProcessFn, ProcessorRef, TaskError};
///
/// let p: ProcessorRef<u32, u64> = ProcessFn::arc(
///     |n: u32, fb: FeedbackWriter<u64>, _ctx: CancellationToken| async move {
///         fb.write(u64::from(n) * 2);
///         Ok::<_, TaskError>(())
///     },
/// );
/// # let _ = p;
/// ```
pub struct ProcessFn<P> {
    f: P,
}

impl<P> ProcessFn<P> {
    /// Wraps a closure.
    pub fn new(f: P) -> Self {
        Self { f }
    }

    /// Wraps a closure and returns it as a shared handle.
    pub fn arc(f: P) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<T, F, P, Fut> Process<T, F> for ProcessFn<P>
where
    T: Send + 'static,
    F: Send + 'static,
    P: Fn(T, FeedbackWriter<F>, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    async fn process(
        &self,
        item: T,
        feedback: &FeedbackWriter<F>,
        ctx: CancellationToken,
    ) -> Result<(), TaskError> {
        (self.f)(item, feedback.clone(), ctx).await
    }
}
