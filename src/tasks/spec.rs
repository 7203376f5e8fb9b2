//! # Pool specification.
//!
//! [`PoolSpec`] bundles what one run needs: worker count, processor, feedback handler
//! and task source. It is moved into the executor, so nothing can change it once
//! `perform` begins.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use poolvisor::{FeedbackFn, FeedbackWriter, PoolSpec, ProcessFn, TaskError, TaskSource};
//!
//! let spec = PoolSpec::new(
//!     4,
//!     ProcessFn::arc(|n: u32, fb: FeedbackWriter<u32>, _ctx: CancellationToken| async move {
//!         fb.write(n * n);
//!         Ok::<_, TaskError>(())
//!     }),
//!     FeedbackFn::new(|sq: u32| async move {
//!         println!("{sq}");
//!         Ok::<_, TaskError>(())
//!     }),
//!     TaskSource::iter(1..=10),
//! );
//! assert_eq!(spec.workers(), 4);
//! ```

use crate::tasks::feedback::Feedback;
use crate::tasks::process::ProcessorRef;
use crate::tasks::source::TaskSource;

/// Immutable description of one pool run.
pub struct PoolSpec<T, F> {
    workers: usize,
    processor: ProcessorRef<T, F>,
    feedback: Box<dyn Feedback<F>>,
    source: TaskSource<T>,
}

/// Owned pieces of a [`PoolSpec`], taken apart by the executor.
pub(crate) struct SpecParts<T, F> {
    pub workers: usize,
    pub processor: ProcessorRef<T, F>,
    pub feedback: Box<dyn Feedback<F>>,
    pub source: TaskSource<T>,
}

impl<T, F> PoolSpec<T, F>
where
    T: Send + 'static,
    F: Send + 'static,
{
    /// Creates a specification.
    ///
    /// `workers` must be at least 1; the executor rejects `0` before spawning anything.
    pub fn new(
        workers: usize,
        processor: ProcessorRef<T, F>,
        feedback: impl Feedback<F>,
        source: TaskSource<T>,
    ) -> Self {
        Self {
            workers,
            processor,
            feedback: Box::new(feedback),
            source,
        }
    }

    /// Number of workers to spawn (and termination markers to send).
    pub fn workers(&self) -> usize {
        self.workers
    }

    pub(crate) fn into_parts(self) -> SpecParts<T, F> {
        SpecParts {
            workers: self.workers,
            processor: self.processor,
            feedback: self.feedback,
            source: self.source,
        }
    }
}
