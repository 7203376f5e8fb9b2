use std::sync::Arc;

use crate::{
    core::{config::Config, executor::Executor},
    error::RuntimeError,
    subscribers::Subscribe,
    tasks::PoolSpec,
};

/// Builder for an [`Executor`] with custom configuration and event subscribers.
///
/// ```rust
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use poolvisor::{
///     Config, Executor, FailurePolicy, FeedbackFn, FeedbackWriter, PoolSpec, ProcessFn,
///     SinkMode, TaskError, TaskSource,
/// };
///
/// let spec = PoolSpec::new(
///     2,
///     ProcessFn::arc(|s: String, fb: FeedbackWriter<usize>, _ctx: CancellationToken| async move {
///         fb.write(s.len());
///         Ok::<_, TaskError>(())
///     }),
///     FeedbackFn::new(|_len: usize| async move { Ok::<_, TaskError>(()) }),
///     TaskSource::iter(vec!["a".to_string(), "bb".to_string()]),
/// );
///
/// let exec = Executor::builder(spec)
///     .with_config(Config {
///         sink: SinkMode::Detached,
///         failure: FailurePolicy::Retry { max_retries: 2 },
///         timeout: Duration::from_secs(1),
///         ..Config::default()
///     })
///     .build()
///     .unwrap();
/// assert_eq!(exec.workers(), 2);
/// ```
pub struct ExecutorBuilder<T, F> {
    spec: PoolSpec<T, F>,
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl<T, F> ExecutorBuilder<T, F>
where
    T: Clone + Send + 'static,
    F: Send + 'static,
{
    /// Creates a builder with the default [`Config`] and no subscribers.
    pub fn new(spec: PoolSpec<T, F>) -> Self {
        Self {
            spec,
            cfg: Config::default(),
            subscribers: Vec::new(),
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets event subscribers.
    ///
    /// Subscribers receive pool events through dedicated workers with bounded queues;
    /// in barrier mode every queued event is delivered before `perform` returns.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one event subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Validates the specification and configuration and builds the executor.
    ///
    /// Nothing is spawned here; a rejected pool leaves no task behind.
    pub fn build(self) -> Result<Executor<T, F>, RuntimeError> {
        if self.spec.workers() == 0 {
            return Err(RuntimeError::InvalidConfig {
                reason: "workers must be at least 1".into(),
            });
        }
        let factor = self.cfg.backoff.factor;
        if !factor.is_finite() || factor < 0.0 {
            return Err(RuntimeError::InvalidConfig {
                reason: format!("backoff factor must be finite and non-negative, got {factor}"),
            });
        }
        if self.cfg.backoff.first > self.cfg.backoff.max {
            tracing::warn!(
                first = ?self.cfg.backoff.first,
                max = ?self.cfg.backoff.max,
                "backoff first delay exceeds max; delays are clamped"
            );
        }
        Ok(Executor::assemble(self.cfg, self.spec, self.subscribers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policies::BackoffPolicy;
    use crate::tasks::{FeedbackFn, FeedbackWriter, ProcessFn, TaskSource};
    use crate::TaskError;
    use tokio_util::sync::CancellationToken;

    fn spec(workers: usize) -> PoolSpec<u8, u8> {
        PoolSpec::new(
            workers,
            ProcessFn::arc(|_n: u8, _fb: FeedbackWriter<u8>, _ctx: CancellationToken| async move {
                Ok::<_, TaskError>(())
            }),
            FeedbackFn::new(|_n: u8| async move { Ok::<_, TaskError>(()) }),
            TaskSource::empty(),
        )
    }

    #[test]
    fn zero_workers_rejected() {
        let err = ExecutorBuilder::new(spec(0)).build().err().unwrap();
        assert_eq!(err.as_label(), "runtime_invalid_config");
    }

    #[test]
    fn nan_backoff_factor_rejected() {
        let cfg = Config {
            backoff: BackoffPolicy {
                factor: f64::NAN,
                ..BackoffPolicy::default()
            },
            ..Config::default()
        };
        let res = ExecutorBuilder::new(spec(1)).with_config(cfg).build();
        assert!(matches!(res, Err(RuntimeError::InvalidConfig { .. })));
    }

    #[test]
    fn builds_without_runtime() {
        let exec = ExecutorBuilder::new(spec(4)).build().unwrap();
        assert_eq!(exec.workers(), 4);
    }
}
