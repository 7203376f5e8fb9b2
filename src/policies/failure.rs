//! # What a worker does when an item fails.
//!
//! [`FailurePolicy`] decides the fate of a worker after its processor returns an error
//! (or panics) for one item.
//!
//! ```text
//! Exit              → worker stops; its termination marker stays in the input channel
//! Skip              → item counted as failed; worker takes the next item (default)
//! Retry { n }       → same item re-run up to n more times with backoff, then skipped
//! ```
//!
//! `TaskError::Fatal` stops the worker under every policy. `Retry` only re-runs
//! retryable errors (`Fail`, `Timeout`); a panic is skipped right away.

/// Policy applied by a worker to a failed item.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The first failure terminates the worker. The pool keeps running with one fewer worker.
    Exit,
    /// Count the failure and continue with the next item.
    #[default]
    Skip,
    /// Re-run the same item up to `max_retries` additional times, then skip it.
    Retry {
        /// Additional attempts after the first one.
        max_retries: u32,
    },
}

impl FailurePolicy {
    /// Whether a failure on attempt `attempt` (1-based) should be retried.
    pub fn should_retry(&self, attempt: u32, retryable: bool) -> bool {
        match self {
            FailurePolicy::Retry { max_retries } => retryable && attempt <= *max_retries,
            FailurePolicy::Exit | FailurePolicy::Skip => false,
        }
    }

    /// Whether a non-retried failure ends the worker.
    pub fn exits_worker(&self) -> bool {
        matches!(self, FailurePolicy::Exit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_budget_is_additional_attempts() {
        let p = FailurePolicy::Retry { max_retries: 2 };
        assert!(p.should_retry(1, true));
        assert!(p.should_retry(2, true));
        assert!(!p.should_retry(3, true));
        assert!(!p.should_retry(1, false));
    }

    #[test]
    fn exit_and_skip_never_retry() {
        assert!(!FailurePolicy::Exit.should_retry(1, true));
        assert!(!FailurePolicy::Skip.should_retry(1, true));
        assert!(FailurePolicy::Exit.exits_worker());
        assert!(!FailurePolicy::default().exits_worker());
    }
}
