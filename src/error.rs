//! Error types used by the executor, its workers and the channels between them.
//!
//! This module defines three enums:
//!
//! - [`RuntimeError`]: errors raised by the orchestrator itself.
//! - [`TaskError`]: outcome of one processor or feedback-handler call.
//! - [`ChannelError`]: a send on a channel whose receiving side is gone.
//!
//! `RuntimeError` and `TaskError` provide helper methods (`as_label`, `as_message`)
//! for logs and events, plus [`TaskError::is_retryable`].

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the executor.
///
/// These represent failures of the pool lifecycle, not of individual items.
/// A failed item never turns into a `RuntimeError`; it is reported through
/// events and [`PoolReport`](crate::PoolReport).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The pool specification was rejected before anything was spawned.
    #[error("invalid pool configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// The task source yielded an error; feeding stopped after `fed` items.
    ///
    /// Workers and the feedback sink were still shut down and joined.
    #[error("task source failed after {fed} items: {error}")]
    SourceFailed {
        /// The underlying error message.
        error: String,
        /// Number of items sent before the failure.
        fed: u64,
    },

    /// A channel owned by the executor refused a message.
    #[error("{channel} channel closed")]
    ChannelClosed {
        /// Which channel: `"input"` or `"feedback"`.
        channel: &'static str,
    },

    /// The feedback sink did not finish draining within the grace period and was aborted.
    #[error("feedback sink did not drain within {grace:?}; aborted")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
    },

    /// The feedback sink task could not be joined; its report is lost.
    #[error("feedback sink crashed: {error}")]
    SinkCrashed {
        /// The join error message.
        error: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/events.
    ///
    /// # Example
    /// ```
    /// use poolvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5) };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::InvalidConfig { .. } => "runtime_invalid_config",
            RuntimeError::SourceFailed { .. } => "runtime_source_failed",
            RuntimeError::ChannelClosed { .. } => "runtime_channel_closed",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::SinkCrashed { .. } => "runtime_sink_crashed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::InvalidConfig { reason } => format!("invalid config: {reason}"),
            RuntimeError::SourceFailed { error, fed } => {
                format!("source failed after {fed} items: {error}")
            }
            RuntimeError::ChannelClosed { channel } => format!("{channel} channel closed"),
            RuntimeError::GraceExceeded { grace } => {
                format!("sink grace exceeded after {grace:?}")
            }
            RuntimeError::SinkCrashed { error } => format!("sink crashed: {error}"),
        }
    }
}

/// # Outcome of processing one item or handling one feedback message.
///
/// Processors and feedback handlers return `Result<(), TaskError>`.
/// `Fail` and `Timeout` may be retried by [`FailurePolicy::Retry`](crate::FailurePolicy);
/// `Fatal` always stops the worker that produced it.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Processing exceeded the configured per-item timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Non-recoverable error; the worker stops after reporting it.
    #[error("fatal error (worker stops): {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Processing failed but may succeed if retried.
    #[error("processing failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The processor or handler panicked; the panic was caught.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`TaskError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        TaskError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/events.
    ///
    /// # Example
    /// ```
    /// use poolvisor::TaskError;
    /// use std::time::Duration;
    ///
    /// let err = TaskError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "task_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Panicked { .. } => "task_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            TaskError::Fatal { error } => format!("fatal: {error}"),
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Panicked { info } => format!("panic: {info}"),
        }
    }

    /// Indicates whether the error type is safe to retry.
    ///
    /// Returns `true` for [`TaskError::Fail`] and [`TaskError::Timeout`].
    ///
    /// # Example
    /// ```
    /// use poolvisor::TaskError;
    ///
    /// assert!(TaskError::fail("boom").is_retryable());
    /// assert!(!TaskError::fatal("nope").is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::Fail { .. } | TaskError::Timeout { .. })
    }

    /// Indicates whether the error must stop the worker regardless of policy.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TaskError::Fatal { .. })
    }
}

/// Error returned when sending on a channel whose receivers are all gone.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelError {
    /// No receiver is left to take the message.
    #[error("channel closed")]
    Closed,
}
