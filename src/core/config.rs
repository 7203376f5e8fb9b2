//! # Executor configuration.
//!
//! [`Config`] holds the knobs that are not part of *what* a run does
//! ([`PoolSpec`](crate::PoolSpec)) but *how* the executor behaves around it.
//!
//! ## Sentinel values
//! - `timeout = 0s` → no per-item timeout
//! - `grace = 0s` → barrier mode waits for the sink without limit

use std::time::Duration;

use crate::policies::{BackoffPolicy, FailurePolicy};

/// What `perform` does with the feedback sink after sending its termination marker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SinkMode {
    /// Join the sink before returning: every feedback message has been handled
    /// once `perform` returns (default).
    #[default]
    Barrier,
    /// Return right after sending the marker; the sink keeps draining its backlog.
    /// Its join handle is handed back in [`PoolReport`](crate::PoolReport).
    Detached,
}

/// Executor configuration.
///
/// ## Field semantics
/// - `sink`: barrier or fire-and-forget completion of the feedback sink
/// - `grace`: maximum wait for the sink in barrier mode (`0s` = unlimited)
/// - `failure`: what a worker does after an item fails
/// - `backoff`: delays between retries of the same item
/// - `timeout`: per-item attempt timeout (`0s` = none)
/// - `bus_capacity`: event bus ring buffer size (min 1)
#[derive(Clone, Debug)]
pub struct Config {
    /// Feedback sink completion mode.
    pub sink: SinkMode,

    /// Maximum time to wait for the feedback sink to drain in [`SinkMode::Barrier`].
    ///
    /// When exceeded the sink is aborted and `perform` returns
    /// `RuntimeError::GraceExceeded`.
    pub grace: Duration,

    /// Worker reaction to a failed item.
    pub failure: FailurePolicy,

    /// Retry delays, used with [`FailurePolicy::Retry`].
    pub backoff: BackoffPolicy,

    /// Per-item attempt timeout.
    ///
    /// On expiry the attempt's cancellation token fires and the attempt fails with
    /// `TaskError::Timeout`.
    pub timeout: Duration,

    /// Capacity of the event bus ring buffer.
    ///
    /// A listener that lags behind more than `bus_capacity` events skips the oldest ones.
    pub bus_capacity: usize,
}

impl Config {
    /// Returns the per-item timeout as an `Option`.
    #[inline]
    pub fn item_timeout(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Returns the sink grace period as an `Option` (`None` = unlimited).
    #[inline]
    pub fn sink_grace(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `sink = Barrier`
    /// - `grace = 60s`
    /// - `failure = Skip`
    /// - `backoff = BackoffPolicy::default()`
    /// - `timeout = 0s` (none)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            sink: SinkMode::default(),
            grace: Duration::from_secs(60),
            failure: FailurePolicy::default(),
            backoff: BackoffPolicy::default(),
            timeout: Duration::ZERO,
            bus_capacity: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sentinels_mean_none() {
        let cfg = Config {
            grace: Duration::ZERO,
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.item_timeout(), None);
        assert_eq!(cfg.sink_grace(), None);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }

    #[test]
    fn defaults_join_the_sink() {
        let cfg = Config::default();
        assert_eq!(cfg.sink, SinkMode::Barrier);
        assert_eq!(cfg.sink_grace(), Some(Duration::from_secs(60)));
        assert_eq!(cfg.failure, FailurePolicy::Skip);
    }
}
