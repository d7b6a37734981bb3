//! # Run configuration.
//!
//! Provides [`Config`] centralized settings for a simulation run.
//!
//! ## Sentinel values
//! - `run_for = 0s` → no deadline (runs until a signal or an external cancel)
//! - `grace = 0s` → hard stop: abort every component as soon as cancellation is broadcast

use std::time::Duration;

use crate::error::RuntimeError;

/// Configuration for one simulation run.
///
/// ## Field semantics
/// - `counters`: number of service counters (workers), fixed for the run
/// - `run_for`: wall-clock run duration (`0s` = no deadline)
/// - `token_period`: interval between generated tokens
/// - `service_time`: simulated service duration per token
/// - `grace`: how long a cancelled run waits for in-flight services (`0s` = hard stop)
/// - `handle_signals`: whether SIGINT/SIGTERM/Ctrl-C trigger shutdown
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of service counters.
    pub counters: usize,

    /// Total run duration before cancellation is broadcast.
    pub run_for: Duration,

    /// Interval between two generated tokens. The first token is emitted immediately.
    pub token_period: Duration,

    /// Simulated service duration per token.
    pub service_time: Duration,

    /// Maximum time to wait for counters to finish in-flight services after cancellation.
    ///
    /// Counters still running after `grace` are aborted and reported as interrupted.
    pub grace: Duration,

    /// Listen for OS termination signals while running.
    pub handle_signals: bool,
}

impl Config {
    /// Returns the run deadline as an `Option`.
    ///
    /// - `None` → no deadline
    /// - `Some(d)` → cancel after `d`
    #[inline]
    pub fn deadline(&self) -> Option<Duration> {
        if self.run_for == Duration::ZERO {
            None
        } else {
            Some(self.run_for)
        }
    }

    /// `true` when cancellation aborts components without waiting.
    #[inline]
    pub fn is_hard_stop(&self) -> bool {
        self.grace == Duration::ZERO
    }

    /// Checks the values a run cannot start with.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        let reason = if self.counters == 0 {
            "counters must be at least 1"
        } else if self.token_period == Duration::ZERO {
            "token_period must be greater than zero"
        } else if self.service_time == Duration::ZERO {
            "service_time must be greater than zero"
        } else {
            return Ok(());
        };
        Err(RuntimeError::InvalidConfig {
            reason: reason.to_string(),
        })
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `counters = 3`
    /// - `run_for = 30s`
    /// - `token_period = 1s`
    /// - `service_time = 3s`
    /// - `grace = 5s` (longer than one service, so in-flight tokens drain)
    /// - `handle_signals = true`
    fn default() -> Self {
        Self {
            counters: 3,
            run_for: Duration::from_secs(30),
            token_period: Duration::from_secs(1),
            service_time: Duration::from_secs(3),
            grace: Duration::from_secs(5),
            handle_signals: true,
        }
    }
}
