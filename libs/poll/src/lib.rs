//! Fixed-interval polling primitives.
//!
//! This library provides the waits a lifecycle scenario is built from:
//!
//! - **retry_until**: re-evaluate a condition every `interval` until it
//!   holds or `timeout` elapses.
//! - **StateTransitionVerifier**: wait for a resource's status label to reach
//!   an expected value.
//! - **ReachabilityVerifier**: wait for an address to become reachable or
//!   unreachable.
//!
//! # Invariants
//!
//! - Polling never backs off; the interval is fixed per call site
//! - A condition that holds within `timeout` is observed by
//!   `timeout + interval` at the latest
//! - A timeout always carries the last observed value
//! - Errors from the underlying accessor are never retried

use std::time::Duration;

mod error;
mod reachability;
mod retry;
mod state;

pub use error::PollError;
pub use reachability::{Reachability, ReachabilityProbe, ReachabilityVerifier};
pub use retry::{retry_until, Observation};
pub use state::{StateTransitionVerifier, StatusSource};

/// Default interval between reachability probes.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(5);

/// Default maximum wait for a reachability change.
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(60);

/// Default interval between status queries.
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(5);

/// Default maximum wait for a status transition.
pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(600);

/// Intervals shorter than this are raised to it so a loop cannot spin.
pub const MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Timeout and interval for one poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Maximum wall-clock time to wait for the condition.
    pub timeout: Duration,

    /// Fixed delay between attempts.
    pub interval: Duration,
}

impl PollConfig {
    /// Create a poll configuration.
    pub const fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Timing used when waiting on an address to change reachability.
    pub const fn reachability() -> Self {
        Self::new(DEFAULT_PING_TIMEOUT, DEFAULT_PING_INTERVAL)
    }

    /// Timing used when waiting on a status transition.
    pub const fn status() -> Self {
        Self::new(DEFAULT_STATUS_TIMEOUT, DEFAULT_STATUS_INTERVAL)
    }

    /// The interval actually slept between attempts.
    pub fn effective_interval(&self) -> Duration {
        self.interval.max(MIN_INTERVAL)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::status()
    }
}
