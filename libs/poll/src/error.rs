//! Error types for poll loops.

use std::time::Duration;

use thiserror::Error;

/// Boxed error from the accessor a poll loop queries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Poll loop failures.
#[derive(Debug, Error)]
pub enum PollError {
    /// The condition did not hold before the deadline.
    #[error(
        "timeout after {elapsed:?} ({attempts} attempts) waiting for {what}; last observed: {}",
        last_observed.as_deref().unwrap_or("nothing")
    )]
    Timeout {
        what: String,
        elapsed: Duration,
        attempts: u32,
        last_observed: Option<String>,
    },

    /// A state was observed from which the expected one cannot be reached.
    #[error("{what}: reached {observed}, which ends the wait")]
    UnexpectedState { what: String, observed: String },

    /// The accessor itself failed.
    #[error("{what}: {source}")]
    Source {
        what: String,
        #[source]
        source: BoxError,
    },
}

impl PollError {
    /// Returns true if the loop ran out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// The last value observed before the loop gave up, if any.
    pub fn last_observed(&self) -> Option<&str> {
        match self {
            Self::Timeout { last_observed, .. } => last_observed.as_deref(),
            Self::UnexpectedState { observed, .. } => Some(observed),
            Self::Source { .. } => None,
        }
    }

    /// Downcast the accessor error, if this is a source failure of type `E`.
    pub fn source_as<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::Source { source, .. } => source.downcast_ref::<E>(),
            _ => None,
        }
    }
}
