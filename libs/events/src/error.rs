//! Error types for event records.

use thiserror::Error;

/// Errors that can occur when querying the event store.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// Client construction failed.
    #[error("invalid event store configuration: {0}")]
    InvalidConfig(String),

    /// The store answered with an error status.
    #[error("event store returned {status} for {what}")]
    Status { status: u16, what: String },

    /// The request never got a response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body could not be decoded.
    #[error("invalid event payload: {0}")]
    InvalidPayload(String),
}

impl From<serde_json::Error> for EventStoreError {
    fn from(err: serde_json::Error) -> Self {
        EventStoreError::InvalidPayload(err.to_string())
    }
}

/// One field whose recorded value is wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMismatch {
    pub field: &'static str,
    pub expected: String,
    pub actual: String,
}

impl std::fmt::Display for FieldMismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: expected {}, got {}",
            self.field, self.expected, self.actual
        )
    }
}

/// A lifecycle assertion about recorded events failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EventAssertionError {
    /// Wrong number of records of a kind.
    #[error("expected {expected} {kind} entries for {instance}, found {actual}")]
    Count {
        kind: &'static str,
        instance: String,
        expected: usize,
        actual: usize,
    },

    /// Required attributes are missing from a record.
    #[error("{kind} entry for {instance} is missing {}", missing.join(", "))]
    MissingAttributes {
        kind: &'static str,
        instance: String,
        missing: Vec<&'static str>,
    },

    /// Recorded values differ from the server's.
    #[error(
        "{kind} entry for {instance} has wrong values: {}",
        mismatches.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
    )]
    Mismatch {
        kind: &'static str,
        instance: String,
        mismatches: Vec<FieldMismatch>,
    },
}
