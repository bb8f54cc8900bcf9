//! Scenario failures.

use roast_compute::ComputeError;
use roast_events::{EventAssertionError, EventStoreError};
use roast_poll::PollError;
use thiserror::Error;

/// Why a scenario failed.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Compute(#[from] ComputeError),

    #[error(transparent)]
    Wait(#[from] PollError),

    #[error(transparent)]
    EventStore(#[from] EventStoreError),

    #[error(transparent)]
    EventAssertion(#[from] EventAssertionError),

    /// The scenario needs an event store and none is configured.
    #[error("no event store configured (set ROAST_EVENTS_URL)")]
    MissingEventStore,

    /// An action that must be refused was accepted.
    #[error("expected {action} to be refused as in progress, but it returned {status}")]
    ExpectedConflict { action: String, status: u16 },
}
