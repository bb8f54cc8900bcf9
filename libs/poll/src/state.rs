//! Waiting for a resource to reach a status label.

use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::retry::{retry_until, Observation};
use crate::{PollConfig, PollError};

/// Read access to a resource's current status label.
#[async_trait]
pub trait StatusSource: Send + Sync {
    /// Identifier of the resource being queried.
    type Id: Display + Send + Sync + ?Sized;

    /// Status label type.
    type State: PartialEq + Display + Send + Sync;

    /// Accessor failure.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Query the resource's status once.
    async fn current_status(&self, id: &Self::Id) -> Result<Self::State, Self::Error>;
}

#[async_trait]
impl<T: StatusSource + ?Sized> StatusSource for Arc<T> {
    type Id = T::Id;
    type State = T::State;
    type Error = T::Error;

    async fn current_status(&self, id: &Self::Id) -> Result<Self::State, Self::Error> {
        (**self).current_status(id).await
    }
}

/// Blocks until a resource reports an expected status.
#[derive(Debug, Clone)]
pub struct StateTransitionVerifier<S> {
    source: S,
}

impl<S: StatusSource> StateTransitionVerifier<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Wait until `id` reports `expected`.
    ///
    /// Fails with [`PollError::Timeout`] carrying the last observed status if
    /// `config.timeout` elapses first.
    pub async fn wait_for_state(
        &self,
        id: &S::Id,
        expected: &S::State,
        config: &PollConfig,
    ) -> Result<(), PollError> {
        self.wait_for_state_unless(id, expected, &[], config).await
    }

    /// Wait until `id` reports `expected`, failing early on any `terminal`
    /// status.
    ///
    /// A terminal status equal to `expected` is treated as a match.
    pub async fn wait_for_state_unless(
        &self,
        id: &S::Id,
        expected: &S::State,
        terminal: &[S::State],
        config: &PollConfig,
    ) -> Result<(), PollError> {
        let what = format!("{id} to reach {expected}");
        info!(
            resource = %id,
            expected = %expected,
            timeout_secs = config.timeout.as_secs(),
            interval_secs = config.interval.as_secs(),
            "Waiting for status"
        );

        retry_until(config, &what, move || async move {
            let observed = self.source.current_status(id).await?;
            let observation = if &observed == expected {
                Observation::Matched(())
            } else if terminal.contains(&observed) {
                Observation::Failed(observed.to_string())
            } else {
                Observation::Pending(observed.to_string())
            };
            Ok::<_, S::Error>(observation)
        })
        .await?;

        info!(resource = %id, status = %expected, "Status reached");
        Ok(())
    }
}
