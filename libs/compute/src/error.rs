//! Error types for compute API calls and behaviors.

use roast_net::NetworkError;
use roast_poll::PollError;
use thiserror::Error;

/// Errors from the compute API and the behaviors built on it.
#[derive(Debug, Error)]
pub enum ComputeError {
    /// Client construction failed.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),

    /// A call succeeded with a different status code than the caller expected.
    #[error("unexpected status code: expected {expected}, got {actual}")]
    UnexpectedStatusCode { expected: u16, actual: u16 },

    /// The API refused the action because another one is in flight or the
    /// server's state does not allow it (HTTP 409).
    #[error("action in progress: {message}")]
    ActionInProgress { message: String },

    /// The resource does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other error response.
    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        message: String,
        request_id: Option<String>,
    },

    /// The request never got a response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// A status wait did not complete.
    #[error(transparent)]
    Wait(#[from] PollError),

    /// Address selection or remote access failed.
    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl ComputeError {
    /// Create an API error from response details.
    pub fn api(status: u16, message: impl Into<String>, request_id: Option<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
            request_id,
        }
    }

    /// Returns true if the API reported a conflicting action.
    pub fn is_action_in_progress(&self) -> bool {
        matches!(self, Self::ActionInProgress { .. })
    }

    /// Returns true if the resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
