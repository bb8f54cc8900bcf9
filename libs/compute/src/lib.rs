//! # roast-compute
//!
//! Client side of the compute control-plane API.
//!
//! - [`ComputeClient`]: the operations scenarios perform (create, get,
//!   delete, pause/unpause, suspend/resume, reboot)
//! - [`HttpComputeClient`]: the REST implementation
//! - [`ServerBehaviors`]: composite operations such as "create and wait for
//!   ACTIVE" and "wait for status"
//!
//! Any `Arc<dyn ComputeClient>` is a [`roast_poll::StatusSource`], so the
//! generic verifiers can poll it directly.

mod behaviors;
mod client;
mod error;
mod http;
mod types;

pub use behaviors::{BehaviorSettings, ServerBehaviors, ACCEPTED};
pub use client::ComputeClient;
pub use error::ComputeError;
pub use http::{HttpComputeClient, AUTH_TOKEN_HEADER};
pub use types::*;
