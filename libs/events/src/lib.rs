//! # roast-events
//!
//! Usage records kept by the event-tracking database, and the assertions
//! lifecycle scenarios make about them.
//!
//! ## Record Kinds
//!
//! Each server accumulates records keyed by its instance ID:
//! - **launch**: written when the server first becomes active
//! - **delete**: written when the server is deleted
//! - **exists**: written by periodic usage audits for servers alive during
//!   an audit period
//!
//! A freshly created server must have exactly one launch record and neither
//! delete nor exists records.

mod assertions;
mod error;
mod store;
mod types;

pub use assertions::*;
pub use error::{EventAssertionError, EventStoreError, FieldMismatch};
pub use store::{wait_for_launch, EventStore, HttpEventStore, InMemoryEventStore};
pub use types::*;
