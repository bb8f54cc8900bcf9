//! # roast-id
//!
//! Typed identifiers for the resources roast drives through their lifecycle.
//!
//! ## Design Principles
//!
//! - Resource IDs are assigned by the compute API and are opaque to us; we
//!   only check that they are safe to embed in a URL path
//! - Typed wrappers keep a server ID from being passed where an image or
//!   flavor reference is expected
//! - Request IDs are generated locally so every API call can be correlated
//!   with its log lines
//!
//! ## ID Formats
//!
//! Resource IDs are whatever the API returns, usually a UUID:
//! - `ServerId`: `8c3b5f0e-5f2d-4b1e-9a57-3f0f4f8d2b11`
//!
//! Request IDs use a prefixed ULID: `req_01HV4Z2WQXKJNM8GPQY6VBKC3D`

mod error;
mod macros;
mod types;

pub use error::IdError;
pub use types::*;

/// Re-export ulid for consumers that need raw ULID operations
pub use ulid::Ulid;
