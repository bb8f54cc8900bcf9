//! ID parsing errors.

use thiserror::Error;

/// Why a string is not a valid ID.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("ID cannot be empty")]
    Empty,

    /// Whitespace, control characters and URL delimiters would corrupt the
    /// request path the ID is embedded in.
    #[error("invalid character {found:?} in ID '{id}'")]
    InvalidCharacter { id: String, found: char },

    #[error("expected '{expected}_' prefix, got '{actual}'")]
    InvalidPrefix {
        expected: &'static str,
        actual: String,
    },

    #[error("generated ID has no '_' separator")]
    MissingSeparator,

    #[error("invalid ULID: {0}")]
    InvalidUlid(String),
}
