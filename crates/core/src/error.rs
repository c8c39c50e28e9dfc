//! Core error types for Chronicle.
//!
//! Every public operation in the system returns `Result<T, Error>`. Integrity
//! findings (a broken chain, a checksum mismatch) are *not* errors — they are
//! data carried in a successful result, because detecting tampering is the
//! expected, correct behavior of verification.

use thiserror::Error;

/// All Chronicle core errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Input rejected before any I/O (bad limits, missing ids, empty worlds)
    #[error("validation error: {0}")]
    Validation(String),

    /// Entity not found (event, snapshot, RNG context)
    #[error("not found: {0}")]
    NotFound(String),

    /// Serialization or deserialization failure
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Storage-layer failure (journal write, recovery)
    #[error("storage error: {0}")]
    Storage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (bug or invariant violation)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for Chronicle core operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if this is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
