//! Unified error type for Chronicle.
//!
//! Wraps the internal layer errors and presents one stable taxonomy to
//! users of the facade.

use thiserror::Error;

/// All Chronicle errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Entity not found (event, snapshot, RNG context, world)
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid input (bad event type, negative retention, empty world)
    #[error("validation error: {0}")]
    Validation(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Storage error (journal damage, write failure)
    #[error("storage error: {0}")]
    Storage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (bug or invariant violation)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for Chronicle operations.
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

    /// Check if this is a serious/unrecoverable error.
    pub fn is_serious(&self) -> bool {
        matches!(self, Error::Internal(_) | Error::Storage(_))
    }
}

impl From<chronicle_core::Error> for Error {
    fn from(e: chronicle_core::Error) -> Self {
        use chronicle_core::Error as CoreError;
        match e {
            CoreError::NotFound(msg) => Error::NotFound(msg),
            CoreError::Validation(msg) => Error::Validation(msg),
            CoreError::Serialization(msg) => Error::Serialization(msg),
            CoreError::Storage(msg) => Error::Storage(msg),
            CoreError::Io(io_err) => Error::Io(io_err),
            CoreError::Internal(msg) => Error::Internal(msg),
        }
    }
}
