//! # State Errors
//!
//! Everything a store operation can fail with.
//!
//! ```text
//! CoreError ──────────┐
//! std::io::Error ─────┼──► StateError ──► shown to the user as a message
//! serde_json::Error ──┤
//! backend failure ────┘
//! ```

use rigshare_core::{CoreError, ValidationError};
use thiserror::Error;

/// Store and persistence errors.
#[derive(Debug, Error)]
pub enum StateError {
    /// A marketplace rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Reading or writing the backing files failed.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted collection could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other backend failure (e.g. a poisoned lock).
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<ValidationError> for StateError {
    fn from(err: ValidationError) -> Self {
        StateError::Core(CoreError::Validation(err))
    }
}

impl StateError {
    /// The domain error, if this is one.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            StateError::Core(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type for store operations.
pub type StateResult<T> = Result<T, StateError>;
