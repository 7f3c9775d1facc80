//! # Error Types
//!
//! Domain-specific error types for rigshare-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  rigshare-core errors (this file)                                      │
//! │  ├── CoreError        - Marketplace rule violations                    │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  rigshare-state errors                                                 │
//! │  └── StateError       - Store + persistence failures                   │
//! │                                                                         │
//! │  rigshare-db errors                                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  apps/api errors                                                       │
//! │  └── ApiError         - What HTTP clients see ({"error": ...})         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StateError/DbError → ApiError     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::RentalStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Marketplace rule violations.
///
/// Every store operation fails fast with one of these. Callers translate them
/// into a visible message; none of them is a reason to crash.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// No user id was supplied for an operation that needs one.
    #[error("Not authenticated")]
    Unauthenticated,

    /// The requester does not own the entity.
    ///
    /// ## When This Occurs
    /// - Editing or deleting another user's listing
    /// - Editing or deleting another user's review
    #[error("User {requester} is not allowed to modify {entity} {id}")]
    Unauthorized {
        entity: String,
        id: String,
        requester: String,
    },

    /// The requester lacks authority for a rental status change.
    ///
    /// ## When This Occurs
    /// ```text
    /// renter tries pending → approved   → Forbidden
    /// stranger tries approved → completed → Forbidden
    /// ```
    #[error("User {requester} may not mark rental request {request_id} as {status}")]
    Forbidden {
        request_id: String,
        requester: String,
        status: RentalStatus,
    },

    /// Entity id is absent.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Rental end date precedes the start date.
    #[error("Invalid rental range: {end} is before {start}")]
    InvalidRange { start: String, end: String },

    /// A user tried to rent their own equipment.
    #[error("Owners cannot rent their own equipment")]
    SelfRental,

    /// The rental state machine has no such edge.
    #[error("Cannot move rental request from {from} to {to}")]
    InvalidTransition {
        from: RentalStatus,
        to: RentalStatus,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an Unauthorized error.
    pub fn unauthorized(
        entity: impl Into<String>,
        id: impl Into<String>,
        requester: impl Into<String>,
    ) -> Self {
        CoreError::Unauthorized {
            entity: entity.into(),
            id: id.into(),
            requester: requester.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., unknown filter chip, malformed URI).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::Forbidden {
            request_id: "r-1".to_string(),
            requester: "u-2".to_string(),
            status: RentalStatus::Approved,
        };
        assert_eq!(
            err.to_string(),
            "User u-2 may not mark rental request r-1 as approved"
        );

        let err = CoreError::InvalidTransition {
            from: RentalStatus::Completed,
            to: RentalStatus::Pending,
        };
        assert_eq!(
            err.to_string(),
            "Cannot move rental request from completed to pending"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::OutOfRange {
            field: "rating".to_string(),
            min: 1,
            max: 5,
        };
        assert_eq!(err.to_string(), "rating must be between 1 and 5");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "content".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
