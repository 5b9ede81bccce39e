//! # Error Types
//!
//! Domain-specific error types for daybook-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  daybook-core errors (this file)                                       │
//! │  ├── CoreError        - Domain rule failures                           │
//! │  └── ValidationError  - Malformed caller input                         │
//! │                                                                         │
//! │  daybook-store errors (separate crate)                                 │
//! │  ├── StoreError       - File / lock failures                           │
//! │  └── ServiceError     - What the transport renders (code + message)    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → StoreError → ServiceError         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// No aggregate exists yet for the requested date.
    ///
    /// ## When This Occurs
    /// - `update_verification` on a date nothing was ever recorded for
    #[error("No reservations recorded for {0}")]
    DayNotFound(String),

    /// No list entry matched a verification lookup.
    #[error("Reservation not found: {0}")]
    ReservationNotFound(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised while normalizing loosely typed request fields into a
/// [`crate::ReservationRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. a date that is not YYYY-MM-DD).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value has the wrong JSON type.
    #[error("{field} must be {expected}")]
    WrongType { field: String, expected: String },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub(crate) fn wrong_type(field: &str, expected: &str) -> Self {
        ValidationError::WrongType {
            field: field.to_string(),
            expected: expected.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
