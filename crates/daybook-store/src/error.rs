//! # Store Error Types
//!
//! Errors raised while reading, locking, or writing the data file, plus the
//! caller-facing error the transport layer renders.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  ValidationError (bad field)  ─┐                                        │
//! │  CoreError (no such day)      ─┼──► StoreError ──► ServiceError         │
//! │  io::Error (lock / write)     ─┘                   { code, message }    │
//! │                                                         │               │
//! │                                                         ▼               │
//! │                                  transport picks a status from          │
//! │                                  ServiceError::status_hint()            │
//! │                                                                         │
//! │  Reads degrade to an empty ledger; writes refuse an unreadable file.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use std::path::Path;
use thiserror::Error;

use daybook_core::{CoreError, ValidationError};

/// Store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The existing data file could not be read.
    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The existing data file is not a JSON object.
    ///
    /// ## When This Occurs
    /// - Truncated or hand-edited file
    /// - Something other than this store wrote to the path
    ///
    /// Writes refuse to proceed so the file is never replaced by a ledger
    /// that could not see its contents.
    #[error("Data file {path} is malformed: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The sidecar lock file could not be opened or locked.
    #[error("Failed to lock {path}: {source}")]
    LockFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing or replacing the data file failed.
    ///
    /// ## When This Occurs
    /// - Data directory missing or read-only
    /// - Disk full
    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The ledger could not be encoded.
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A domain rule rejected the operation.
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl StoreError {
    pub(crate) fn read_failed(path: &Path, source: std::io::Error) -> Self {
        StoreError::ReadFailed {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn corrupt(path: &Path, source: serde_json::Error) -> Self {
        StoreError::Corrupt {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn lock_failed(path: &Path, source: std::io::Error) -> Self {
        StoreError::LockFailed {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn write_failed(path: &Path, source: std::io::Error) -> Self {
        StoreError::WriteFailed {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Service Error
// =============================================================================

/// Error returned to whoever handed us the request.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Reservation not found"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    #[serde(skip)]
    status: u16,
}

/// Error codes for service responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Missing or malformed fields (400)
    InvalidRequest,

    /// Verification target absent or already verified (404)
    NotFound,

    /// Data file could not be written (500)
    IoFailure,

    /// Unknown action (400) or method (405)
    UnsupportedOperation,
}

impl ServiceError {
    fn new(code: ErrorCode, status: u16, message: impl Into<String>) -> Self {
        ServiceError {
            code,
            message: message.into(),
            status,
        }
    }

    /// Creates an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::InvalidRequest, 400, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::NotFound, 404, message)
    }

    /// Creates an I/O failure error.
    pub fn io_failure(message: impl Into<String>) -> Self {
        ServiceError::new(ErrorCode::IoFailure, 500, message)
    }

    /// Creates an error for an action name nobody handles.
    pub fn unsupported_action(action: &str) -> Self {
        ServiceError::new(
            ErrorCode::UnsupportedOperation,
            400,
            format!("Invalid action: {}", action),
        )
    }

    /// Creates an error for a request method nobody handles.
    pub fn method_not_allowed(method: &str) -> Self {
        ServiceError::new(
            ErrorCode::UnsupportedOperation,
            405,
            format!("Method not allowed: {}", method),
        )
    }

    /// The HTTP status a transport would typically map this to.
    #[inline]
    pub fn status_hint(&self) -> u16 {
        self.status
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::invalid_request(err.to_string())
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DayNotFound(_) | CoreError::ReservationNotFound(_) => {
                ServiceError::not_found(err.to_string())
            }
            CoreError::Validation(e) => e.into(),
        }
    }
}

/// Converts store errors to service errors.
impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Core(e) => e.into(),
            StoreError::ReadFailed { .. } | StoreError::Corrupt { .. } => {
                tracing::error!(error = %err, "Refusing to overwrite unreadable data file");
                ServiceError::io_failure("Existing sales data is unreadable; nothing was saved")
            }
            StoreError::LockFailed { .. } | StoreError::WriteFailed { .. } => {
                // Log the actual error but return a generic message
                tracing::error!(error = %err, "Data file write failed");
                ServiceError::io_failure("Failed to save sales data")
            }
            StoreError::Serialization(e) => {
                tracing::error!(error = %e, "Ledger serialization failed");
                ServiceError::io_failure("Failed to save sales data")
            }
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ServiceError {}

// =============================================================================
// Unit Tests
// =============================================================================
