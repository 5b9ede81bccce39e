//! # Validation Module
//!
//! Explicit parsers for the loosely typed fields callers send.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Ingestion Normalization                            │
//! │                                                                         │
//! │  Raw JSON field                 Parser                 Typed value     │
//! │  ──────────────                 ──────                 ───────────     │
//! │  true / "true" / 1        ──►   parse_verified   ──►   true            │
//! │  false / "false" / 0 / ∅  ──►   parse_verified   ──►   false           │
//! │  "yes" / 2 / [..]         ──►   parse_verified   ──►   ValidationError │
//! │                                                                         │
//! │  3 / "3" / ∅              ──►   parse_people     ──►   3 / 3 / 1       │
//! │  0 / -1                   ──►   parse_people     ──►   ValidationError │
//! │                                                                         │
//! │  "2024-03-01" / ∅         ──►   parse_date       ──►   Some / None     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every request field goes through these functions before it reaches
//! [`crate::aggregate`]. Data read back from the file is coerced by
//! [`crate::stored`] instead, which reuses them but never rejects.
//!
//! ## Usage
//! ```rust
//! use daybook_core::validation::{parse_people, parse_verified};
//! use serde_json::json;
//!
//! assert_eq!(parse_verified(Some(&json!("true"))).unwrap(), true);
//! assert_eq!(parse_verified(None).unwrap(), false);
//! assert!(parse_verified(Some(&json!("yes"))).is_err());
//!
//! assert_eq!(parse_people(Some(&json!("3"))).unwrap(), 3);
//! assert_eq!(parse_people(None).unwrap(), 1);
//! ```

use chrono::NaiveDate;
use serde_json::Value;

use crate::error::ValidationError;
use crate::DATE_FORMAT;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Flag Parsers
// =============================================================================

/// Normalizes the `verified` flag.
///
/// ## Rules
/// - `true`, `"true"`, `1` → true
/// - `false`, `"false"`, `0`, `null`, absent → false
/// - Anything else is rejected
pub fn parse_verified(value: Option<&Value>) -> ValidationResult<bool> {
    match value {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(Value::String(s)) => match s.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(verified_error()),
        },
        Some(Value::Number(n)) => match n.as_i64() {
            Some(1) => Ok(true),
            Some(0) => Ok(false),
            _ => Err(verified_error()),
        },
        Some(_) => Err(verified_error()),
    }
}

fn verified_error() -> ValidationError {
    ValidationError::wrong_type("verified", "a boolean, \"true\"/\"false\" or 0/1")
}

// =============================================================================
// Numeric Parsers
// =============================================================================

/// Parses the `people` headcount.
///
/// ## Rules
/// - Absent or `null` defaults to 1
/// - Integers and numeric strings are accepted
/// - Must be positive (> 0)
pub fn parse_people(value: Option<&Value>) -> ValidationResult<u32> {
    let raw = match value {
        None | Some(Value::Null) => return Ok(crate::DEFAULT_PEOPLE),
        Some(v) => integer_field("people", v)?,
    };

    if raw <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "people".to_string(),
        });
    }

    u32::try_from(raw).map_err(|_| ValidationError::InvalidFormat {
        field: "people".to_string(),
        reason: format!("{} is too large", raw),
    })
}

/// Parses a `reservationNumber`.
///
/// Numbers are compared numerically, so `"12"` and `12` are the same
/// reservation. Absent or `null` means the record carries no number.
pub fn parse_reservation_number(value: Option<&Value>) -> ValidationResult<Option<i64>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => integer_field("reservationNumber", v).map(Some),
    }
}

fn integer_field(field: &str, value: &Value) -> ValidationResult<i64> {
    match value {
        Value::Number(n) => n.as_i64().ok_or_else(|| ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("{} is not an integer", n),
        }),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidFormat {
                field: field.to_string(),
                reason: format!("'{}' is not an integer", s),
            }),
        _ => Err(ValidationError::wrong_type(field, "an integer")),
    }
}

// =============================================================================
// Date Parser
// =============================================================================

/// Parses an ISO calendar date (`YYYY-MM-DD`).
///
/// Absent, `null` and empty strings yield `None`; the caller substitutes
/// today's date.
pub fn parse_date(value: Option<&Value>) -> ValidationResult<Option<NaiveDate>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map(Some)
            .map_err(|e| ValidationError::InvalidFormat {
                field: "date".to_string(),
                reason: e.to_string(),
            }),
        Some(_) => Err(ValidationError::wrong_type("date", "a YYYY-MM-DD string")),
    }
}

// =============================================================================
// String Parsers
// =============================================================================

/// Reads an optional text field (`name`, `food`).
///
/// Numbers are accepted and rendered as text, since menu identifiers are
/// sometimes sent as bare ids.
pub fn parse_text(field: &str, value: Option<&Value>) -> ValidationResult<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(ValidationError::wrong_type(field, "a string")),
    }
}

/// Validates the name used for a verification lookup.
///
/// ## Returns
/// The trimmed name.
pub fn validate_lookup_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    Ok(name.to_string())
}

// =============================================================================
// Unit Tests
// =============================================================================
