//! # daybook-core: Pure Aggregation Logic for Daybook
//!
//! This crate holds the reservation data model and every counter rule as
//! pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Daybook Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          HTTP handler (outside this workspace)                  │   │
//! │  │    parses body ──► action + fields                              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              daybook-store (file, lock, dispatch)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ daybook-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ aggregate │  │  ledger   │  │ validation│  │   │
//! │  │   │  Record   │  │  append   │  │ add/verify│  │  parsers  │  │   │
//! │  │   │  Day      │  │ recompute │  │ replace   │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO FILES • NO LOCKS • PURE FUNCTIONS                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (ReservationRecord, DayAggregate, SalesLedger)
//! - [`aggregate`] - Counter arithmetic shared by append and recompute
//! - [`ledger`] - The write operations over a whole ledger
//! - [`validation`] - Parsers for loosely typed input fields
//! - [`stored`] - Lenient reading of the persisted file
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use daybook_core::{ReservationRecord, SalesLedger, VerifyOutcome};
//!
//! let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
//! let mut ledger = SalesLedger::new();
//!
//! ledger.add_detail(
//!     ReservationRecord::new(day, "ramen", 2, false).with_guest("Ann", 1),
//!     day,
//! );
//! assert!(ledger.verify_by_name_and_number("Ann", 1).is_verified());
//! assert_eq!(ledger.day(&day).unwrap().menu_sales["ramen"], 2);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregate;
pub mod error;
pub mod ledger;
pub mod stored;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use types::*;

use chrono::NaiveDate;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Format of every date key, on disk and in requests.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Headcount assumed when a request omits `people`.
pub const DEFAULT_PEOPLE: u32 = 1;

/// Today's date in the host's local timezone.
///
/// Used for records that arrive without a date.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
