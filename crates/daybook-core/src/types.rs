//! # Domain Types
//!
//! Core domain types used throughout Daybook.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  SalesLedger  (the whole data file)                                    │
//! │  └── BTreeMap<NaiveDate, DayAggregate>                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  ┌───────────────────────┐          ┌───────────────────────┐          │
//! │  │     DayAggregate      │          │  ReservationRecord    │          │
//! │  │  ───────────────────  │   owns   │  ───────────────────  │          │
//! │  │  reservation_count    │ ───────► │  date                 │          │
//! │  │  verified_people      │  (list)  │  name                 │          │
//! │  │  menu_sales           │          │  reservation_number   │          │
//! │  │  reservation_list     │          │  food / people        │          │
//! │  └───────────────────────┘          │  verified             │          │
//! │                                     │  extra (opaque)       │          │
//! │                                     └───────────────────────┘          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Names
//! The persisted file predates this crate, so field names on disk differ
//! from the Rust names: `reservations` is the reservation headcount and
//! `people` is the *verified* headcount.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::ValidationError;
use crate::validation::{
    parse_date, parse_people, parse_reservation_number, parse_text, parse_verified,
    ValidationResult,
};
use crate::DATE_FORMAT;

// =============================================================================
// Reservation Record
// =============================================================================

/// One caller-submitted reservation.
///
/// Fields the store does not interpret (phone numbers, notes, seat
/// preferences, ...) are kept in `extra` and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRecord {
    /// Calendar date; `None` only for records loaded from files that
    /// omitted it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    /// Guest name used for verification lookups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Caller-assigned number. Not guaranteed unique.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation_number: Option<i64>,

    /// Menu item identifier; empty means "no item".
    pub food: String,

    /// Headcount, always positive.
    pub people: u32,

    /// Confirmed attendance.
    pub verified: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ReservationRecord {
    /// Creates a bare record with no name or number.
    ///
    /// This is the shape the aggregate-only path appends so that a later
    /// recompute still sees its headcount.
    pub fn new(date: NaiveDate, food: impl Into<String>, people: u32, verified: bool) -> Self {
        ReservationRecord {
            date: Some(date),
            name: None,
            reservation_number: None,
            food: food.into(),
            people,
            verified,
            extra: Map::new(),
        }
    }

    /// Sets the guest name and reservation number.
    pub fn with_guest(mut self, name: impl Into<String>, reservation_number: i64) -> Self {
        self.name = Some(name.into());
        self.reservation_number = Some(reservation_number);
        self
    }

    /// Builds a record from a loosely typed field map.
    ///
    /// Known fields are normalized through [`crate::validation`]; everything
    /// else lands in `extra`.
    ///
    /// ## Example
    /// ```rust
    /// use daybook_core::ReservationRecord;
    /// use serde_json::json;
    ///
    /// let fields = json!({
    ///     "date": "2024-03-01",
    ///     "name": "Ann",
    ///     "reservationNumber": "1",
    ///     "food": "ramen",
    ///     "people": 2,
    ///     "verified": "true",
    ///     "phone": "555-0100"
    /// });
    /// let record = ReservationRecord::from_fields(fields.as_object().unwrap().clone()).unwrap();
    ///
    /// assert_eq!(record.reservation_number, Some(1));
    /// assert!(record.verified);
    /// assert_eq!(record.extra["phone"], "555-0100");
    /// ```
    pub fn from_fields(mut fields: Map<String, Value>) -> ValidationResult<Self> {
        let date = parse_date(fields.remove("date").as_ref())?;
        let name = parse_text("name", fields.remove("name").as_ref())?;
        let reservation_number =
            parse_reservation_number(fields.remove("reservationNumber").as_ref())?;
        let food = parse_text("food", fields.remove("food").as_ref())?.unwrap_or_default();
        let people = parse_people(fields.remove("people").as_ref())?;
        let verified = parse_verified(fields.remove("verified").as_ref())?;

        Ok(ReservationRecord {
            date,
            name,
            reservation_number,
            food,
            people,
            verified,
            extra: fields,
        })
    }

    /// Builds a record from any JSON value; only objects are accepted.
    pub fn from_value(value: Value) -> ValidationResult<Self> {
        match value {
            Value::Object(fields) => ReservationRecord::from_fields(fields),
            _ => Err(ValidationError::WrongType {
                field: "reservation".to_string(),
                expected: "an object".to_string(),
            }),
        }
    }

    /// Fills in `date` with `today` when absent and returns the result.
    pub fn resolve_date(&mut self, today: NaiveDate) -> NaiveDate {
        *self.date.get_or_insert(today)
    }

    /// The menu key this record counts toward, if any.
    #[inline]
    pub fn menu_item(&self) -> Option<&str> {
        if self.food.is_empty() {
            None
        } else {
            Some(self.food.as_str())
        }
    }

    /// Exact name match plus numeric number match.
    pub fn matches(&self, name: &str, reservation_number: i64) -> bool {
        self.name.as_deref() == Some(name) && self.reservation_number == Some(reservation_number)
    }
}

// =============================================================================
// Tally
// =============================================================================

/// The three derived counters of a day, without the list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tally {
    pub reservation_count: u64,
    pub verified_people_count: u64,
    pub menu_sales: BTreeMap<String, u64>,
}

// =============================================================================
// Day Aggregate
// =============================================================================

/// Per-date rollup plus the raw reservation list it is derived from.
///
/// See [`crate::aggregate`] for the arithmetic and [`crate::stored`] for
/// how it is read back from disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAggregate {
    /// Σ people over every list entry.
    #[serde(rename = "reservations")]
    pub reservation_count: u64,

    /// Σ people over verified list entries.
    #[serde(rename = "people")]
    pub verified_people_count: u64,

    /// Σ people over verified entries, per non-empty food.
    pub menu_sales: BTreeMap<String, u64>,

    /// Insertion-ordered reservations; the recompute source of truth.
    pub reservation_list: Vec<ReservationRecord>,
}

// =============================================================================
// Sales Ledger
// =============================================================================

/// The full store: date → day aggregate, iterated in ascending date order.
///
/// Top-level entries that are not a `YYYY-MM-DD` key with an object value
/// are kept verbatim in `unparsed` and written back after the dates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesLedger {
    pub(crate) days: BTreeMap<NaiveDate, DayAggregate>,
    pub(crate) unparsed: BTreeMap<String, Value>,
}

impl SalesLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        SalesLedger::default()
    }

    /// Returns the aggregate for `date`, if one was ever created.
    pub fn day(&self, date: &NaiveDate) -> Option<&DayAggregate> {
        self.days.get(date)
    }

    /// Iterates days in ascending date order.
    pub fn days(&self) -> impl Iterator<Item = (&NaiveDate, &DayAggregate)> {
        self.days.iter()
    }

    /// Number of dates present.
    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// True when the ledger holds nothing at all, parsed or not.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty() && self.unparsed.is_empty()
    }

    /// Entries kept verbatim because they were not a recognizable day.
    pub fn unparsed(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.unparsed.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Returns the aggregate for `date`, creating a zeroed one if needed.
    ///
    /// A verbatim entry under the same key is not a day aggregate, so a
    /// write to that date replaces it.
    pub fn day_mut(&mut self, date: NaiveDate) -> &mut DayAggregate {
        if !self.days.contains_key(&date) {
            let key = date.format(DATE_FORMAT).to_string();
            if let Some(previous) = self.unparsed.remove(&key) {
                warn!(%date, %previous, "Replacing non-aggregate entry with a new day");
            }
        }
        self.days.entry(date).or_default()
    }

    /// Flattens every list: date order, then list order.
    pub fn reservations(&self) -> Vec<ReservationRecord> {
        self.days
            .values()
            .flat_map(|day| day.reservation_list.iter().cloned())
            .collect()
    }

    /// Total number of list entries across all dates.
    pub fn reservation_total(&self) -> usize {
        self.days.values().map(|day| day.reservation_list.len()).sum()
    }
}

// =============================================================================
// Verification Outcome
// =============================================================================

/// Result of a name + number verification lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerifyOutcome {
    /// The first matching record flipped from unverified to verified.
    Verified { date: NaiveDate, people: u32 },

    /// The first matching record was already verified; nothing changed.
    AlreadyVerified { date: NaiveDate },

    /// No record matched.
    NotFound,
}

impl VerifyOutcome {
    /// Whether the ledger changed.
    #[inline]
    pub fn is_verified(&self) -> bool {
        matches!(self, VerifyOutcome::Verified { .. })
    }
}

// =============================================================================
// Divergence
// =============================================================================

/// A date whose stored counters disagree with a recompute of its list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Divergence {
    pub date: NaiveDate,
    pub stored: Tally,
    pub recomputed: Tally,
}

// =============================================================================
// Unit Tests
// =============================================================================
