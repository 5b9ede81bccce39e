//! # Stored Data
//!
//! Reading the data file back into a [`SalesLedger`].
//!
//! Requests go through the strict parsers in [`crate::validation`]. The file
//! is read leniently instead: older writers stored whatever callers sent, and
//! one odd record must not cost the rest of the ledger.
//!
//! ## Load Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Where          Value                       Loaded as                   │
//! │  ─────          ─────                       ─────────                   │
//! │  top level      not an object               error (whole file)          │
//! │  day key        not canonical YYYY-MM-DD    kept verbatim (unparsed)    │
//! │  day value      not an object               kept verbatim (unparsed)    │
//! │  counters       3 / "3" / 3.9 / "3 pax"     3                           │
//! │                 junk, negative              0                           │
//! │  menuSales      [] or a list                index-keyed map             │
//! │  list entry     not an object               dropped, warned             │
//! │  verified       true / "true" / 1           true                        │
//! │                 anything else               false                       │
//! │  people         as counters, absent → 1                                 │
//! │  date, name,    unparseable                 left in `extra` under the   │
//! │  number                                     same key                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every fallback logs a `warn!`, so drift in the file shows up in logs
//! rather than as silently missing data.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::types::{DayAggregate, ReservationRecord, SalesLedger};
use crate::validation::{
    parse_date, parse_reservation_number, parse_text, parse_verified, ValidationResult,
};
use crate::{DATE_FORMAT, DEFAULT_PEOPLE};

// =============================================================================
// Coercions
// =============================================================================

/// Reads a stored counter the way the old writer's `intval` did.
fn coerce_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => leading_integer(s).map_or(0, |n| u64::try_from(n).unwrap_or(0)),
        Value::Bool(true) => 1,
        _ => 0,
    }
}

/// The optionally signed run of digits a string starts with.
fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let sign = usize::from(s.starts_with(|c: char| c == '-' || c == '+'));
    let digits = s[sign..].bytes().take_while(u8::is_ascii_digit).count();
    s[..sign + digits].parse().ok()
}

fn coerce_people(value: Option<&Value>) -> u32 {
    match value {
        None | Some(Value::Null) => DEFAULT_PEOPLE,
        Some(v) => u32::try_from(coerce_count(v)).unwrap_or(u32::MAX),
    }
}

fn coerce_verified(value: Option<&Value>) -> bool {
    parse_verified(value).unwrap_or_else(|e| {
        warn!(error = %e, "Treating stored verified flag as false");
        false
    })
}

/// Takes `key` out of `fields` if it parses; otherwise leaves it in place
/// so it is written back untouched.
fn take_parsed<T>(
    fields: &mut Map<String, Value>,
    key: &str,
    parse: impl Fn(Option<&Value>) -> ValidationResult<Option<T>>,
) -> Option<T> {
    match parse(fields.get(key)) {
        Ok(value) => {
            fields.remove(key);
            value
        }
        Err(e) => {
            warn!(field = key, error = %e, "Keeping stored field verbatim");
            None
        }
    }
}

// =============================================================================
// Reservation Record
// =============================================================================

impl ReservationRecord {
    /// Builds a record from a stored field map. Never fails.
    ///
    /// ## Example
    /// ```rust
    /// use daybook_core::ReservationRecord;
    /// use serde_json::json;
    ///
    /// let fields = json!({ "reservationNumber": "A-7", "people": "2", "verified": "yes" });
    /// let record = ReservationRecord::from_stored(fields.as_object().unwrap().clone());
    ///
    /// assert_eq!(record.people, 2);
    /// assert!(!record.verified);
    /// assert_eq!(record.reservation_number, None);
    /// assert_eq!(record.extra["reservationNumber"], "A-7");
    /// ```
    pub fn from_stored(mut fields: Map<String, Value>) -> Self {
        let date = take_parsed(&mut fields, "date", parse_date);
        let name = take_parsed(&mut fields, "name", |v| parse_text("name", v));
        let reservation_number =
            take_parsed(&mut fields, "reservationNumber", parse_reservation_number);

        let food = match parse_text("food", fields.remove("food").as_ref()) {
            Ok(food) => food.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Dropping stored food that is not text");
                String::new()
            }
        };
        let people = coerce_people(fields.remove("people").as_ref());
        let verified = coerce_verified(fields.remove("verified").as_ref());

        ReservationRecord {
            date,
            name,
            reservation_number,
            food,
            people,
            verified,
            extra: fields,
        }
    }
}

impl<'de> Deserialize<'de> for ReservationRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Map::deserialize(deserializer).map(ReservationRecord::from_stored)
    }
}

// =============================================================================
// Day Aggregate
// =============================================================================

impl DayAggregate {
    /// Builds a day from its stored field map. Never fails.
    pub fn from_stored(mut fields: Map<String, Value>) -> Self {
        let count = |key: &str| fields.get(key).map_or(0, coerce_count);
        let reservation_count = count("reservations");
        let verified_people_count = count("people");

        // The old writer emitted an empty (or index-keyed) menu as a list.
        let menu_sales = match fields.remove("menuSales") {
            None | Some(Value::Null) => BTreeMap::new(),
            Some(Value::Object(items)) => items
                .into_iter()
                .map(|(food, n)| (food, coerce_count(&n)))
                .collect(),
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(index, n)| (index.to_string(), coerce_count(n)))
                .collect(),
            Some(other) => {
                warn!(menu_sales = %other, "Ignoring stored menuSales that is not a map");
                BTreeMap::new()
            }
        };

        let reservation_list = match fields.remove("reservationList") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(record) => Some(ReservationRecord::from_stored(record)),
                    other => {
                        warn!(entry = %other, "Dropping stored reservation that is not an object");
                        None
                    }
                })
                .collect(),
            Some(other) => {
                warn!(list = %other, "Ignoring stored reservationList that is not a list");
                Vec::new()
            }
        };

        DayAggregate {
            reservation_count,
            verified_people_count,
            menu_sales,
            reservation_list,
        }
    }
}

impl<'de> Deserialize<'de> for DayAggregate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Map::deserialize(deserializer).map(DayAggregate::from_stored)
    }
}

// =============================================================================
// Sales Ledger
// =============================================================================

/// `key` as a date, only if it is already in canonical form.
fn canonical_date(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_FORMAT)
        .ok()
        .filter(|date| date.format(DATE_FORMAT).to_string() == key)
}

impl<'de> Deserialize<'de> for SalesLedger {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Map::deserialize(deserializer)?;
        let mut ledger = SalesLedger::new();

        for (key, value) in entries {
            match (canonical_date(&key), value) {
                (Some(date), Value::Object(fields)) => {
                    ledger.days.insert(date, DayAggregate::from_stored(fields));
                }
                (_, value) => {
                    warn!(key = %key, "Keeping unrecognized ledger entry verbatim");
                    ledger.unparsed.insert(key, value);
                }
            }
        }

        Ok(ledger)
    }
}

impl Serialize for SalesLedger {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.days.len() + self.unparsed.len()))?;
        for (date, day) in &self.days {
            map.serialize_entry(&date.format(DATE_FORMAT).to_string(), day)?;
        }
        for (key, value) in &self.unparsed {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_coerce_count_like_intval() {
        assert_eq!(coerce_count(&json!(3)), 3);
        assert_eq!(coerce_count(&json!("3")), 3);
        assert_eq!(coerce_count(&json!(" 12 pax")), 12);
        assert_eq!(coerce_count(&json!(3.9)), 3);
        assert_eq!(coerce_count(&json!(-2)), 0);
        assert_eq!(coerce_count(&json!("-2")), 0);
        assert_eq!(coerce_count(&json!("two")), 0);
        assert_eq!(coerce_count(&json!(true)), 1);
        assert_eq!(coerce_count(&json!([1])), 0);
    }

    #[test]
    fn test_stored_record_keeps_loose_values() {
        let record = ReservationRecord::from_stored(
            json!({
                "date": "March 1st",
                "name": "Ann",
                "reservationNumber": "A-7",
                "food": "ramen",
                "people": 0,
                "verified": "yes",
                "action": "add-detail"
            })
            .as_object()
            .unwrap()
            .clone(),
        );

        assert_eq!(record.date, None);
        assert_eq!(record.name.as_deref(), Some("Ann"));
        assert_eq!(record.reservation_number, None);
        assert_eq!(record.people, 0);
        assert!(!record.verified);

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["date"], "March 1st");
        assert_eq!(back["reservationNumber"], "A-7");
        assert_eq!(back["action"], "add-detail");
        assert_eq!(back["verified"], false);
    }

    #[test]
    fn test_stored_record_numeric_strings() {
        let record: ReservationRecord = serde_json::from_value(
            json!({ "reservationNumber": "12", "people": "4", "verified": "true" }),
        )
        .unwrap();

        assert_eq!(record.reservation_number, Some(12));
        assert_eq!(record.people, 4);
        assert!(record.verified);
    }

    #[test]
    fn test_stored_flag_one_string_is_false() {
        let record: ReservationRecord =
            serde_json::from_value(json!({ "verified": "1" })).unwrap();
        assert!(!record.verified);
    }

    #[test]
    fn test_stored_day_drops_non_object_entries() {
        let day: DayAggregate = serde_json::from_value(json!({
            "reservations": "3",
            "people": 1,
            "menuSales": [2],
            "reservationList": [ { "people": 3 }, "garbage", 7 ]
        }))
        .unwrap();

        assert_eq!(day.reservation_count, 3);
        assert_eq!(day.menu_sales, BTreeMap::from([("0".to_string(), 2)]));
        assert_eq!(day.reservation_list.len(), 1);
    }

    #[test]
    fn test_ledger_keeps_unrecognized_entries() {
        let raw = json!({
            "2024-01-01": { "reservations": 5, "people": 5, "menuSales": { "tea": 5 } },
            "2024-1-2": { "reservations": 1 },
            "notes": "closed for renovation",
            "2024-01-03": 4
        });

        let ledger: SalesLedger = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.day(&date("2024-01-01")).unwrap().verified_people_count, 5);
        assert_eq!(ledger.unparsed().count(), 3);
        assert_eq!(serde_json::to_value(&ledger).unwrap(), raw);
    }

    #[test]
    fn test_ledger_rejects_non_object_top_level() {
        assert!(serde_json::from_value::<SalesLedger>(json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_writing_a_date_replaces_verbatim_entry() {
        let mut ledger: SalesLedger =
            serde_json::from_value(json!({ "2024-01-03": 4 })).unwrap();

        ledger.day_mut(date("2024-01-03")).reservation_count = 1;

        assert_eq!(ledger.unparsed().count(), 0);
        let value = serde_json::to_value(&ledger).unwrap();
        assert_eq!(value["2024-01-03"]["reservations"], 1);
    }
}
