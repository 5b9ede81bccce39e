//! # Request Handling
//!
//! Turns an already-parsed request (method, optional list flag, JSON body)
//! into a store call and a [`Response`] or [`ServiceError`].
//!
//! ## Action Table
//! ```text
//! ┌──────────────────┬─────────────────────────────────┬───────────────────────────┐
//! │ action           │ fields                          │ store call                │
//! ├──────────────────┼─────────────────────────────────┼───────────────────────────┤
//! │ add              │ date? food? people? verified?   │ add_reservation_to_sales  │
//! │ add-detail       │ the record itself               │ add_reservation_detail    │
//! │ save-all         │ reservations: [..]              │ save_all_reservations     │
//! │ get-reservations │ none                            │ reservations              │
//! │ verify           │ name + reservationNumber        │ verify_reservation        │
//! │ verify           │ date? food? people?             │ update_verification_status│
//! └──────────────────┴─────────────────────────────────┴───────────────────────────┘
//! ```
//!
//! A GET-style fetch returns the whole ledger, or the flattened list when
//! the `reservations` flag is `"true"`.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use daybook_core::validation::{
    parse_date, parse_people, parse_reservation_number, parse_text, parse_verified,
    validate_lookup_name,
};
use daybook_core::{ReservationRecord, SalesLedger, ValidationError, VerifyOutcome};

use crate::error::ServiceError;
use crate::store::AggregationStore;

// =============================================================================
// Request Types
// =============================================================================

/// A parsed request.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Read-only fetch of the ledger.
    Fetch { reservations_only: bool },

    /// A write (or list) action.
    Command(Command),
}

/// One action from a request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add {
        date: Option<NaiveDate>,
        food: String,
        people: u32,
        verified: bool,
    },
    AddDetail(ReservationRecord),
    SaveAll(Vec<ReservationRecord>),
    GetReservations,
    VerifyGuest {
        name: String,
        reservation_number: i64,
    },
    VerifyCounts {
        date: Option<NaiveDate>,
        food: String,
        people: u32,
    },
}

impl Request {
    /// Builds a request from transport-level parts.
    ///
    /// ## Arguments
    /// * `method` - `GET` for fetches, `POST` for actions
    /// * `reservations_flag` - the fetch's `reservations` query value, if any
    /// * `body` - the decoded POST body
    pub fn from_parts(
        method: &str,
        reservations_flag: Option<&str>,
        body: Option<Value>,
    ) -> Result<Self, ServiceError> {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Ok(Request::Fetch {
                reservations_only: reservations_flag == Some("true"),
            }),
            "POST" => {
                let body = body.unwrap_or(Value::Null);
                Command::parse(body).map(Request::Command)
            }
            _ => Err(ServiceError::method_not_allowed(method)),
        }
    }
}

impl Command {
    /// Parses a request body carrying an `action` field.
    pub fn parse(body: Value) -> Result<Self, ServiceError> {
        let Value::Object(mut fields) = body else {
            return Err(ServiceError::invalid_request(
                "Invalid request. action is required.",
            ));
        };

        let action = match fields.remove("action") {
            Some(Value::String(action)) => action,
            _ => {
                return Err(ServiceError::invalid_request(
                    "Invalid request. action is required.",
                ))
            }
        };

        let command = match action.as_str() {
            "add" => Command::Add {
                date: parse_date(fields.get("date"))?,
                food: food_field(&fields)?,
                people: parse_people(fields.get("people"))?,
                verified: parse_verified(fields.get("verified"))?,
            },
            "add-detail" => Command::AddDetail(ReservationRecord::from_fields(fields)?),
            "save-all" => Command::SaveAll(parse_reservation_list(fields.remove("reservations"))?),
            "get-reservations" => Command::GetReservations,
            "verify" => parse_verify(&fields)?,
            other => return Err(ServiceError::unsupported_action(other)),
        };

        Ok(command)
    }

    /// The action name, for logs.
    pub fn action(&self) -> &'static str {
        match self {
            Command::Add { .. } => "add",
            Command::AddDetail(_) => "add-detail",
            Command::SaveAll(_) => "save-all",
            Command::GetReservations => "get-reservations",
            Command::VerifyGuest { .. } | Command::VerifyCounts { .. } => "verify",
        }
    }
}

fn food_field(fields: &Map<String, Value>) -> Result<String, ValidationError> {
    Ok(parse_text("food", fields.get("food"))?.unwrap_or_default())
}

fn parse_reservation_list(value: Option<Value>) -> Result<Vec<ReservationRecord>, ServiceError> {
    let Some(Value::Array(items)) = value else {
        return Err(ServiceError::invalid_request(
            "Invalid request. reservations array is required.",
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            ReservationRecord::from_value(item).map_err(|e| {
                ServiceError::invalid_request(format!("reservations[{}]: {}", index, e))
            })
        })
        .collect()
}

/// Name + number selects the guest lookup; anything else is the
/// date/food/people form.
fn parse_verify(fields: &Map<String, Value>) -> Result<Command, ServiceError> {
    let present = |key: &str| fields.get(key).is_some_and(|v| !v.is_null());

    if present("name") && present("reservationNumber") {
        let name = parse_text("name", fields.get("name"))?.unwrap_or_default();
        let reservation_number = parse_reservation_number(fields.get("reservationNumber"))?
            .ok_or_else(|| ValidationError::Required {
                field: "reservationNumber".to_string(),
            })?;

        return Ok(Command::VerifyGuest {
            name: validate_lookup_name(&name)?,
            reservation_number,
        });
    }

    Ok(Command::VerifyCounts {
        date: parse_date(fields.get("date"))?,
        food: food_field(fields)?,
        people: parse_people(fields.get("people"))?,
    })
}

// =============================================================================
// Response
// =============================================================================

/// Successful result of a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    /// A write succeeded.
    Ack { ok: bool },

    /// `add-detail` stored its record.
    Stored { ok: bool, success: bool },

    /// `save-all` succeeded; `count` is the total stored afterwards.
    Saved { ok: bool, success: bool, count: usize },

    /// Flattened reservation list.
    Reservations(Vec<ReservationRecord>),

    /// The whole ledger.
    Ledger(SalesLedger),
}

impl Response {
    fn ack() -> Self {
        Response::Ack { ok: true }
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Executes a request against the store.
pub fn dispatch(store: &AggregationStore, request: Request) -> Result<Response, ServiceError> {
    match request {
        Request::Fetch { reservations_only } => {
            debug!(reservations_only, "Fetch");
            if reservations_only {
                Ok(Response::Reservations(store.reservations()))
            } else {
                Ok(Response::Ledger(store.ledger()))
            }
        }
        Request::Command(command) => execute(store, command),
    }
}

fn execute(store: &AggregationStore, command: Command) -> Result<Response, ServiceError> {
    debug!(action = command.action(), "Executing command");

    match command {
        Command::Add {
            date,
            food,
            people,
            verified,
        } => {
            store.add_reservation_to_sales(date, &food, people, verified)?;
            Ok(Response::ack())
        }
        Command::AddDetail(record) => {
            store.add_reservation_detail(record)?;
            Ok(Response::Stored {
                ok: true,
                success: true,
            })
        }
        Command::SaveAll(records) => {
            let count = store.save_all_reservations(records)?;
            Ok(Response::Saved {
                ok: true,
                success: true,
                count,
            })
        }
        Command::GetReservations => Ok(Response::Reservations(store.reservations())),
        Command::VerifyGuest {
            name,
            reservation_number,
        } => match store.verify_reservation(&name, reservation_number)? {
            VerifyOutcome::Verified { .. } => Ok(Response::ack()),
            VerifyOutcome::AlreadyVerified { .. } | VerifyOutcome::NotFound => {
                Err(ServiceError::not_found("Reservation not found"))
            }
        },
        Command::VerifyCounts { date, food, people } => {
            store.update_verification_status(date, &food, people)?;
            Ok(Response::ack())
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::error::ErrorCode;
    use serde_json::json;

    fn fixed_today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn store_in(dir: &tempfile::TempDir) -> AggregationStore {
        AggregationStore::new(StoreConfig::new(dir.path().join("sales-data.json")))
            .with_clock(fixed_today)
    }

    fn post(store: &AggregationStore, body: Value) -> Result<Response, ServiceError> {
        let request = Request::from_parts("POST", None, Some(body))?;
        dispatch(store, request)
    }

    #[test]
    fn test_parse_add_defaults() {
        let command = Command::parse(json!({ "action": "add" })).unwrap();
        assert_eq!(
            command,
            Command::Add {
                date: None,
                food: String::new(),
                people: 1,
                verified: false
            }
        );
    }

    #[test]
    fn test_parse_add_detail_drops_action_keeps_extras() {
        let command = Command::parse(json!({
            "action": "add-detail", "name": "Ann", "reservationNumber": 1, "phone": "555"
        }))
        .unwrap();

        let Command::AddDetail(record) = command else {
            panic!("expected add-detail");
        };
        assert!(!record.extra.contains_key("action"));
        assert_eq!(record.extra["phone"], "555");
    }

    #[test]
    fn test_parse_verify_forms() {
        let guest = Command::parse(json!({
            "action": "verify", "name": "  Ann ", "reservationNumber": "1"
        }))
        .unwrap();
        assert_eq!(
            guest,
            Command::VerifyGuest {
                name: "Ann".to_string(),
                reservation_number: 1
            }
        );

        let counts = Command::parse(json!({
            "action": "verify", "name": "Ann", "food": "ramen", "people": 2
        }))
        .unwrap();
        assert_eq!(
            counts,
            Command::VerifyCounts {
                date: None,
                food: "ramen".to_string(),
                people: 2
            }
        );
    }

    #[test]
    fn test_parse_errors() {
        let missing = Command::parse(json!({ "food": "ramen" })).unwrap_err();
        assert_eq!(missing.code, ErrorCode::InvalidRequest);

        let not_object = Command::parse(json!("add")).unwrap_err();
        assert_eq!(not_object.code, ErrorCode::InvalidRequest);

        let unknown = Command::parse(json!({ "action": "delete" })).unwrap_err();
        assert_eq!(unknown.code, ErrorCode::UnsupportedOperation);
        assert_eq!(unknown.status_hint(), 400);

        let no_list = Command::parse(json!({ "action": "save-all" })).unwrap_err();
        assert_eq!(no_list.message, "Invalid request. reservations array is required.");

        let bad_flag = Command::parse(json!({ "action": "add", "verified": "yes" })).unwrap_err();
        assert_eq!(bad_flag.code, ErrorCode::InvalidRequest);

        let bad_item = Command::parse(json!({
            "action": "save-all", "reservations": [ {}, { "people": 0 } ]
        }))
        .unwrap_err();
        assert!(bad_item.message.starts_with("reservations[1]"));
    }

    #[test]
    fn test_unsupported_method() {
        let err = Request::from_parts("DELETE", None, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnsupportedOperation);
        assert_eq!(err.status_hint(), 405);
    }

    #[test]
    fn test_fetch_flag() {
        assert_eq!(
            Request::from_parts("get", Some("true"), None).unwrap(),
            Request::Fetch {
                reservations_only: true
            }
        );
        assert_eq!(
            Request::from_parts("GET", Some("1"), None).unwrap(),
            Request::Fetch {
                reservations_only: false
            }
        );
    }

    #[test]
    fn test_add_detail_and_verify_flow() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let added = post(
            &store,
            json!({
                "action": "add-detail", "date": "2024-03-01", "name": "Ann",
                "reservationNumber": 1, "food": "ramen", "people": 2, "verified": false
            }),
        )
        .unwrap();
        assert_eq!(
            serde_json::to_value(&added).unwrap(),
            json!({ "ok": true, "success": true })
        );

        let verify = json!({ "action": "verify", "name": "Ann", "reservationNumber": 1 });
        assert_eq!(post(&store, verify.clone()).unwrap(), Response::Ack { ok: true });

        let again = post(&store, verify).unwrap_err();
        assert_eq!(again.code, ErrorCode::NotFound);

        let fetched = dispatch(&store, Request::Fetch { reservations_only: false }).unwrap();
        let Response::Ledger(ledger) = fetched else {
            panic!("expected ledger");
        };
        let day = ledger
            .day(&NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
            .unwrap();
        assert_eq!(day.verified_people_count, 2);
        assert_eq!(day.menu_sales["ramen"], 2);
    }

    #[test]
    fn test_save_all_reports_count() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let saved = post(
            &store,
            json!({
                "action": "save-all",
                "reservations": [
                    { "date": "2024-04-01", "food": "udon", "people": 1, "verified": true },
                    { "date": "2024-04-01", "people": 3, "verified": false }
                ]
            }),
        )
        .unwrap();

        assert_eq!(
            serde_json::to_value(&saved).unwrap(),
            json!({ "ok": true, "success": true, "count": 2 })
        );

        let listed = post(&store, json!({ "action": "get-reservations" })).unwrap();
        let Response::Reservations(list) = listed else {
            panic!("expected reservations");
        };
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_add_then_verify_counts() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let missing = post(&store, json!({ "action": "verify", "food": "ramen" })).unwrap_err();
        assert_eq!(missing.code, ErrorCode::NotFound);

        post(&store, json!({ "action": "add", "food": "ramen", "people": "2" })).unwrap();
        post(&store, json!({ "action": "verify", "food": "ramen", "people": 2 })).unwrap();

        let day = store.day(fixed_today()).unwrap();
        assert_eq!(day.reservation_count, 2);
        assert_eq!(day.verified_people_count, 2);
        assert!(day.is_consistent());
    }

    #[test]
    fn test_write_failure_is_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = AggregationStore::new(StoreConfig::new(dir.path().join("gone/sales.json")));

        let err = post(&store, json!({ "action": "add" })).unwrap_err();
        assert_eq!(err.code, ErrorCode::IoFailure);
        assert_eq!(err.status_hint(), 500);
    }

    #[test]
    fn test_add_detail_over_corrupt_file_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let path = dir.path().join("sales-data.json");
        std::fs::write(&path, r#"{ "2024-01-01": { "reservations": 5, "#).unwrap();

        let err = post(
            &store,
            json!({ "action": "add-detail", "date": "2024-03-01", "food": "ramen", "people": 2 }),
        )
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::IoFailure);
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            r#"{ "2024-01-01": { "reservations": 5, "#
        );
    }
}
