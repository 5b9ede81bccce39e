//! # Aggregation Store
//!
//! The operation entry points. Each call loads the data file, applies one
//! [`daybook_core::ledger`] operation, and persists, all under the writer
//! lock. Nothing is cached between calls.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Read (no lock)                 Write (locked read-modify-write)        │
//! │  ──────────────                 ────────────────────────────────        │
//! │  ledger()                       add_reservation_detail(record)          │
//! │  day(date)                      save_all_reservations(records)          │
//! │  reservations()                 add_reservation_to_sales(..)            │
//! │  audit()                        update_verification_status(..)          │
//! │                                 verify_reservation(name, number)        │
//! │                                 reconcile()                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use tracing::{debug, info};

use daybook_core::{
    DayAggregate, Divergence, ReservationRecord, SalesLedger, VerifyOutcome,
};

use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::file::{Commit, JsonFileStore};

/// File-backed reservation aggregation store.
///
/// Cheap to clone; clones share nothing but the path, so each handler can
/// own one.
#[derive(Debug, Clone)]
pub struct AggregationStore {
    file: JsonFileStore,
    today: fn() -> NaiveDate,
}

impl AggregationStore {
    /// Creates a store for the configured data file.
    pub fn new(config: StoreConfig) -> Self {
        AggregationStore {
            file: JsonFileStore::new(config),
            today: daybook_core::today,
        }
    }

    /// Creates a store configured from `DAYBOOK_*` environment variables.
    pub fn from_env() -> Self {
        AggregationStore::new(StoreConfig::from_env())
    }

    /// Replaces the clock used for undated records.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Returns the file backend.
    pub fn file(&self) -> &JsonFileStore {
        &self.file
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// The full ledger as currently persisted.
    pub fn ledger(&self) -> SalesLedger {
        self.file.load()
    }

    /// One date's aggregate, if it exists.
    pub fn day(&self, date: NaiveDate) -> Option<DayAggregate> {
        self.file.load().day(&date).cloned()
    }

    /// Every reservation, date order then list order.
    pub fn reservations(&self) -> Vec<ReservationRecord> {
        self.file.load().reservations()
    }

    /// Dates whose stored counters disagree with their lists.
    pub fn audit(&self) -> Vec<Divergence> {
        self.file.load().audit()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Appends one detailed reservation.
    ///
    /// ## Returns
    /// The date the record was filed under.
    pub fn add_reservation_detail(&self, record: ReservationRecord) -> StoreResult<NaiveDate> {
        let today = (self.today)();
        self.file.transact(|ledger| {
            let date = ledger.add_detail(record, today);
            let day = ledger.day_mut(date);
            info!(
                %date,
                reservations = day.reservation_count,
                people = day.verified_people_count,
                "Reservation added"
            );
            Ok(Commit::Save(date))
        })
    }

    /// Replaces every reservation list and recomputes every date.
    ///
    /// ## Returns
    /// The total number of reservations stored afterwards.
    pub fn save_all_reservations(&self, records: Vec<ReservationRecord>) -> StoreResult<usize> {
        let today = (self.today)();
        let submitted = records.len();
        self.file.transact(|ledger| {
            let total = ledger.replace_all(records, today);
            info!(submitted, total, days = ledger.len(), "Reservation list replaced");
            Ok(Commit::Save(total))
        })
    }

    /// Counts a reservation without caller-supplied detail.
    pub fn add_reservation_to_sales(
        &self,
        date: Option<NaiveDate>,
        food: &str,
        people: u32,
        verified: bool,
    ) -> StoreResult<NaiveDate> {
        let today = (self.today)();
        self.file.transact(|ledger| {
            let date = ledger.add_to_sales(date, food, people, verified, today);
            info!(%date, food, people, verified, "Sale counted");
            Ok(Commit::Save(date))
        })
    }

    /// Verifies already-counted reservations on `date` by food.
    ///
    /// ## Errors
    /// [`daybook_core::CoreError`] (wrapped) when the date does not exist or
    /// no unverified entry matched; the file is not written in that case.
    ///
    /// ## Returns
    /// The headcount that was verified.
    pub fn update_verification_status(
        &self,
        date: Option<NaiveDate>,
        food: &str,
        people: u32,
    ) -> StoreResult<u32> {
        let date = date.unwrap_or_else(self.today);
        self.file.transact(|ledger| {
            let verified = ledger.update_verification(date, food, people)?;
            info!(%date, food, requested = people, verified, "Verification updated");
            Ok(Commit::Save(verified))
        })
    }

    /// Verifies the first reservation matching `name` and number.
    ///
    /// Only a `Verified` outcome writes the file.
    pub fn verify_reservation(&self, name: &str, reservation_number: i64) -> StoreResult<VerifyOutcome> {
        self.file.transact(|ledger| {
            let outcome = ledger.verify_by_name_and_number(name, reservation_number);
            match outcome {
                VerifyOutcome::Verified { date, people } => {
                    info!(%date, name, reservation_number, people, "Reservation verified");
                    Ok(Commit::Save(outcome))
                }
                _ => {
                    debug!(name, reservation_number, ?outcome, "Nothing to verify");
                    Ok(Commit::Skip(outcome))
                }
            }
        })
    }

    /// Rewrites drifted counters from their lists.
    ///
    /// ## Returns
    /// How many dates changed. The file is only written when that is
    /// non-zero.
    pub fn reconcile(&self) -> StoreResult<usize> {
        self.file.transact(|ledger| {
            let changed = ledger.reconcile();
            if changed == 0 {
                return Ok(Commit::Skip(0));
            }
            info!(changed, "Counters reconciled");
            Ok(Commit::Save(changed))
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
