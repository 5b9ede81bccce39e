//! # Aggregate Arithmetic
//!
//! The counter rules shared by every write path.
//!
//! ## One Rule, Two Entry Points
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Incremental                           Recompute (ground truth)        │
//! │  ───────────                           ────────────────────────        │
//! │  append(record)                        recompute()                     │
//! │    │                                     │                             │
//! │    ├── push onto reservation_list        ├── zero all counters         │
//! │    └── count(record) ◄───────────────────┴── count(r) for r in list    │
//! │                                                                         │
//! │  count(record):                                                        │
//! │    reservation_count     += people                                     │
//! │    if verified:                                                        │
//! │      verified_people     += people                                     │
//! │      menu_sales[food]    += people   (food non-empty)                  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Because both paths call the same `count`, a day built only through
//! `append` always equals its own recompute.

use crate::types::{DayAggregate, ReservationRecord, Tally};

impl DayAggregate {
    /// Appends a record and counts it.
    pub fn append(&mut self, record: ReservationRecord) {
        self.count(&record);
        self.reservation_list.push(record);
    }

    /// Adds one record's contribution to the counters, without touching
    /// the list.
    fn count(&mut self, record: &ReservationRecord) {
        self.reservation_count += u64::from(record.people);
        if record.verified {
            self.count_verified(record.people, record.menu_item());
        }
    }

    /// Adds a verified headcount to the people and menu counters.
    pub(crate) fn count_verified(&mut self, people: u32, menu_item: Option<&str>) {
        let people = u64::from(people);
        self.verified_people_count += people;
        if let Some(food) = menu_item {
            *self.menu_sales.entry(food.to_string()).or_insert(0) += people;
        }
    }

    /// Rebuilds every counter from `reservation_list`.
    pub fn recompute(&mut self) {
        self.set_tally(self.recomputed());
    }

    /// The counters a recompute would produce, without applying them.
    pub fn recomputed(&self) -> Tally {
        let mut scratch = DayAggregate::default();
        for record in &self.reservation_list {
            scratch.count(record);
        }
        scratch.tally()
    }

    /// The counters as currently stored.
    pub fn tally(&self) -> Tally {
        Tally {
            reservation_count: self.reservation_count,
            verified_people_count: self.verified_people_count,
            menu_sales: self.menu_sales.clone(),
        }
    }

    fn set_tally(&mut self, tally: Tally) {
        self.reservation_count = tally.reservation_count;
        self.verified_people_count = tally.verified_people_count;
        self.menu_sales = tally.menu_sales;
    }

    /// True when the stored counters equal a recompute of the list.
    pub fn is_consistent(&self) -> bool {
        self.tally() == self.recomputed()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
