//! # Ledger Operations
//!
//! Every write the store performs, as a pure function over a
//! [`SalesLedger`] already in memory.
//!
//! ## Operation Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operation                    List effect          Counter effect      │
//! │  ─────────                    ───────────          ──────────────      │
//! │  add_detail                   append record        count(record)       │
//! │  add_to_sales                 append bare record   count(record)       │
//! │  replace_all                  replace every list   recompute every day │
//! │  update_verification          flip exact headcount verified += people  │
//! │  verify_by_name_and_number    flip first match     verified += people  │
//! │  reconcile                    none                 recompute every day │
//! │  audit                        none (read-only)     none                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reservation State Machine
//! ```text
//!   add_detail(verified=false) ──► Unverified ──verify──► Verified
//!   add_detail(verified=true)  ─────────────────────────► Verified
//! ```
//! There is no way back to Unverified and nothing is ever deleted, except
//! that `replace_all` swaps in whatever list the caller provides.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::{CoreError, CoreResult};
use crate::types::{Divergence, ReservationRecord, SalesLedger, VerifyOutcome};

impl SalesLedger {
    /// Appends one detailed reservation to its date.
    ///
    /// ## Returns
    /// The date the record was filed under.
    pub fn add_detail(&mut self, mut record: ReservationRecord, today: NaiveDate) -> NaiveDate {
        let date = record.resolve_date(today);
        self.day_mut(date).append(record);
        date
    }

    /// Counts a reservation for callers that keep the detail elsewhere.
    ///
    /// A bare list entry is appended too, so a later recompute reproduces
    /// the same counters.
    pub fn add_to_sales(
        &mut self,
        date: Option<NaiveDate>,
        food: &str,
        people: u32,
        verified: bool,
        today: NaiveDate,
    ) -> NaiveDate {
        let date = date.unwrap_or(today);
        self.day_mut(date)
            .append(ReservationRecord::new(date, food, people, verified));
        date
    }

    /// Replaces every date's reservation list with `records` and recomputes
    /// every date.
    ///
    /// Dates that receive no records survive as zeroed, empty aggregates.
    ///
    /// ## Returns
    /// The total number of list entries afterwards.
    pub fn replace_all(&mut self, records: Vec<ReservationRecord>, today: NaiveDate) -> usize {
        for day in self.days.values_mut() {
            day.reservation_list.clear();
        }

        for mut record in records {
            let date = record.resolve_date(today);
            self.day_mut(date).reservation_list.push(record);
        }

        for day in self.days.values_mut() {
            day.recompute();
        }

        self.reservation_total()
    }

    /// Marks already-counted reservations on `date` as verified.
    ///
    /// Picks unverified entries whose food equals `food` and whose
    /// headcounts add up to exactly `people`: a single entry of that size
    /// if one exists, otherwise the earliest combination in list order.
    /// Either the full headcount is verified or nothing changes.
    ///
    /// ## Errors
    /// - [`CoreError::DayNotFound`] if nothing was ever recorded for `date`
    /// - [`CoreError::ReservationNotFound`] if no set of unverified entries
    ///   matches `people` exactly
    ///
    /// ## Returns
    /// The headcount verified, always `people`.
    pub fn update_verification(
        &mut self,
        date: NaiveDate,
        food: &str,
        people: u32,
    ) -> CoreResult<u32> {
        let day = self
            .days
            .get_mut(&date)
            .ok_or_else(|| CoreError::DayNotFound(date.to_string()))?;

        let candidates: Vec<(usize, u32)> = day
            .reservation_list
            .iter()
            .enumerate()
            .filter(|(_, record)| !record.verified && record.food == food)
            .map(|(index, record)| (index, record.people))
            .collect();

        let chosen = exact_headcount(&candidates, people).ok_or_else(|| {
            CoreError::ReservationNotFound(format!(
                "no unverified '{}' entries on {} add up to {} people",
                food, date, people
            ))
        })?;

        for index in chosen {
            let record = &mut day.reservation_list[index];
            record.verified = true;
            let (count, item) = (record.people, record.menu_item().map(str::to_string));
            day.count_verified(count, item.as_deref());
        }

        Ok(people)
    }

    /// Verifies the first record matching `name` and `reservation_number`.
    ///
    /// Dates are searched in ascending order, then each list in insertion
    /// order. The search stops at the first match even if that match is
    /// already verified, so with duplicate keys the earliest entry wins.
    pub fn verify_by_name_and_number(&mut self, name: &str, reservation_number: i64) -> VerifyOutcome {
        for (date, day) in self.days.iter_mut() {
            let Some(index) = day
                .reservation_list
                .iter()
                .position(|record| record.matches(name, reservation_number))
            else {
                continue;
            };

            let record = &mut day.reservation_list[index];
            if record.verified {
                return VerifyOutcome::AlreadyVerified { date: *date };
            }

            record.verified = true;
            let people = record.people;
            let item = record.menu_item().map(str::to_string);
            day.count_verified(people, item.as_deref());

            return VerifyOutcome::Verified {
                date: *date,
                people,
            };
        }

        VerifyOutcome::NotFound
    }

    /// Recomputes every date from its list without replacing any list.
    ///
    /// ## Returns
    /// How many dates had counters that changed.
    pub fn reconcile(&mut self) -> usize {
        let mut changed = 0;
        for day in self.days.values_mut() {
            if !day.is_consistent() {
                day.recompute();
                changed += 1;
            }
        }
        changed
    }

    /// Lists every date whose stored counters disagree with its list.
    pub fn audit(&self) -> Vec<Divergence> {
        self.days
            .iter()
            .filter_map(|(date, day)| {
                let recomputed = day.recomputed();
                let stored = day.tally();
                (stored != recomputed).then(|| Divergence {
                    date: *date,
                    stored,
                    recomputed,
                })
            })
            .collect()
    }
}

/// Chooses list indices whose headcounts sum to exactly `target`.
///
/// `candidates` is `(list index, people)` in list order. An exact single
/// entry wins; otherwise a subset-sum pass that stops as soon as `target`
/// is reachable, so earlier entries are preferred.
fn exact_headcount(candidates: &[(usize, u32)], target: u32) -> Option<Vec<usize>> {
    if target == 0 {
        return None;
    }
    if let Some(&(index, _)) = candidates.iter().find(|(_, people)| *people == target) {
        return Some(vec![index]);
    }

    let available: u64 = candidates.iter().map(|(_, people)| u64::from(*people)).sum();
    if available < u64::from(target) {
        return None;
    }

    // sum -> position of the candidate that first reached it
    let mut reached: BTreeMap<u32, Option<usize>> = BTreeMap::from([(0, None)]);
    for (position, &(_, people)) in candidates.iter().enumerate() {
        if people == 0 {
            continue;
        }
        let next: Vec<u32> = reached
            .keys()
            .filter_map(|sum| sum.checked_add(people))
            .filter(|sum| *sum <= target && !reached.contains_key(sum))
            .collect();
        for sum in next {
            reached.insert(sum, Some(position));
        }
        if reached.contains_key(&target) {
            break;
        }
    }

    let mut chosen = Vec::new();
    let mut remaining = target;
    while let Some(Some(position)) = reached.get(&remaining) {
        let (index, people) = candidates[*position];
        chosen.push(index);
        remaining -= people;
    }

    if remaining != 0 {
        return None;
    }
    chosen.sort_unstable();
    Some(chosen)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tally;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn today() -> NaiveDate {
        date("2024-06-30")
    }

    fn record(value: serde_json::Value) -> ReservationRecord {
        ReservationRecord::from_value(value).unwrap()
    }

    fn assert_all_consistent(ledger: &SalesLedger) {
        for (date, day) in ledger.days() {
            assert!(day.is_consistent(), "{} drifted from its list", date);
            assert!(day.verified_people_count <= day.reservation_count);
        }
    }

    #[test]
    fn test_add_detail_scenario() {
        let mut ledger = SalesLedger::new();
        let filed = ledger.add_detail(
            record(json!({
                "date": "2024-03-01", "name": "Ann", "reservationNumber": 1,
                "food": "ramen", "people": 2, "verified": false
            })),
            today(),
        );

        let day = ledger.day(&filed).unwrap();
        assert_eq!(filed, date("2024-03-01"));
        assert_eq!(day.reservation_count, 2);
        assert_eq!(day.verified_people_count, 0);
        assert!(day.menu_sales.is_empty());
    }

    #[test]
    fn test_add_detail_defaults_to_today() {
        let mut ledger = SalesLedger::new();
        let filed = ledger.add_detail(record(json!({ "name": "Bo" })), today());

        assert_eq!(filed, today());
        let stored = &ledger.day(&today()).unwrap().reservation_list[0];
        assert_eq!(stored.date, Some(today()));
    }

    #[test]
    fn test_add_detail_sequence_keeps_invariants() {
        let mut ledger = SalesLedger::new();
        let inputs = [
            ("2024-03-01", "ramen", 2, false),
            ("2024-03-01", "ramen", 1, true),
            ("2024-03-02", "", 5, true),
            ("2024-03-01", "udon", 3, true),
            ("2024-03-02", "soba", 2, false),
        ];
        for (d, food, people, verified) in inputs {
            ledger.add_detail(
                record(json!({ "date": d, "food": food, "people": people, "verified": verified })),
                today(),
            );
        }

        assert_all_consistent(&ledger);
        let first = ledger.day(&date("2024-03-01")).unwrap();
        assert_eq!(first.reservation_count, 6);
        assert_eq!(first.verified_people_count, 4);
        assert_eq!(first.menu_sales, BTreeMap::from([("ramen".into(), 1), ("udon".into(), 3)]));
    }

    #[test]
    fn test_verify_then_repeat_is_noop() {
        let mut ledger = SalesLedger::new();
        ledger.add_detail(
            record(json!({
                "date": "2024-03-01", "name": "Ann", "reservationNumber": 1,
                "food": "ramen", "people": 2, "verified": false
            })),
            today(),
        );

        let first = ledger.verify_by_name_and_number("Ann", 1);
        assert_eq!(
            first,
            VerifyOutcome::Verified {
                date: date("2024-03-01"),
                people: 2
            }
        );
        let after_first = ledger.clone();
        let day = ledger.day(&date("2024-03-01")).unwrap();
        assert_eq!(day.verified_people_count, 2);
        assert_eq!(day.menu_sales["ramen"], 2);

        let second = ledger.verify_by_name_and_number("Ann", 1);
        assert_eq!(
            second,
            VerifyOutcome::AlreadyVerified {
                date: date("2024-03-01")
            }
        );
        assert_eq!(ledger, after_first);
        assert_all_consistent(&ledger);
    }

    #[test]
    fn test_verify_unknown_guest() {
        let mut ledger = SalesLedger::new();
        ledger.add_detail(
            ReservationRecord::new(date("2024-03-01"), "", 1, false).with_guest("Ann", 1),
            today(),
        );

        assert_eq!(ledger.verify_by_name_and_number("Ann", 2), VerifyOutcome::NotFound);
        assert_eq!(ledger.verify_by_name_and_number("Bob", 1), VerifyOutcome::NotFound);
    }

    #[test]
    fn test_verify_first_match_wins_across_dates() {
        let mut ledger = SalesLedger::new();
        // Inserted later-date first: order is by date, not insertion.
        ledger.add_detail(
            ReservationRecord::new(date("2024-03-05"), "soba", 1, false).with_guest("Ann", 9),
            today(),
        );
        ledger.add_detail(
            ReservationRecord::new(date("2024-03-01"), "udon", 1, false).with_guest("Ann", 9),
            today(),
        );

        let outcome = ledger.verify_by_name_and_number("Ann", 9);
        assert_eq!(
            outcome,
            VerifyOutcome::Verified {
                date: date("2024-03-01"),
                people: 1
            }
        );

        // The earlier duplicate is now verified and still shadows the later one.
        assert_eq!(
            ledger.verify_by_name_and_number("Ann", 9),
            VerifyOutcome::AlreadyVerified {
                date: date("2024-03-01")
            }
        );
        assert!(!ledger.day(&date("2024-03-05")).unwrap().reservation_list[0].verified);
    }

    #[test]
    fn test_verify_first_match_within_list() {
        let mut ledger = SalesLedger::new();
        let d = date("2024-03-01");
        ledger.add_detail(ReservationRecord::new(d, "a", 1, false).with_guest("Ann", 1), today());
        ledger.add_detail(ReservationRecord::new(d, "b", 3, false).with_guest("Ann", 1), today());

        ledger.verify_by_name_and_number("Ann", 1);

        let day = ledger.day(&d).unwrap();
        assert!(day.reservation_list[0].verified);
        assert!(!day.reservation_list[1].verified);
        assert_eq!(day.menu_sales, BTreeMap::from([("a".into(), 1)]));
    }

    #[test]
    fn test_replace_all_scenario() {
        let mut ledger = SalesLedger::new();
        let count = ledger.replace_all(
            vec![
                record(json!({ "date": "2024-04-01", "food": "udon", "people": 1, "verified": true })),
                record(json!({ "date": "2024-04-01", "people": 3, "verified": false })),
            ],
            today(),
        );

        let day = ledger.day(&date("2024-04-01")).unwrap();
        assert_eq!(count, 2);
        assert_eq!(day.reservation_count, 4);
        assert_eq!(day.verified_people_count, 1);
        assert_eq!(day.menu_sales, BTreeMap::from([("udon".into(), 1)]));
    }

    #[test]
    fn test_replace_all_zeroes_dates_not_in_input() {
        let mut ledger = SalesLedger::new();
        ledger.add_detail(ReservationRecord::new(date("2024-01-01"), "x", 2, true), today());

        ledger.replace_all(
            vec![ReservationRecord::new(date("2024-02-01"), "y", 1, false)],
            today(),
        );

        let old = ledger.day(&date("2024-01-01")).unwrap();
        assert_eq!(old.tally(), Tally::default());
        assert!(old.reservation_list.is_empty());
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_replace_all_is_idempotent() {
        let input = vec![
            ReservationRecord::new(date("2024-04-01"), "udon", 1, true),
            ReservationRecord::new(date("2024-04-02"), "", 2, false).with_guest("Cy", 4),
            record(json!({ "people": 2, "verified": "true", "food": "tea" })),
        ];

        let mut ledger = SalesLedger::new();
        ledger.add_to_sales(Some(date("2024-04-01")), "soba", 9, true, today());

        ledger.replace_all(input.clone(), today());
        let once = ledger.clone();
        ledger.replace_all(input, today());

        assert_eq!(ledger, once);
        assert_all_consistent(&ledger);
        assert_eq!(ledger.day(&today()).unwrap().menu_sales["tea"], 2);
    }

    #[test]
    fn test_replace_all_matches_incremental_build() {
        let input = vec![
            ReservationRecord::new(date("2024-04-01"), "udon", 1, true),
            ReservationRecord::new(date("2024-04-01"), "udon", 2, false),
            ReservationRecord::new(date("2024-04-03"), "soba", 4, true),
        ];

        let mut incremental = SalesLedger::new();
        for r in input.clone() {
            incremental.add_detail(r, today());
        }

        let mut replaced = SalesLedger::new();
        replaced.replace_all(input, today());

        assert_eq!(incremental, replaced);
    }

    #[test]
    fn test_add_to_sales_survives_recompute() {
        let mut ledger = SalesLedger::new();
        let d = ledger.add_to_sales(Some(date("2024-05-01")), "ramen", 3, true, today());
        ledger.add_to_sales(Some(d), "", 2, false, today());

        let before = ledger.day(&d).unwrap().tally();
        assert_eq!(before.reservation_count, 5);
        assert_eq!(before.verified_people_count, 3);
        assert_eq!(before.menu_sales["ramen"], 3);

        assert_eq!(ledger.reconcile(), 0);
        assert_eq!(ledger.day(&d).unwrap().tally(), before);
    }

    #[test]
    fn test_add_to_sales_defaults_to_today() {
        let mut ledger = SalesLedger::new();
        assert_eq!(ledger.add_to_sales(None, "", 1, false, today()), today());
        assert_eq!(ledger.day(&today()).unwrap().reservation_count, 1);
    }

    #[test]
    fn test_update_verification_requires_existing_day() {
        let mut ledger = SalesLedger::new();
        let err = ledger.update_verification(date("2024-05-01"), "ramen", 1);

        assert!(matches!(err, Err(CoreError::DayNotFound(_))));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_update_verification_combines_matching_food() {
        let mut ledger = SalesLedger::new();
        let d = date("2024-05-01");
        ledger.add_to_sales(Some(d), "ramen", 1, false, today());
        ledger.add_to_sales(Some(d), "udon", 1, false, today());
        ledger.add_to_sales(Some(d), "ramen", 1, false, today());
        ledger.add_to_sales(Some(d), "ramen", 1, false, today());

        let verified = ledger.update_verification(d, "ramen", 2).unwrap();

        let day = ledger.day(&d).unwrap();
        assert_eq!(verified, 2);
        assert_eq!(day.verified_people_count, 2);
        assert_eq!(day.menu_sales, BTreeMap::from([("ramen".into(), 2)]));
        assert!(day.reservation_list[0].verified);
        assert!(!day.reservation_list[1].verified);
        assert!(day.reservation_list[2].verified);
        assert!(!day.reservation_list[3].verified);
        assert_all_consistent(&ledger);
    }

    #[test]
    fn test_update_verification_prefers_exact_entry() {
        let mut ledger = SalesLedger::new();
        let d = date("2024-05-01");
        ledger.add_to_sales(Some(d), "ramen", 1, false, today());
        ledger.add_to_sales(Some(d), "ramen", 2, false, today());

        assert_eq!(ledger.update_verification(d, "ramen", 2).unwrap(), 2);

        let day = ledger.day(&d).unwrap();
        let flags: Vec<_> = day
            .reservation_list
            .iter()
            .map(|r| (r.people, r.verified))
            .collect();
        assert_eq!(flags, vec![(1, false), (2, true)]);
        assert_eq!(day.verified_people_count, 2);
        assert_all_consistent(&ledger);
    }

    #[test]
    fn test_update_verification_finds_non_greedy_combination() {
        let mut ledger = SalesLedger::new();
        let d = date("2024-05-01");
        for people in [2, 2, 3] {
            ledger.add_to_sales(Some(d), "ramen", people, false, today());
        }

        assert_eq!(ledger.update_verification(d, "ramen", 5).unwrap(), 5);

        let flags: Vec<_> = ledger.day(&d).unwrap().reservation_list.iter().map(|r| r.verified).collect();
        assert_eq!(flags, vec![true, false, true]);
        assert_all_consistent(&ledger);
    }

    #[test]
    fn test_update_verification_shortfall_changes_nothing() {
        let mut ledger = SalesLedger::new();
        let d = date("2024-05-01");
        ledger.add_to_sales(Some(d), "ramen", 4, false, today());
        ledger.add_to_sales(Some(d), "ramen", 1, false, today());
        let before = ledger.clone();

        let err = ledger.update_verification(d, "ramen", 2);

        assert!(matches!(err, Err(CoreError::ReservationNotFound(_))));
        assert_eq!(ledger, before);

        let err = ledger.update_verification(d, "ramen", 9);
        assert!(matches!(err, Err(CoreError::ReservationNotFound(_))));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_update_verification_without_candidates() {
        let mut ledger = SalesLedger::new();
        let d = date("2024-05-01");
        ledger.add_to_sales(Some(d), "ramen", 1, true, today());
        let before = ledger.clone();

        let err = ledger.update_verification(d, "ramen", 1);

        assert!(matches!(err, Err(CoreError::ReservationNotFound(_))));
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_audit_and_reconcile_legacy_counters() {
        let raw = json!({
            "2024-01-01": { "reservations": 3, "people": 1, "menuSales": { "tea": 1 } },
            "2024-01-02": {
                "reservations": 2, "people": 0, "menuSales": [],
                "reservationList": [ { "date": "2024-01-02", "people": 2 } ]
            }
        });
        let mut ledger: SalesLedger = serde_json::from_value(raw).unwrap();

        let report = ledger.audit();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].date, date("2024-01-01"));
        assert_eq!(report[0].stored.reservation_count, 3);
        assert_eq!(report[0].recomputed, Tally::default());

        assert_eq!(ledger.reconcile(), 1);
        assert!(ledger.audit().is_empty());
    }
}
