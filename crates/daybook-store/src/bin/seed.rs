//! # Seed Data Generator
//!
//! Fills a data file with reservations for development.
//!
//! ## Usage
//! ```bash
//! # 7 days of 12 reservations each into data/sales-data.json (default)
//! cargo run -p daybook-store --bin seed
//!
//! # Custom size and file
//! cargo run -p daybook-store --bin seed -- --days 30 --count 40 --file /tmp/sales.json
//! ```
//!
//! ## Generated Reservations
//! - Dates: the last `--days` days, ending today
//! - Names: `{first} {last}` from fixed lists
//! - Numbers: 1..N per run
//! - Food: cycled through [`MENU`], every fifth one left empty
//! - People: 1 - 6
//!
//! Roughly a third are verified on arrival; another few are verified by
//! name and number after the bulk save, which exercises the verify path.

use std::env;

use chrono::{Duration, NaiveDate};
use tracing_subscriber::EnvFilter;

use daybook_core::ReservationRecord;
use daybook_store::{AggregationStore, StoreConfig};

/// Menu items for test data
const MENU: &[&str] = &[
    "ramen",
    "udon",
    "gyoza",
    "katsu-curry",
    "karaage",
    "tempura",
    "onigiri",
    "matcha-parfait",
];

const FIRST_NAMES: &[&str] = &["Ann", "Bo", "Chen", "Dana", "Emeka", "Fatima", "Goro", "Hana"];

const LAST_NAMES: &[&str] = &["Sato", "Okafor", "Lindqvist", "Moreau", "Khan", "Ito"];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,daybook=debug")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut days: i64 = 7;
    let mut count: usize = 12;
    let mut config = StoreConfig::from_env();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--days" => {
                if i + 1 < args.len() {
                    days = args[i + 1].parse().unwrap_or(7);
                    i += 1;
                }
            }
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(12);
                    i += 1;
                }
            }
            "--file" | "-f" => {
                if i + 1 < args.len() {
                    config.data_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Daybook Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("      --days <N>     Number of days to fill (default: 7)");
                println!("  -c, --count <N>    Reservations per day (default: 12)");
                println!("  -f, --file <PATH>  Data file (default: $DAYBOOK_DATA_PATH or data/sales-data.json)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Daybook Seed Data Generator");
    println!("===========================");
    println!("File:         {}", config.data_path.display());
    println!("Days:         {}", days);
    println!("Per day:      {}", count);
    println!();

    std::fs::create_dir_all(config.data_dir())?;
    let store = AggregationStore::new(config);

    let existing = store.ledger().reservation_total();
    if existing > 0 {
        println!("! Data file already has {} reservations", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the file to regenerate.");
        return Ok(());
    }

    let today = daybook_core::today();
    let records = generate_records(today, days, count);
    let generated = records.len();

    let start = std::time::Instant::now();
    let total = store.save_all_reservations(records)?;
    println!("✓ Saved {} reservations in {:?}", total, start.elapsed());

    // Verify a handful of the pending ones the way a host stand would.
    let pending: Vec<(String, i64)> = store
        .reservations()
        .into_iter()
        .filter(|r| !r.verified)
        .filter_map(|r| Some((r.name?, r.reservation_number?)))
        .step_by(4)
        .collect();

    let mut verified = 0;
    for (name, number) in &pending {
        if store.verify_reservation(name, *number)?.is_verified() {
            verified += 1;
        }
    }
    println!("✓ Verified {} of {} pending reservations", verified, pending.len());

    println!();
    println!("Per-day totals:");
    for (date, day) in store.ledger().days() {
        println!(
            "  {}  reservations={:<4} people={:<4} items={}",
            date,
            day.reservation_count,
            day.verified_people_count,
            day.menu_sales.len()
        );
    }

    let divergent = store.audit();
    println!();
    if divergent.is_empty() {
        println!("✓ Audit clean ({} generated)", generated);
    } else {
        println!("! Audit found {} divergent days", divergent.len());
    }

    Ok(())
}

/// Deterministic reservations for the `days` days ending at `today`.
fn generate_records(today: NaiveDate, days: i64, count: usize) -> Vec<ReservationRecord> {
    let mut records = Vec::new();
    let mut number: i64 = 0;

    for offset in (0..days).rev() {
        let date = today - Duration::days(offset);

        for slot in 0..count {
            number += 1;
            let seed = number as usize;

            let food = if seed % 5 == 0 {
                ""
            } else {
                MENU[(seed * 7 + slot) % MENU.len()]
            };
            let people = 1 + (seed * 13 % 6) as u32;
            let verified = seed % 3 == 0;
            let name = format!(
                "{} {}",
                FIRST_NAMES[seed % FIRST_NAMES.len()],
                LAST_NAMES[(seed / FIRST_NAMES.len()) % LAST_NAMES.len()]
            );

            records.push(ReservationRecord::new(date, food, people, verified).with_guest(name, number));
        }
    }

    records
}
