//! # daybook-store: File-Backed Reservation Store
//!
//! Persists the [`daybook_core::SalesLedger`] as a single JSON document and
//! exposes the store operations plus a request dispatcher a web handler can
//! call directly.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Daybook Data Flow                                │
//! │                                                                         │
//! │  HTTP handler: method + ?reservations + JSON body                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  daybook-store (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   request     │    │    store      │    │    file      │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ Request       │───►│ Aggregation   │───►│ JsonFile     │  │   │
//! │  │   │ Command       │    │ Store         │    │ Store        │  │   │
//! │  │   │ dispatch()    │    │               │    │ lock + swap  │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │   data/sales-data.json  (+ sales-data.json.lock)                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Data path, file mode, output format
//! - [`file`] - Load, lock, atomic write
//! - [`store`] - The store operations
//! - [`request`] - Action parsing and dispatch
//! - [`error`] - Store and service error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use daybook_store::{dispatch, AggregationStore, Request};
//! use serde_json::json;
//!
//! let store = AggregationStore::from_env();
//!
//! let body = json!({ "action": "add", "food": "ramen", "people": 2 });
//! let request = Request::from_parts("POST", None, Some(body)).unwrap();
//! let response = dispatch(&store, request).unwrap();
//!
//! println!("{}", serde_json::to_string(&response).unwrap());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod file;
pub mod request;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::StoreConfig;
pub use error::{ErrorCode, ServiceError, StoreError, StoreResult};
pub use file::{Commit, JsonFileStore};
pub use request::{dispatch, Command, Request, Response};
pub use store::AggregationStore;
