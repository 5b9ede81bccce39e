//! # JSON File Backend
//!
//! Loads and persists the whole [`SalesLedger`] as one JSON document.
//!
//! ## Read-Modify-Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    transact(op)                                         │
//! │                                                                         │
//! │  lock_exclusive(sales-data.json.lock) ◄── blocks other writers          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  read_existing() ─ missing / empty ──► empty ledger                     │
//! │       │          ─ unreadable / not an object ──► error, no write       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  op(&mut ledger) ──► Commit::Skip ──► unlock, nothing written           │
//! │       │                                                                 │
//! │       ▼ Commit::Save                                                    │
//! │  write temp file in same dir ──► rename over sales-data.json            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  chmod (file_mode) ──► unlock                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Readers never take the lock and use [`JsonFileStore::load`], which
//! degrades to an empty ledger. The rename is atomic, so a reader sees
//! either the old document or the new one.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use fs2::FileExt;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use daybook_core::SalesLedger;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};

/// What a transaction body wants done with the ledger it was given.
#[derive(Debug)]
pub enum Commit<T> {
    /// Persist the ledger, then return the value.
    Save(T),
    /// Leave the file untouched, then return the value.
    Skip(T),
}

/// Holds the exclusive lock until dropped.
#[derive(Debug)]
pub struct WriteLock {
    file: File,
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// The data file plus its sidecar lock.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    config: StoreConfig,
}

impl JsonFileStore {
    /// Creates a backend for the configured file. Touches nothing on disk.
    pub fn new(config: StoreConfig) -> Self {
        JsonFileStore { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Reads the ledger for a read-only caller.
    ///
    /// Never fails: a missing, unreadable, empty or malformed file yields an
    /// empty ledger.
    pub fn load(&self) -> SalesLedger {
        self.read_existing().unwrap_or_else(|e| {
            warn!(error = %e, "Data file unusable, treating as empty");
            SalesLedger::new()
        })
    }

    /// Reads the ledger a write will build on.
    ///
    /// A missing or empty file is an empty ledger. A file that exists but
    /// cannot be read, or is not a JSON object, is an error, so no write
    /// replaces data it could not see. Odd values inside an object are
    /// coerced by [`daybook_core::stored`] and never fail the load.
    pub fn read_existing(&self) -> StoreResult<SalesLedger> {
        let path = &self.config.data_path;

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Data file absent, starting empty");
                return Ok(SalesLedger::new());
            }
            Err(e) => return Err(StoreError::read_failed(path, e)),
        };

        if content.trim().is_empty() {
            return Ok(SalesLedger::new());
        }

        let ledger: SalesLedger =
            serde_json::from_str(&content).map_err(|e| StoreError::corrupt(path, e))?;

        let unparsed = ledger.unparsed().count();
        if unparsed > 0 {
            warn!(path = %path.display(), unparsed, "Data file has entries that are not days");
        }
        Ok(ledger)
    }

    /// Takes the exclusive writer lock, blocking until it is free.
    pub fn lock(&self) -> StoreResult<WriteLock> {
        let lock_path = self.config.lock_path();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| StoreError::lock_failed(&lock_path, e))?;

        FileExt::lock_exclusive(&file)
            .map_err(|e| StoreError::lock_failed(&lock_path, e))?;

        self.loosen_permissions(&lock_path);
        Ok(WriteLock { file })
    }

    /// Overwrites the data file with `ledger` under the writer lock.
    pub fn persist(&self, ledger: &SalesLedger) -> StoreResult<()> {
        let guard = self.lock()?;
        self.write_locked(ledger, &guard)
    }

    /// Runs `op` against a freshly loaded ledger while holding the writer
    /// lock for the whole load, mutate, persist sequence.
    pub fn transact<T, F>(&self, op: F) -> StoreResult<T>
    where
        F: FnOnce(&mut SalesLedger) -> StoreResult<Commit<T>>,
    {
        let guard = self.lock()?;
        let mut ledger = self.read_existing()?;

        match op(&mut ledger)? {
            Commit::Save(value) => {
                self.write_locked(&ledger, &guard)?;
                Ok(value)
            }
            Commit::Skip(value) => Ok(value),
        }
    }

    /// Serializes and atomically replaces the data file.
    ///
    /// The `WriteLock` argument proves the caller holds the lock.
    fn write_locked(&self, ledger: &SalesLedger, _lock: &WriteLock) -> StoreResult<()> {
        let path = &self.config.data_path;

        let bytes = if self.config.pretty {
            serde_json::to_vec_pretty(ledger)?
        } else {
            serde_json::to_vec(ledger)?
        };

        let mut tmp = NamedTempFile::new_in(self.config.data_dir())
            .map_err(|e| StoreError::write_failed(path, e))?;
        tmp.write_all(&bytes)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| StoreError::write_failed(path, e))?;
        if self.config.file_mode.is_none() {
            keep_existing_permissions(path, tmp.as_file());
        }
        tmp.persist(path)
            .map_err(|e| StoreError::write_failed(path, e.error))?;

        self.loosen_permissions(path);

        debug!(path = %path.display(), bytes = bytes.len(), days = ledger.len(), "Data file written");
        Ok(())
    }

    /// Applies `file_mode`; failure is logged, not returned.
    #[cfg(unix)]
    fn loosen_permissions(&self, path: &Path) {
        use std::os::unix::fs::PermissionsExt;

        if let Some(mode) = self.config.file_mode {
            if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(mode)) {
                warn!(path = %path.display(), error = %e, "Could not set file permissions");
            }
        }
    }

    #[cfg(not(unix))]
    fn loosen_permissions(&self, _path: &Path) {}
}

/// Copies the current data file's permissions onto its replacement, which
/// would otherwise keep the temp file's owner-only mode.
fn keep_existing_permissions(path: &Path, replacement: &File) {
    let Ok(metadata) = fs::metadata(path) else {
        return;
    };
    if let Err(e) = replacement.set_permissions(metadata.permissions()) {
        warn!(path = %path.display(), error = %e, "Could not carry over file permissions");
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
