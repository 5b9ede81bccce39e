//! # Store Configuration
//!
//! Where the data file lives and how it is written.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Builder calls in code
//! 2. Environment variables (`DAYBOOK_*`) via [`StoreConfig::from_env`]
//! 3. Defaults (this file)

use std::path::{Path, PathBuf};

/// Default data file location, relative to the working directory.
pub const DEFAULT_DATA_PATH: &str = "data/sales-data.json";

/// Permissions applied to the data file after every write.
///
/// The file is shared between whatever users run request handlers.
pub const DEFAULT_FILE_MODE: u32 = 0o666;

/// Store configuration.
///
/// ## Example
/// ```rust
/// use daybook_store::StoreConfig;
///
/// let config = StoreConfig::new("/srv/daybook/sales-data.json")
///     .file_mode(Some(0o640))
///     .pretty(false);
///
/// assert_eq!(config.lock_path().to_str(), Some("/srv/daybook/sales-data.json.lock"));
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the JSON data file.
    pub data_path: PathBuf,

    /// Unix permission bits set after each write.
    ///
    /// `None` carries the existing file's permissions over to each
    /// replacement; a file created this way starts owner-only (0o600).
    /// Default: 0o666
    pub file_mode: Option<u32>,

    /// Pretty-print the JSON.
    /// Default: true
    pub pretty: bool,
}

impl StoreConfig {
    /// Creates a configuration for the given data file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        StoreConfig {
            data_path: path.into(),
            file_mode: Some(DEFAULT_FILE_MODE),
            pretty: true,
        }
    }

    /// Sets the permission bits applied after writes.
    pub fn file_mode(mut self, mode: Option<u32>) -> Self {
        self.file_mode = mode;
        self
    }

    /// Sets whether the JSON is pretty-printed.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Creates a configuration from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `DAYBOOK_DATA_PATH`: data file path
    /// - `DAYBOOK_FILE_MODE`: octal permission bits (`640`, `0o640`), or `none`
    /// - `DAYBOOK_PRETTY`: `false` / `0` for compact JSON
    pub fn from_env() -> Self {
        let mut config = StoreConfig::default();

        if let Ok(path) = std::env::var("DAYBOOK_DATA_PATH") {
            config.data_path = PathBuf::from(path);
        }

        if let Ok(mode) = std::env::var("DAYBOOK_FILE_MODE") {
            match parse_mode(&mode) {
                Some(parsed) => config.file_mode = parsed,
                None => tracing::warn!(value = %mode, "Ignoring invalid DAYBOOK_FILE_MODE"),
            }
        }

        if let Ok(pretty) = std::env::var("DAYBOOK_PRETTY") {
            config.pretty = !matches!(pretty.trim(), "false" | "0");
        }

        config
    }

    /// Path of the sidecar file that carries the advisory lock.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.data_path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Directory holding the data file.
    pub fn data_dir(&self) -> &Path {
        match self.data_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::new(DEFAULT_DATA_PATH)
    }
}

/// `Some(None)` for "none", `Some(Some(bits))` for octal, `None` if invalid.
fn parse_mode(raw: &str) -> Option<Option<u32>> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("none") {
        return Some(None);
    }
    let digits = raw.strip_prefix("0o").unwrap_or(raw);
    u32::from_str_radix(digits, 8)
        .ok()
        .filter(|bits| *bits <= 0o7777)
        .map(Some)
}
