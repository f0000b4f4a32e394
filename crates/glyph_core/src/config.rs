//! Store and logging configuration.
//!
//! # Responsibility
//! - Describe where the note database lives and how live queries behave.
//! - Load settings from JSON documents with per-field defaults.
//!
//! # Invariants
//! - Every field has a default, so `{}` is a valid configuration.
//! - Durations are stored as milliseconds to keep the JSON shape flat.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_SUBSCRIPTION_GRACE_MS: u64 = 5_000;

/// Physical location of the SQLite database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseLocation {
    /// Private in-memory database, discarded on close.
    #[default]
    Memory,
    /// Database file on local disk. Created when missing.
    File(PathBuf),
}

impl DatabaseLocation {
    /// Short label used in log lines (`memory|file`).
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File(_) => "file",
        }
    }
}

/// Configuration for [`crate::NoteStore::open`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database: DatabaseLocation,
    /// How long SQLite waits on a locked database before failing a write.
    pub busy_timeout_ms: u64,
    /// How long a live query without subscribers keeps refreshing before it
    /// is torn down.
    pub subscription_grace_ms: u64,
    /// Inserts a handful of welcome notes when the database is created fresh.
    pub seed_welcome_notes: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: DatabaseLocation::Memory,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            subscription_grace_ms: DEFAULT_SUBSCRIPTION_GRACE_MS,
            seed_welcome_notes: false,
        }
    }
}

impl StoreConfig {
    /// Configuration for a private in-memory store.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Configuration for a store backed by the file at `path`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            database: DatabaseLocation::File(path.into()),
            ..Self::default()
        }
    }

    pub fn with_subscription_grace(mut self, grace: Duration) -> Self {
        self.subscription_grace_ms = u64::try_from(grace.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_welcome_notes(mut self, enabled: bool) -> Self {
        self.seed_welcome_notes = enabled;
        self
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    pub fn subscription_grace(&self) -> Duration {
        Duration::from_millis(self.subscription_grace_ms)
    }

    /// Parses a JSON document. Missing fields fall back to defaults.
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(source).map_err(ConfigError::Parse)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            source: err,
        })?;
        Self::from_json_str(&source)
    }
}

/// Logging settings consumed by [`crate::init_logging`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `trace|debug|info|warn|error` (case-insensitive).
    pub level: String,
    /// Absolute directory for rolling log files. `None` logs to stderr.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl LoggingConfig {
    pub fn to_dir(level: impl Into<String>, log_dir: impl Into<PathBuf>) -> Self {
        Self {
            level: level.into(),
            log_dir: Some(log_dir.into()),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, DatabaseLocation, StoreConfig};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn empty_document_uses_defaults() {
        let config = StoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.database, DatabaseLocation::Memory);
        assert_eq!(config.subscription_grace(), Duration::from_secs(5));
        assert!(!config.seed_welcome_notes);
    }

    #[test]
    fn file_location_and_overrides_parse() {
        let config = StoreConfig::from_json_str(
            r#"{
                "database": { "file": "/tmp/glyph/notes.db" },
                "subscription_grace_ms": 250,
                "seed_welcome_notes": true
            }"#,
        )
        .unwrap();
        assert_eq!(
            config.database,
            DatabaseLocation::File(PathBuf::from("/tmp/glyph/notes.db"))
        );
        assert_eq!(config.subscription_grace(), Duration::from_millis(250));
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
        assert!(config.seed_welcome_notes);
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = StoreConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = StoreConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
