//! Store configuration.
//!
//! # Responsibility
//! - Describe where the model database lives and how long bootstrap waits
//!   on locks held by other instances.
//!
//! # Invariants
//! - The database file name inside a storage directory is fixed.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fixed file name of the model database inside a storage directory.
pub const DATABASE_FILE_NAME: &str = "modelstore-models.sqlite3";
/// Environment variable naming the default storage directory.
pub const STORE_DIR_ENV: &str = "MODELSTORE_DIR";
/// Default wait for locks held by another instance.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the model database is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// A directory holding [`DATABASE_FILE_NAME`].
    Directory(PathBuf),
    /// A private in-memory database, discarded with its connection.
    Memory,
}

/// Settings used by [`crate::store::StoreManager`] to open its connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub location: StoreLocation,
    pub busy_timeout: Duration,
}

impl StoreConfig {
    /// Stores the database in `dir`.
    pub fn in_directory(dir: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::Directory(dir.into()),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Keeps the database in memory.
    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::Memory,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Reads the storage directory from [`STORE_DIR_ENV`].
    ///
    /// Returns `None` when the variable is unset or blank.
    pub fn from_env() -> Option<Self> {
        let value = std::env::var_os(STORE_DIR_ENV)?;
        if value.to_string_lossy().trim().is_empty() {
            return None;
        }
        Some(Self::in_directory(value))
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    /// Full path of the database file, or `None` for in-memory stores.
    pub fn database_path(&self) -> Option<PathBuf> {
        match &self.location {
            StoreLocation::Directory(dir) => Some(database_path_in(dir)),
            StoreLocation::Memory => None,
        }
    }
}

fn database_path_in(dir: &Path) -> PathBuf {
    dir.join(DATABASE_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::{StoreConfig, StoreLocation, DATABASE_FILE_NAME, DEFAULT_BUSY_TIMEOUT};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn directory_config_uses_fixed_file_name() {
        let config = StoreConfig::in_directory("/var/lib/models");
        assert_eq!(
            config.database_path(),
            Some(PathBuf::from("/var/lib/models").join(DATABASE_FILE_NAME))
        );
        assert_eq!(config.busy_timeout, DEFAULT_BUSY_TIMEOUT);
    }

    #[test]
    fn memory_config_has_no_path() {
        let config = StoreConfig::in_memory().with_busy_timeout(Duration::ZERO);
        assert_eq!(config.location, StoreLocation::Memory);
        assert_eq!(config.database_path(), None);
        assert_eq!(config.busy_timeout, Duration::ZERO);
    }
}
