//! SQLite storage bootstrap and schema entry points.
//!
//! # Responsibility
//! - Open and configure the SQLite connection backing the unit store.
//! - Create the `model_units` schema on first open and reject unknown versions.
//! - Classify connection-level failures into the store's error kinds.
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - No unit data is read or written before the schema check succeeds.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Errors raised by the storage layer.
#[derive(Debug)]
pub enum DbError {
    /// Underlying SQLite failure, propagated unchanged.
    Sqlite(rusqlite::Error),
    /// The configured storage location cannot hold a database.
    UnsupportedEnvironment { location: PathBuf, reason: String },
    /// On-disk schema comes from a version with no migration path.
    UnsupportedMigration { found: u32, supported: u32 },
    /// Another running instance holds a lock that prevents bootstrap.
    BlockedByOtherInstance,
    /// Schema changed underneath an established connection.
    ConnectionStale,
}

impl DbError {
    /// Returns whether this error invalidates the whole store rather than
    /// a single operation.
    pub fn is_connection_failure(&self) -> bool {
        !matches!(self, Self::Sqlite(_))
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedEnvironment { location, reason } => write!(
                f,
                "storage is not available at `{}`: {reason}",
                location.display()
            ),
            Self::UnsupportedMigration { found, supported } => write!(
                f,
                "can't handle migration from schema version {found} (supported: {supported})"
            ),
            Self::BlockedByOtherInstance => write!(
                f,
                "another running instance of this app is outdated, and must either be closed or updated for this instance to proceed"
            ),
            Self::ConnectionStale => {
                write!(f, "model database is outdated - please reload the application")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Returns whether a SQLite error means another connection holds the lock.
pub(crate) fn is_lock_contention(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
    )
}
