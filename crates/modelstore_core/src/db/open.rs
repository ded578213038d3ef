//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Verify the storage location before touching SQLite.
//! - Open file or in-memory connections and bring the schema to version 1.
//! - Translate lock contention during bootstrap into `BlockedByOtherInstance`.
//!
//! # Invariants
//! - Returned connections have the `model_units` schema in place.
//! - A failed bootstrap never returns a half-initialized connection.

use super::migrations::apply_migrations;
use super::{is_lock_contention, DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, ErrorCode};
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens the database file at `path` and applies the schema bootstrap.
///
/// `busy_timeout` bounds how long bootstrap waits on locks held by other
/// instances before giving up with `BlockedByOtherInstance`.
///
/// # Side effects
/// - Creates the database file when it does not exist yet.
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>, busy_timeout: Duration) -> DbResult<Connection> {
    let path = path.as_ref();
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=file");

    let result = ensure_storage_available(path)
        .and_then(|()| Connection::open(path).map_err(|err| classify_open_error(path, err)))
        .and_then(|mut conn| bootstrap_connection(&mut conn, busy_timeout).map(|()| conn));

    log_open_result("file", started_at, &result);
    result
}

/// Opens a private in-memory database and applies the schema bootstrap.
pub fn open_db_in_memory() -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode=memory");

    let result = Connection::open_in_memory()
        .map_err(DbError::from)
        .and_then(|mut conn| bootstrap_connection(&mut conn, Duration::ZERO).map(|()| conn));

    log_open_result("memory", started_at, &result);
    result
}

fn bootstrap_connection(conn: &mut Connection, busy_timeout: Duration) -> DbResult<()> {
    conn.busy_timeout(busy_timeout)?;
    apply_migrations(conn).map_err(|err| match err {
        DbError::Sqlite(ref sqlite) if is_lock_contention(sqlite) => DbError::BlockedByOtherInstance,
        other => other,
    })
}

fn ensure_storage_available(path: &Path) -> DbResult<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    match std::fs::metadata(parent) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(DbError::UnsupportedEnvironment {
            location: parent.to_path_buf(),
            reason: "storage location is not a directory".to_string(),
        }),
        Err(err) => Err(DbError::UnsupportedEnvironment {
            location: parent.to_path_buf(),
            reason: err.to_string(),
        }),
    }
}

fn classify_open_error(path: &Path, err: rusqlite::Error) -> DbError {
    match err.sqlite_error_code() {
        Some(ErrorCode::CannotOpen | ErrorCode::ReadOnly | ErrorCode::PermissionDenied) => {
            DbError::UnsupportedEnvironment {
                location: path.to_path_buf(),
                reason: err.to_string(),
            }
        }
        _ => DbError::Sqlite(err),
    }
}

fn log_open_result(mode: &str, started_at: Instant, result: &DbResult<Connection>) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!("event=db_open module=db status=ok mode={mode} duration_ms={duration_ms}"),
        Err(err) => error!(
            "event=db_open module=db status=error mode={mode} duration_ms={duration_ms} error_code={} error={err}",
            error_code(err)
        ),
    }
}

fn error_code(err: &DbError) -> &'static str {
    match err {
        DbError::Sqlite(_) => "db_open_failed",
        DbError::UnsupportedEnvironment { .. } => "unsupported_environment",
        DbError::UnsupportedMigration { .. } => "unsupported_migration",
        DbError::BlockedByOtherInstance => "blocked_by_other_instance",
        DbError::ConnectionStale => "connection_stale",
    }
}
