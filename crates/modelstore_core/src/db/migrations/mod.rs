//! Schema registry and bootstrap executor.
//!
//! # Responsibility
//! - Register the schema scripts for the `model_units` collection.
//! - Create the schema on a fresh database in one transaction.
//!
//! # Invariants
//! - Only a fresh database (`user_version = 0`) is ever migrated.
//! - Any other version that is not the latest is rejected as unsupported.
//! - Applied version is mirrored to `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use log::{info, warn};
use rusqlite::{Connection, TransactionBehavior};

/// Name of the single collection holding model units.
pub const MODEL_UNITS_TABLE: &str = "model_units";

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_model_units.sql"),
}];

/// Returns the schema version this binary reads and writes.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Brings a fresh database to the latest schema, or rejects an unknown one.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let latest = latest_version();
    match current_user_version(conn)? {
        0 => {}
        version if version == latest => return Ok(()),
        found => {
            warn!(
                "event=db_migrate module=db status=error found={found} supported={latest} error_code=unsupported_migration"
            );
            return Err(DbError::UnsupportedMigration {
                found,
                supported: latest,
            });
        }
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    // Another instance may have finished bootstrap while this one waited.
    let version = current_user_version(&tx)?;
    if version == latest {
        tx.commit()?;
        return Ok(());
    }
    if version != 0 {
        return Err(DbError::UnsupportedMigration {
            found: version,
            supported: latest,
        });
    }

    for migration in MIGRATIONS {
        tx.execute_batch(migration.sql)?;
        tx.pragma_update(None, "user_version", migration.version)?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version=0 to_version={latest}");
    Ok(())
}

/// Reads the schema version stored in the database header.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.pragma_query_value(None, "user_version", |row| row.get::<_, u32>(0))?;
    Ok(version)
}
