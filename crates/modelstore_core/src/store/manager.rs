//! Store manager: connection lifecycle and typed primitives.
//!
//! # Responsibility
//! - Own the one SQLite connection of the unit store, opened lazily.
//! - Scope every primitive in its own transaction through [`StoreManager::run`].
//! - Detect schema changes made by another instance and fail fast afterwards.
//!
//! # Invariants
//! - At most one connection is opened per manager, even for overlapping
//!   `connect` calls from several threads.
//! - Once stale, a manager never reopens; every call returns
//!   `ConnectionStale`.
//! - Each primitive commits before returning, so sequential calls observe
//!   each other in issue order.

use crate::config::{StoreConfig, StoreLocation, DATABASE_FILE_NAME};
use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{open_db, open_db_in_memory, DbError, DbResult};
use crate::store::record::{StoredRecord, UnitKey};
use log::{debug, info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

const RECORD_SELECT_SQL: &str = "SELECT
    model_name,
    unit_name,
    unit,
    unit_interface
FROM model_units";

/// Transaction mode of a primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

impl AccessMode {
    fn behavior(self) -> TransactionBehavior {
        match self {
            Self::ReadOnly => TransactionBehavior::Deferred,
            Self::ReadWrite => TransactionBehavior::Immediate,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "read_only",
            Self::ReadWrite => "read_write",
        }
    }
}

#[derive(Default)]
struct ConnectionSlot {
    conn: Option<Connection>,
    stale: bool,
}

/// Owner of the unit store connection.
///
/// Construct one per application and hand references to the repositories
/// that need it.
pub struct StoreManager {
    config: StoreConfig,
    slot: Mutex<ConnectionSlot>,
    opened: AtomicUsize,
}

impl StoreManager {
    /// Creates a manager without touching storage.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            slot: Mutex::new(ConnectionSlot::default()),
            opened: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Establishes the connection, or confirms the cached one is usable.
    ///
    /// # Errors
    /// - `UnsupportedEnvironment` when the storage location is unusable.
    /// - `UnsupportedMigration` when the database has an unknown schema.
    /// - `BlockedByOtherInstance` when another instance holds the lock.
    /// - `ConnectionStale` when the connection was invalidated earlier.
    pub fn connect(&self) -> DbResult<()> {
        let mut slot = self.lock_slot();
        self.ensure_open(&mut slot).map(|_| ())
    }

    /// Number of underlying connections opened by this manager.
    pub fn connections_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    /// Whether an external schema change invalidated the connection.
    pub fn is_stale(&self) -> bool {
        self.lock_slot().stale
    }

    /// Runs `op` inside one transaction on the shared connection.
    ///
    /// The schema version is re-read at the start of every transaction; a
    /// mismatch closes the connection and marks the manager stale.
    /// Storage engine errors from `op` propagate unchanged and roll back.
    pub fn run<T>(
        &self,
        mode: AccessMode,
        op: impl FnOnce(&Transaction<'_>) -> DbResult<T>,
    ) -> DbResult<T> {
        let mut slot = self.lock_slot();
        let conn = self.ensure_open(&mut slot)?;
        let tx = conn.transaction_with_behavior(mode.behavior())?;

        let version = current_user_version(&tx)?;
        if version != latest_version() {
            drop(tx);
            invalidate(&mut slot, version);
            return Err(DbError::ConnectionStale);
        }

        let value = op(&tx)?;
        tx.commit()?;
        debug!("event=store_run module=store status=ok mode={}", mode.as_str());
        Ok(value)
    }

    /// Reads one record by exact key.
    pub fn get(&self, key: &UnitKey) -> DbResult<Option<StoredRecord>> {
        self.run(AccessMode::ReadOnly, |tx| select_record(tx, key))
    }

    /// Reads every record, ordered by key.
    pub fn get_all(&self) -> DbResult<Vec<StoredRecord>> {
        self.run(AccessMode::ReadOnly, |tx| {
            let mut stmt =
                tx.prepare(&format!("{RECORD_SELECT_SQL} ORDER BY model_name, unit_name;"))?;
            let mut rows = stmt.query([])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(parse_record_row(row)?);
            }
            Ok(records)
        })
    }

    /// Reads every key without loading payloads, ordered by key.
    pub fn get_all_keys(&self) -> DbResult<Vec<UnitKey>> {
        self.run(AccessMode::ReadOnly, |tx| {
            let mut stmt = tx.prepare(
                "SELECT model_name, unit_name FROM model_units ORDER BY model_name, unit_name;",
            )?;
            let mut rows = stmt.query([])?;
            let mut keys = Vec::new();
            while let Some(row) = rows.next()? {
                keys.push(UnitKey::new(
                    row.get::<_, String>("model_name")?,
                    row.get::<_, String>("unit_name")?,
                ));
            }
            Ok(keys)
        })
    }

    /// Inserts or replaces the record at its key.
    pub fn put(&self, record: &StoredRecord) -> DbResult<()> {
        self.run(AccessMode::ReadWrite, |tx| upsert_record(tx, record))
    }

    /// Removes the record at `key`. Returns whether a record existed.
    pub fn delete(&self, key: &UnitKey) -> DbResult<bool> {
        self.run(AccessMode::ReadWrite, |tx| delete_record(tx, key))
    }

    /// Writes `record` and removes `old_unit_name` of the same model in one
    /// transaction.
    pub fn rename(&self, record: &StoredRecord, old_unit_name: &str) -> DbResult<()> {
        let old_key = UnitKey::new(record.model_name.as_str(), old_unit_name);
        self.run(AccessMode::ReadWrite, |tx| {
            upsert_record(tx, record)?;
            if old_key != record.key() {
                delete_record(tx, &old_key)?;
            }
            Ok(())
        })
    }

    /// Removes every unit of `model_name` in one transaction.
    ///
    /// Returns the number of removed records.
    pub fn delete_model(&self, model_name: &str) -> DbResult<usize> {
        self.run(AccessMode::ReadWrite, |tx| {
            let removed = tx.execute(
                "DELETE FROM model_units WHERE model_name = ?1;",
                [model_name],
            )?;
            Ok(removed)
        })
    }

    fn lock_slot(&self) -> MutexGuard<'_, ConnectionSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_open<'slot>(
        &self,
        slot: &'slot mut ConnectionSlot,
    ) -> DbResult<&'slot mut Connection> {
        if slot.stale {
            return Err(DbError::ConnectionStale);
        }
        let conn = match slot.conn.take() {
            Some(conn) => conn,
            None => self.open_connection()?,
        };
        Ok(slot.conn.insert(conn))
    }

    fn open_connection(&self) -> DbResult<Connection> {
        let conn = match &self.config.location {
            StoreLocation::Directory(dir) => {
                open_db(dir.join(DATABASE_FILE_NAME), self.config.busy_timeout)?
            }
            StoreLocation::Memory => open_db_in_memory()?,
        };
        let count = self.opened.fetch_add(1, Ordering::SeqCst) + 1;
        info!("event=store_connect module=store status=ok connections_opened={count}");
        Ok(conn)
    }
}

fn invalidate(slot: &mut ConnectionSlot, found_version: u32) {
    slot.conn = None;
    slot.stale = true;
    warn!(
        "event=store_stale module=store status=error found_version={found_version} expected_version={} error_code=connection_stale",
        latest_version()
    );
}

fn select_record(conn: &Connection, key: &UnitKey) -> DbResult<Option<StoredRecord>> {
    let record = conn
        .query_row(
            &format!("{RECORD_SELECT_SQL} WHERE model_name = ?1 AND unit_name = ?2;"),
            params![key.model_name.as_str(), key.unit_name.as_str()],
            parse_record_row,
        )
        .optional()?;
    Ok(record)
}

fn upsert_record(conn: &Connection, record: &StoredRecord) -> DbResult<()> {
    conn.execute(
        "INSERT INTO model_units (model_name, unit_name, unit, unit_interface)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (model_name, unit_name) DO UPDATE SET
            unit = excluded.unit,
            unit_interface = excluded.unit_interface;",
        params![
            record.model_name.as_str(),
            record.unit_name.as_str(),
            record.unit.as_str(),
            record.unit_interface.as_str(),
        ],
    )?;
    Ok(())
}

fn delete_record(conn: &Connection, key: &UnitKey) -> DbResult<bool> {
    let removed = conn.execute(
        "DELETE FROM model_units WHERE model_name = ?1 AND unit_name = ?2;",
        params![key.model_name.as_str(), key.unit_name.as_str()],
    )?;
    Ok(removed > 0)
}

fn parse_record_row(row: &Row<'_>) -> rusqlite::Result<StoredRecord> {
    Ok(StoredRecord {
        model_name: row.get("model_name")?,
        unit_name: row.get("unit_name")?,
        unit: row.get("unit")?,
        unit_interface: row.get("unit_interface")?,
    })
}

#[cfg(test)]
mod tests {
    use super::{AccessMode, StoreManager};
    use crate::config::StoreConfig;
    use crate::db::DbError;
    use crate::store::record::{StoredRecord, UnitKey};

    fn record(model: &str, unit: &str, body: &str) -> StoredRecord {
        StoredRecord {
            model_name: model.to_string(),
            unit_name: unit.to_string(),
            unit: body.to_string(),
            unit_interface: "{}".to_string(),
        }
    }

    #[test]
    fn manager_is_lazy_until_first_use() {
        let store = StoreManager::new(StoreConfig::in_memory());
        assert_eq!(store.connections_opened(), 0);
        store.get_all_keys().unwrap();
        store.get_all_keys().unwrap();
        assert_eq!(store.connections_opened(), 1);
    }

    #[test]
    fn failed_operation_rolls_back_its_transaction() {
        let store = StoreManager::new(StoreConfig::in_memory());
        let err = store
            .run(AccessMode::ReadWrite, |tx| {
                tx.execute(
                    "INSERT INTO model_units (model_name, unit_name, unit, unit_interface)
                     VALUES ('M', 'U', '{}', '{}');",
                    [],
                )?;
                Err::<(), _>(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
            })
            .unwrap_err();
        assert!(matches!(err, DbError::Sqlite(_)));
        assert!(store.get(&UnitKey::new("M", "U")).unwrap().is_none());
    }

    #[test]
    fn empty_names_are_rejected_by_schema() {
        let store = StoreManager::new(StoreConfig::in_memory());
        let err = store.put(&record("", "U", "{}")).unwrap_err();
        assert!(matches!(err, DbError::Sqlite(_)));
    }

    #[test]
    fn rename_to_same_name_keeps_record() {
        let store = StoreManager::new(StoreConfig::in_memory());
        store.put(&record("M", "A", "old")).unwrap();
        store.rename(&record("M", "A", "new"), "A").unwrap();

        let loaded = store.get(&UnitKey::new("M", "A")).unwrap().unwrap();
        assert_eq!(loaded.unit, "new");
    }
}
