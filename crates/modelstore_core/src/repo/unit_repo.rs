//! Unit repository over the store manager.
//!
//! # Responsibility
//! - Provide model/unit shaped save, load, list, rename and delete APIs.
//! - Validate names before any write.
//! - Coordinate the serializer: one save produces the full payload and the
//!   interface payload from the same document.
//!
//! # Invariants
//! - Rejected names never reach storage.
//! - Rejections are reported to the notifier and returned as outcome values;
//!   only storage and connection failures are returned as `Err`.
//! - `rename_unit` and `delete_model` are all-or-nothing.

use crate::db::{DbError, DbResult};
use crate::model::name::{validate_model_name, validate_unit_name, NameError};
use crate::notify::ErrorNotifier;
use crate::serializer::UnitSerializer;
use crate::store::{StoreManager, StoredRecord, UnitKey};
use log::{info, warn};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type RepoResult<T> = Result<T, DbError>;

/// Per-record failure absorbed by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Model or unit name failed validation; nothing was written.
    InvalidName(NameError),
    /// Serializer could not produce a storage form; nothing was written.
    Serialization { key: UnitKey, message: String },
    /// Stored payload could not be turned back into a unit.
    Deserialization { key: UnitKey, message: String },
}

impl Display for Rejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName(err) => write!(f, "{err}"),
            Self::Serialization { key, message } => {
                write!(f, "cannot serialize unit {key}: {message}")
            }
            Self::Deserialization { key, message } => {
                write!(f, "cannot load unit {key}: {message}")
            }
        }
    }
}

/// Result of a save or rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Rejected(Rejection),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }
}

/// Result of a unit or interface load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome<T> {
    Loaded(T),
    NotFound,
    Rejected(Rejection),
}

impl<T> LoadOutcome<T> {
    /// Returns the loaded value, dropping the reason for its absence.
    pub fn loaded(self) -> Option<T> {
        match self {
            Self::Loaded(value) => Some(value),
            Self::NotFound | Self::Rejected(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Payload {
    Full,
    Interface,
}

impl Payload {
    fn select(self, record: &StoredRecord) -> &str {
        match self {
            Self::Full => &record.unit,
            Self::Interface => &record.unit_interface,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Full => "unit",
            Self::Interface => "unit_interface",
        }
    }
}

/// Model/unit repository backed by a [`StoreManager`].
pub struct UnitRepository<'store, S: UnitSerializer> {
    store: &'store StoreManager,
    serializer: S,
    notifier: Arc<dyn ErrorNotifier>,
}

impl<'store, S: UnitSerializer> UnitRepository<'store, S> {
    pub fn new(store: &'store StoreManager, serializer: S, notifier: Arc<dyn ErrorNotifier>) -> Self {
        Self {
            store,
            serializer,
            notifier,
        }
    }

    pub fn store(&self) -> &'store StoreManager {
        self.store
    }

    pub fn notifier(&self) -> &Arc<dyn ErrorNotifier> {
        &self.notifier
    }

    /// Serializes `unit` in full and interface form and stores both under
    /// `(model_name, unit_name)`, replacing any previous record.
    pub fn save_unit(
        &self,
        model_name: &str,
        unit_name: &str,
        unit: &S::Unit,
    ) -> RepoResult<SaveOutcome> {
        let record = match self.encode(model_name, unit_name, unit) {
            Ok(record) => record,
            Err(rejection) => return Ok(self.reject_save(rejection)),
        };

        self.store.put(&record)?;
        info!(
            "event=unit_save module=repo status=ok model={model_name} unit={unit_name} unit_bytes={} interface_bytes={}",
            record.unit.len(),
            record.unit_interface.len()
        );
        Ok(SaveOutcome::Saved)
    }

    /// Removes one unit. Returns whether it existed; absence is not an error.
    pub fn delete_unit(&self, model_name: &str, unit_name: &str) -> RepoResult<bool> {
        let removed = self.store.delete(&UnitKey::new(model_name, unit_name))?;
        info!("event=unit_delete module=repo status=ok model={model_name} unit={unit_name} removed={removed}");
        Ok(removed)
    }

    /// Removes every unit of a model, which removes the model itself.
    ///
    /// Returns the number of removed units.
    pub fn delete_model(&self, model_name: &str) -> RepoResult<usize> {
        let removed = self.store.delete_model(model_name)?;
        info!("event=model_delete module=repo status=ok model={model_name} removed={removed}");
        Ok(removed)
    }

    /// Lists the distinct model names, sorted.
    pub fn list_models(&self) -> RepoResult<Vec<String>> {
        let names = self
            .store
            .get_all_keys()?
            .into_iter()
            .map(|key| key.model_name)
            .collect::<BTreeSet<_>>();
        Ok(names.into_iter().collect())
    }

    /// Lists the distinct unit names of one model, sorted.
    pub fn list_units(&self, model_name: &str) -> RepoResult<Vec<String>> {
        let names = self
            .store
            .get_all_keys()?
            .into_iter()
            .filter(|key| key.model_name == model_name)
            .map(|key| key.unit_name)
            .collect::<BTreeSet<_>>();
        Ok(names.into_iter().collect())
    }

    /// Loads and deserializes the full unit.
    pub fn load_unit(&self, model_name: &str, unit_name: &str) -> RepoResult<LoadOutcome<S::Unit>> {
        self.load(UnitKey::new(model_name, unit_name), Payload::Full)
    }

    /// Loads and deserializes only the interface projection.
    pub fn load_unit_interface(
        &self,
        model_name: &str,
        unit_name: &str,
    ) -> RepoResult<LoadOutcome<S::Unit>> {
        self.load(UnitKey::new(model_name, unit_name), Payload::Interface)
    }

    /// Stores `unit` under `new_name` and removes `old_name` in one
    /// transaction. Validation applies to `new_name` as for a save.
    pub fn rename_unit(
        &self,
        model_name: &str,
        old_name: &str,
        new_name: &str,
        unit: &S::Unit,
    ) -> RepoResult<SaveOutcome> {
        let record = match self.encode(model_name, new_name, unit) {
            Ok(record) => record,
            Err(rejection) => return Ok(self.reject_save(rejection)),
        };

        self.store.rename(&record, old_name)?;
        info!("event=unit_rename module=repo status=ok model={model_name} from={old_name} to={new_name}");
        Ok(SaveOutcome::Saved)
    }

    fn encode(
        &self,
        model_name: &str,
        unit_name: &str,
        unit: &S::Unit,
    ) -> Result<StoredRecord, Rejection> {
        validate_model_name(model_name).map_err(Rejection::InvalidName)?;
        validate_unit_name(unit_name).map_err(Rejection::InvalidName)?;

        let serialization_failed = |message: String| Rejection::Serialization {
            key: UnitKey::new(model_name, unit_name),
            message,
        };
        let full = self
            .serializer
            .to_storage_form(unit, false)
            .map_err(|err| serialization_failed(err.to_string()))?;
        let interface = self
            .serializer
            .to_storage_form(unit, true)
            .map_err(|err| serialization_failed(err.to_string()))?;

        Ok(StoredRecord {
            model_name: model_name.to_string(),
            unit_name: unit_name.to_string(),
            unit: full.to_string(),
            unit_interface: interface.to_string(),
        })
    }

    fn load(&self, key: UnitKey, payload: Payload) -> DbResult<LoadOutcome<S::Unit>> {
        let Some(record) = self.store.get(&key)? else {
            info!(
                "event=unit_load module=repo status=not_found key={key} payload={}",
                payload.as_str()
            );
            return Ok(LoadOutcome::NotFound);
        };

        let decoded = serde_json::from_str::<Value>(payload.select(&record))
            .map_err(|err| err.to_string())
            .and_then(|data| {
                self.serializer
                    .from_storage_form(&data)
                    .map_err(|err| err.to_string())
            });

        match decoded {
            Ok(unit) => Ok(LoadOutcome::Loaded(unit)),
            Err(message) => {
                let rejection = Rejection::Deserialization { key, message };
                self.report(&rejection);
                Ok(LoadOutcome::Rejected(rejection))
            }
        }
    }

    fn reject_save(&self, rejection: Rejection) -> SaveOutcome {
        self.report(&rejection);
        SaveOutcome::Rejected(rejection)
    }

    fn report(&self, rejection: &Rejection) {
        warn!(
            "event=unit_rejected module=repo status=error kind={}",
            rejection_kind(rejection)
        );
        self.notifier.notify(&rejection.to_string());
    }
}

fn rejection_kind(rejection: &Rejection) -> &'static str {
    match rejection {
        Rejection::InvalidName(_) => "invalid_name",
        Rejection::Serialization { .. } => "serialization",
        Rejection::Deserialization { .. } => "deserialization",
    }
}
