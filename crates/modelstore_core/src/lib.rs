//! Local persistence for model units.
//! Owns the on-device schema, the single store connection, and the
//! repository contract editors use to save and load units.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod serializer;
pub mod service;
pub mod store;

pub use config::{StoreConfig, StoreLocation};
pub use db::{DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::name::{is_valid_unit_name, NameError};
pub use model::unit::{ModelUnit, UnitNode};
pub use notify::{ErrorNotifier, LogNotifier, MemoryNotifier};
pub use repo::unit_repo::{LoadOutcome, Rejection, RepoResult, SaveOutcome, UnitRepository};
pub use serializer::{JsonUnitSerializer, SerializerError, UnitSerializer};
pub use service::communication::{LocalCommunication, ModelCommunication};
pub use store::{AccessMode, StoreManager, StoredRecord, UnitKey};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
