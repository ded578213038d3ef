//! Store manager over the single `model_units` collection.
//!
//! # Responsibility
//! - Own the connection lifecycle of the unit store.
//! - Expose the typed primitives (`get`, `get_all`, `get_all_keys`, `put`,
//!   `delete`) plus the multi-key `rename` and `delete_model`.
//!
//! # Invariants
//! - Records are keyed by `(model_name, unit_name)`; writing an existing key
//!   replaces the record.

pub mod manager;
pub mod record;

pub use manager::{AccessMode, StoreManager};
pub use record::{StoredRecord, UnitKey};
