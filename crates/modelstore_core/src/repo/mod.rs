//! Repository layer over the unit store.
//!
//! # Responsibility
//! - Expose model/unit shaped persistence APIs to services.
//! - Keep naming rules and the serializer boundary out of the store manager.
//!
//! # Invariants
//! - Repository writes must pass name validation before reaching storage.

pub mod unit_repo;
