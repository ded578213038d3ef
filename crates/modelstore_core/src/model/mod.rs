//! Domain documents persisted by the unit store.
//!
//! # Responsibility
//! - Define the model unit tree and its interface projection.
//! - Own naming rules for models and units.
//!
//! # Invariants
//! - A model has no record of its own; it exists while it has units.

pub mod name;
pub mod unit;
