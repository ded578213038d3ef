//! Stored record shape of the `model_units` collection.

use std::fmt::{Display, Formatter};

/// Composite primary key `(model_name, unit_name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitKey {
    pub model_name: String,
    pub unit_name: String,
}

impl UnitKey {
    pub fn new(model_name: impl Into<String>, unit_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            unit_name: unit_name.into(),
        }
    }
}

impl Display for UnitKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.model_name, self.unit_name)
    }
}

/// One persisted model unit.
///
/// `unit` and `unit_interface` are opaque serialized payloads produced from
/// the same document at save time. The store never interprets them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub model_name: String,
    pub unit_name: String,
    /// Full serialized document.
    pub unit: String,
    /// Serialized interface projection.
    pub unit_interface: String,
}

impl StoredRecord {
    pub fn key(&self) -> UnitKey {
        UnitKey::new(self.model_name.as_str(), self.unit_name.as_str())
    }
}
