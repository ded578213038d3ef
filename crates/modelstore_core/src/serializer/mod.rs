//! Serialization boundary between domain documents and stored payloads.
//!
//! # Responsibility
//! - Turn a domain unit into a plain JSON value, in full or interface form.
//! - Rebuild a domain unit from a stored JSON value.
//!
//! # Invariants
//! - Serializers are pure: the same unit always yields the same value.

use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod json;

pub use json::{JsonUnitSerializer, STORAGE_FORMAT_VERSION};

/// Converts domain units to and from their storage form.
pub trait UnitSerializer {
    type Unit;

    /// Produces the storage form; `interface_only` selects the projection.
    fn to_storage_form(
        &self,
        unit: &Self::Unit,
        interface_only: bool,
    ) -> Result<Value, SerializerError>;

    /// Rebuilds a unit from its storage form.
    fn from_storage_form(&self, data: &Value) -> Result<Self::Unit, SerializerError>;
}

/// Serialization or deserialization failure with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializerError {
    message: String,
}

impl SerializerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for SerializerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for SerializerError {}

impl From<serde_json::Error> for SerializerError {
    fn from(value: serde_json::Error) -> Self {
        Self::new(value.to_string())
    }
}
