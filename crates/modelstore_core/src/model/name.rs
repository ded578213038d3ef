//! Model and unit name validation.
//!
//! # Invariants
//! - Unit names match `^[A-Za-z][A-Za-z0-9_-]*$`.
//! - Model names are non-empty after trimming.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static UNIT_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("valid unit name regex"));

/// Name validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    EmptyModelName,
    InvalidUnitName(String),
}

impl Display for NameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyModelName => write!(f, "Name of Model may not be empty."),
            Self::InvalidUnitName(name) => write!(
                f,
                "Name of Unit '{name}' may contain only characters, numbers, '_', or '-', and must start with a character."
            ),
        }
    }
}

impl Error for NameError {}

pub fn is_valid_unit_name(unit_name: &str) -> bool {
    UNIT_NAME_RE.is_match(unit_name)
}

pub fn validate_unit_name(unit_name: &str) -> Result<(), NameError> {
    if is_valid_unit_name(unit_name) {
        Ok(())
    } else {
        Err(NameError::InvalidUnitName(unit_name.to_string()))
    }
}

pub fn validate_model_name(model_name: &str) -> Result<(), NameError> {
    if model_name.trim().is_empty() {
        Err(NameError::EmptyModelName)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{is_valid_unit_name, validate_model_name, validate_unit_name, NameError};

    #[test]
    fn accepts_identifier_like_unit_names() {
        for name in ["Order_1", "a", "Z-9", "snake_case-and-dash"] {
            assert!(is_valid_unit_name(name), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_malformed_unit_names() {
        for name in ["1bad", "", "bad name", "_lead", "-lead", "a,b", "ümlaut", "trail\n"] {
            assert!(!is_valid_unit_name(name), "{name:?} should be invalid");
        }
    }

    #[test]
    fn error_message_names_the_unit() {
        let err = validate_unit_name("1bad").unwrap_err();
        assert_eq!(err, NameError::InvalidUnitName("1bad".to_string()));
        assert!(err.to_string().contains("'1bad'"));
    }

    #[test]
    fn blank_model_name_is_rejected() {
        assert_eq!(validate_model_name("  "), Err(NameError::EmptyModelName));
        assert!(validate_model_name("Shop").is_ok());
    }
}
