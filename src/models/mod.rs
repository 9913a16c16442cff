pub mod agency;
pub mod contact;
pub mod datetime;
pub mod employee;
pub mod enums;
pub mod log;
pub mod office;
pub mod patch;
pub mod production;
pub mod submission;
pub mod task;

pub use agency::*;
pub use contact::*;
pub use employee::*;
pub use log::*;
pub use office::*;
pub use production::*;
pub use submission::*;
pub use task::*;

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// A payload that parsed but breaks a field rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

static MONTH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").unwrap());

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value.trim())
}

/// `YYYY-MM` with a real month number.
pub fn is_valid_month(value: &str) -> bool {
    MONTH_PATTERN.is_match(value)
}

pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(())
}
