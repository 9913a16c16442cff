use serde::{Deserialize, Serialize};

use super::patch::double_option;
use super::{require_non_empty, ValidationError};

pub const DEFAULT_ACTIVE_FLAG: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agency {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub office_id: Option<i64>,
    pub web_address: Option<String>,
    pub notes: Option<String>,
    pub primary_underwriter_id: Option<i64>,
    /// Display name; follows the linked employee when there is one.
    pub primary_underwriter: Option<String>,
    pub active_flag: Option<String>,
    pub dba: Option<String>,
    pub email: Option<String>,
}

fn default_active_flag() -> Option<String> {
    Some(DEFAULT_ACTIVE_FLAG.to_string())
}

/// Full agency body for create and replace.
#[derive(Debug, Clone, Deserialize)]
pub struct AgencyInput {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub office_id: Option<i64>,
    #[serde(default)]
    pub web_address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub primary_underwriter_id: Option<i64>,
    #[serde(default)]
    pub primary_underwriter: Option<String>,
    #[serde(default = "default_active_flag")]
    pub active_flag: Option<String>,
    #[serde(default)]
    pub dba: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl AgencyInput {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            office_id: None,
            web_address: None,
            notes: None,
            primary_underwriter_id: None,
            primary_underwriter: None,
            active_flag: default_active_flag(),
            dba: None,
            email: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        require_non_empty("code", &self.code)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgencyUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub office_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub web_address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub primary_underwriter_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub primary_underwriter: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub active_flag: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub dba: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
}
