use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::datetime::{self, flexible};
use super::patch::double_option;
use super::{require_non_empty, ValidationError};

/// One marketing touchpoint (call, visit, email) with an agency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketingLog {
    pub id: i64,
    pub user: String,
    #[serde(with = "flexible")]
    pub datetime: NaiveDateTime,
    pub action: String,
    pub agency_id: Option<i64>,
    pub office: Option<String>,
    pub notes: Option<String>,
    pub contact_id: Option<i64>,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMarketingLog {
    pub user: String,
    #[serde(with = "flexible")]
    pub datetime: NaiveDateTime,
    pub action: String,
    #[serde(default)]
    pub agency_id: Option<i64>,
    #[serde(default)]
    pub office: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub contact_id: Option<i64>,
    #[serde(default)]
    pub contact: Option<String>,
}

impl NewMarketingLog {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("user", &self.user)?;
        require_non_empty("action", &self.action)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketingLogUpdate {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default, deserialize_with = "optional_datetime")]
    pub datetime: Option<NaiveDateTime>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub agency_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub office: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub contact_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub contact: Option<Option<String>>,
}

/// The log timestamp is required, so an explicit null leaves it unchanged.
fn optional_datetime<'de, D>(d: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    datetime::flexible_option::deserialize(d)
}
