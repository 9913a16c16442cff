use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::datetime::{deserialize_patch, flexible_option};
use super::patch::double_option;
use super::{require_non_empty, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(with = "flexible_option")]
    pub due_date: Option<NaiveDateTime>,
    pub status: Option<String>,
    pub owner: Option<String>,
    pub notes: Option<String>,
    pub agency_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default, with = "flexible_option")]
    pub due_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub agency_id: Option<i64>,
}

impl NewTask {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("title", &self.title)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_patch")]
    pub due_date: Option<Option<NaiveDateTime>>,
    #[serde(default, deserialize_with = "double_option")]
    pub status: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub owner: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub agency_id: Option<Option<i64>>,
}
