use serde::{Deserialize, Serialize};

use super::patch::double_option;
use super::{is_valid_email, require_non_empty, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub agency_id: i64,
    pub notes: Option<String>,
    pub linkedin_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewContact {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub agency_id: i64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
}

fn check_email(email: Option<&str>) -> Result<(), ValidationError> {
    match email {
        Some(e) if !e.is_empty() && !is_valid_email(e) => Err(ValidationError::new(
            "email",
            "value is not a valid email address",
        )),
        _ => Ok(()),
    }
}

impl NewContact {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("name", &self.name)?;
        check_email(self.email.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default)]
    pub agency_id: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub linkedin_url: Option<Option<String>>,
}

impl ContactUpdate {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            require_non_empty("name", name)?;
        }
        check_email(self.email.as_ref().and_then(|e| e.as_deref()))
    }
}
