use serde::{Deserialize, Serialize};

use super::{require_non_empty, ValidationError};

pub const MAX_OFFICE_CODE_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Office {
    pub id: i64,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOffice {
    pub code: String,
    pub name: String,
}

impl NewOffice {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("code", &self.code)?;
        require_non_empty("name", &self.name)?;
        if self.code.trim().chars().count() > MAX_OFFICE_CODE_LEN {
            return Err(ValidationError::new(
                "code",
                format!("must be at most {MAX_OFFICE_CODE_LEN} characters"),
            ));
        }
        Ok(())
    }
}
