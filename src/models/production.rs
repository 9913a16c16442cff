use serde::{Deserialize, Serialize};

use super::{is_valid_month, require_non_empty, ValidationError};

/// One agency's production figures for an office and reporting month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    pub office: String,
    pub agency_code: String,
    pub agency_name: String,
    #[serde(default)]
    pub active_flag: Option<String>,
    /// `YYYY-MM`
    pub month: String,
    #[serde(default)]
    pub all_ytd_wp: Option<i64>,
    #[serde(default)]
    pub all_ytd_nb: Option<i64>,
    #[serde(default)]
    pub pytd_wp: Option<i64>,
    #[serde(default)]
    pub pytd_nb: Option<i64>,
    #[serde(default)]
    pub py_total_nb: Option<i64>,
    #[serde(default)]
    pub affiliated_code: Option<String>,
    #[serde(default)]
    pub standard_lines_ytd_wp: Option<i64>,
    #[serde(default)]
    pub standard_lines_ytd_nb: Option<i64>,
    #[serde(default)]
    pub standard_lines_pytd_wp: Option<i64>,
    #[serde(default)]
    pub standard_lines_pytd_nb: Option<i64>,
    #[serde(default)]
    pub surplus_lines_ytd_wp: Option<i64>,
    #[serde(default)]
    pub surplus_lines_ytd_nb: Option<i64>,
    #[serde(default)]
    pub surplus_lines_pytd_wp: Option<i64>,
    #[serde(default)]
    pub surplus_lines_pytd_nb: Option<i64>,
    #[serde(default)]
    pub premium_change: Option<i64>,
    #[serde(default)]
    pub three_year_plus: Option<i64>,
    #[serde(default)]
    pub twelve_mo_bind_ratio: Option<String>,
    #[serde(default)]
    pub twelve_mo_bound: Option<i64>,
    #[serde(default)]
    pub twelve_mo_quoted: Option<i64>,
    #[serde(default)]
    pub twelve_mo_decline: Option<i64>,
}

impl ProductionRecord {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("office", &self.office)?;
        require_non_empty("agency_code", &self.agency_code)?;
        require_non_empty("agency_name", &self.agency_name)?;
        if !is_valid_month(&self.month) {
            return Err(ValidationError::new("month", "expected YYYY-MM"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Production {
    pub id: i64,
    #[serde(flatten)]
    pub record: ProductionRecord,
}

/// Monthly office totals, current year against prior year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionTrendPoint {
    pub month: String,
    pub current_ytd_wp: i64,
    pub prior_ytd_wp: i64,
    pub current_ytd_nb: i64,
    pub prior_ytd_nb: i64,
}
