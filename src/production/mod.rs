//! Monthly production report import (Excel).

pub mod grid;
pub mod import;
#[cfg(test)]
pub(crate) mod testing;

pub use grid::*;
pub use import::*;

use serde::Serialize;
use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("File must be Excel format (.xls or .xlsx)")]
    InvalidFileType,

    #[error("office is required")]
    MissingOffice,

    #[error("month must be in YYYY-MM format")]
    InvalidMonth,

    #[error("Could not read Excel file: {0}")]
    Workbook(String),

    #[error("Could not find 'Code' header in Excel file")]
    HeaderNotFound,

    #[error("Missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::Database(err.into())
    }
}

impl ImportError {
    /// Problems with the upload itself, as opposed to server failures.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ImportError::Database(_))
    }
}

/// Outcome reported back to the admin screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    pub success: bool,
    pub production_rows_imported: usize,
    pub new_agencies_created: usize,
    pub agencies_updated: usize,
    pub office: String,
    pub month: String,
    /// First few names only.
    pub new_agency_names: Vec<String>,
}
