//! Locating and reading production figures in a raw worksheet grid.
//!
//! Report layouts drift between months: banner rows sit above the header,
//! and figure columns are renamed or repeated. The grid is therefore read
//! without assuming a header position.

use calamine::Data;

use super::ImportError;
use crate::intake::cell_text;
use crate::models::enums::ActiveFlag;

const CODE_HEADER: &str = "Code";
const AGENCY_HEADER: &str = "Agency";
const ACTIVE_HEADERS: &[&str] = &["Active?", "Active"];

/// One agency line of the report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductionRow {
    pub agency_code: String,
    pub agency_name: String,
    /// Normalized; empty when the sheet has no flag.
    pub active_flag: String,
    pub all_ytd_wp: i64,
    pub all_ytd_nb: i64,
    pub pytd_wp: i64,
    pub pytd_nb: i64,
    pub py_total_nb: i64,
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Numeric value of a cell; text is read after dropping `,` and `$`.
pub fn cell_number(cell: &Data) -> f64 {
    match cell {
        Data::Int(n) => *n as f64,
        Data::Float(f) => *f,
        Data::String(s) => s
            .replace([',', '$'], "")
            .trim()
            .parse::<f64>()
            .unwrap_or(0.0),
        _ => 0.0,
    }
}

fn truncate(value: f64) -> i64 {
    if value.is_finite() {
        value.trunc() as i64
    } else {
        0
    }
}

/// Index of the first row whose first cell reads `Code`.
pub fn find_header_row(grid: &[Vec<Data>]) -> Option<usize> {
    grid.iter().position(|row| {
        row.first()
            .is_some_and(|cell| cell_text(cell).trim() == CODE_HEADER)
    })
}

/// Columns whose lowercased header starts with `prefix`, left to right.
fn prefixed_columns(headers: &[String], prefix: &str) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .filter(|(_, name)| name.to_lowercase().starts_with(prefix))
        .map(|(i, _)| i)
        .collect()
}

/// Rightmost non-blank cell among `columns`, as a whole number.
fn coalesce(row: &[Data], columns: &[usize]) -> i64 {
    columns
        .iter()
        .rev()
        .filter_map(|&i| row.get(i))
        .find(|cell| !is_blank(cell))
        .map(|cell| truncate(cell_number(cell)))
        .unwrap_or(0)
}

/// Parse the agency rows below the header.
pub fn parse_production_grid(grid: &[Vec<Data>]) -> Result<Vec<ProductionRow>, ImportError> {
    let header_idx = find_header_row(grid).ok_or(ImportError::HeaderNotFound)?;
    let headers: Vec<String> = grid[header_idx]
        .iter()
        .map(|cell| cell_text(cell).trim().to_string())
        .collect();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let code_col = column(CODE_HEADER).ok_or(ImportError::MissingColumn(CODE_HEADER))?;
    let agency_col = column(AGENCY_HEADER).ok_or(ImportError::MissingColumn(AGENCY_HEADER))?;
    let active_col = ACTIVE_HEADERS.iter().find_map(|name| column(name));

    let ytd_wp = prefixed_columns(&headers, "ytd wp");
    let ytd_nb = prefixed_columns(&headers, "ytd nb");
    let pytd_wp = prefixed_columns(&headers, "pytd wp");
    let pytd_nb = prefixed_columns(&headers, "pytd nb");
    let py_total_nb = prefixed_columns(&headers, "py total nb");

    let empty = Data::Empty;
    let rows = grid[header_idx + 1..]
        .iter()
        .filter_map(|row| {
            let code = row.get(code_col).unwrap_or(&empty);
            let name = row.get(agency_col).unwrap_or(&empty);
            if is_blank(code) || is_blank(name) {
                return None;
            }
            let active_flag = active_col
                .and_then(|i| row.get(i))
                .map(|cell| ActiveFlag::normalize(&cell_text(cell)))
                .unwrap_or_default();
            Some(ProductionRow {
                agency_code: cell_text(code).trim().to_string(),
                agency_name: cell_text(name).trim().to_string(),
                active_flag,
                all_ytd_wp: coalesce(row, &ytd_wp),
                all_ytd_nb: coalesce(row, &ytd_nb),
                pytd_wp: coalesce(row, &pytd_wp),
                pytd_nb: coalesce(row, &pytd_nb),
                py_total_nb: coalesce(row, &py_total_nb),
            })
        })
        .collect();
    Ok(rows)
}
