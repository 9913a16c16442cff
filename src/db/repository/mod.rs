//! Repository layer: entity-scoped database operations.
//!
//! One sub-module per table. All public functions are re-exported here,
//! so callers use `db::insert_agency(...)` and friends directly.

mod agency;
mod contact;
mod employee;
mod log;
mod office;
mod production;
mod submission;
mod task;

use rusqlite::{params_from_iter, Connection};

use super::DatabaseError;
use crate::models::patch::Changes;

pub use agency::*;
pub use contact::*;
pub use employee::*;
pub use log::*;
pub use office::*;
pub use production::*;
pub use submission::*;
pub use task::*;

/// Apply collected PATCH assignments to one row.
///
/// Returns `false` when no row has that id. An empty change set only
/// checks existence.
pub(crate) fn apply_changes(
    conn: &Connection,
    table: &str,
    id: i64,
    changes: &Changes,
) -> Result<bool, DatabaseError> {
    if changes.is_empty() {
        return row_exists(conn, table, id);
    }

    let assignments: Vec<String> = changes
        .assignments
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("\"{column}\" = ?{}", i + 1))
        .collect();
    let sql = format!(
        "UPDATE {table} SET {} WHERE id = ?{}",
        assignments.join(", "),
        changes.assignments.len() + 1
    );

    let mut values: Vec<rusqlite::types::Value> =
        changes.assignments.iter().map(|(_, v)| v.clone()).collect();
    values.push(id.into());

    let updated = conn.execute(&sql, params_from_iter(values))?;
    Ok(updated > 0)
}

pub(crate) fn row_exists(conn: &Connection, table: &str, id: i64) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {table} WHERE id = ?1"),
        [id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Delete one row by id; `false` when nothing matched.
pub(crate) fn delete_row(conn: &Connection, table: &str, id: i64) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(&format!("DELETE FROM {table} WHERE id = ?1"), [id])?;
    Ok(deleted > 0)
}

/// Empty or whitespace-only text becomes NULL.
pub(crate) fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
