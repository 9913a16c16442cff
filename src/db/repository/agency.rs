use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{apply_changes, delete_row};
use crate::db::DatabaseError;
use crate::models::patch::Changes;
use crate::models::*;

/// Underwriter display name prefers the linked employee over stored text.
const AGENCY_SELECT: &str = "SELECT a.id, a.name, a.code, a.office_id, a.web_address, a.notes,
            a.primary_underwriter_id, COALESCE(e.name, a.primary_underwriter),
            a.active_flag, a.dba, a.email
     FROM agencies a
     LEFT JOIN employees e ON e.id = a.primary_underwriter_id";

fn agency_from_row(row: &Row<'_>) -> rusqlite::Result<Agency> {
    Ok(Agency {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        office_id: row.get(3)?,
        web_address: row.get(4)?,
        notes: row.get(5)?,
        primary_underwriter_id: row.get(6)?,
        primary_underwriter: row.get(7)?,
        active_flag: row.get(8)?,
        dba: row.get(9)?,
        email: row.get(10)?,
    })
}

fn query_agencies<P: rusqlite::Params>(
    conn: &Connection,
    tail: &str,
    params: P,
) -> Result<Vec<Agency>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{AGENCY_SELECT} {tail}"))?;
    let rows = stmt.query_map(params, agency_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// All agencies, or those belonging to the office with `office_code`.
pub fn list_agencies(
    conn: &Connection,
    office_code: Option<&str>,
) -> Result<Vec<Agency>, DatabaseError> {
    match office_code {
        Some(code) => query_agencies(
            conn,
            "JOIN offices o ON o.id = a.office_id WHERE o.code = ?1 ORDER BY a.name",
            [code],
        ),
        None => query_agencies(conn, "ORDER BY a.name", []),
    }
}

pub fn get_agency(conn: &Connection, id: i64) -> Result<Option<Agency>, DatabaseError> {
    Ok(query_agencies(conn, "WHERE a.id = ?1", [id])?.into_iter().next())
}

/// Case- and whitespace-insensitive code lookup.
pub fn find_agency_by_code(conn: &Connection, code: &str) -> Result<Option<Agency>, DatabaseError> {
    Ok(query_agencies(
        conn,
        "WHERE UPPER(TRIM(a.code)) = UPPER(TRIM(?1)) ORDER BY a.id LIMIT 1",
        [code],
    )?
    .into_iter()
    .next())
}

/// Agencies whose name or DBA contains `name`, or whose code equals `code`.
pub fn search_agencies(
    conn: &Connection,
    name: Option<&str>,
    code: Option<&str>,
    limit: usize,
) -> Result<Vec<Agency>, DatabaseError> {
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    let code = code.map(str::trim).filter(|c| !c.is_empty());
    if name.is_none() && code.is_none() {
        return Ok(Vec::new());
    }
    // LIKE is case-insensitive for ASCII in SQLite
    let pattern = name.map(|n| format!("%{}%", escape_like(n)));
    query_agencies(
        conn,
        "WHERE (?1 IS NOT NULL AND (a.name LIKE ?1 ESCAPE '\\' OR a.dba LIKE ?1 ESCAPE '\\'))
            OR (?2 IS NOT NULL AND a.code = ?2)
         ORDER BY a.id LIMIT ?3",
        params![pattern, code, limit as i64],
    )
}

pub(crate) fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn underwriter_name(
    conn: &Connection,
    employee_id: Option<i64>,
    fallback: Option<&str>,
) -> Result<Option<String>, DatabaseError> {
    if let Some(id) = employee_id {
        let name: Option<String> = conn
            .query_row("SELECT name FROM employees WHERE id = ?1", [id], |row| row.get(0))
            .optional()?;
        if name.is_some() {
            return Ok(name);
        }
    }
    Ok(fallback.map(str::to_string))
}

pub fn insert_agency(conn: &Connection, input: &AgencyInput) -> Result<Agency, DatabaseError> {
    insert_agency_with_id(conn, None, input)
}

/// Insert with an explicit id (backfill) or let SQLite assign one.
pub fn insert_agency_with_id(
    conn: &Connection,
    id: Option<i64>,
    input: &AgencyInput,
) -> Result<Agency, DatabaseError> {
    let display = underwriter_name(
        conn,
        input.primary_underwriter_id,
        input.primary_underwriter.as_deref(),
    )?;
    conn.execute(
        "INSERT INTO agencies (id, name, code, office_id, web_address, notes,
                               primary_underwriter_id, primary_underwriter, active_flag, dba, email)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            id,
            input.name.trim(),
            input.code.trim(),
            input.office_id,
            input.web_address,
            input.notes,
            input.primary_underwriter_id,
            display,
            input.active_flag,
            input.dba,
            input.email,
        ],
    )?;
    let new_id = conn.last_insert_rowid();
    get_agency(conn, new_id)?.ok_or_else(|| DatabaseError::not_found("agency", new_id))
}

/// Overwrite every field of an agency (PUT semantics).
pub fn replace_agency(
    conn: &Connection,
    id: i64,
    input: &AgencyInput,
) -> Result<Option<Agency>, DatabaseError> {
    let display = underwriter_name(
        conn,
        input.primary_underwriter_id,
        input.primary_underwriter.as_deref(),
    )?;
    let updated = conn.execute(
        "UPDATE agencies SET name = ?1, code = ?2, office_id = ?3, web_address = ?4, notes = ?5,
                primary_underwriter_id = ?6, primary_underwriter = ?7, active_flag = ?8,
                dba = ?9, email = ?10
         WHERE id = ?11",
        params![
            input.name.trim(),
            input.code.trim(),
            input.office_id,
            input.web_address,
            input.notes,
            input.primary_underwriter_id,
            display,
            input.active_flag,
            input.dba,
            input.email,
            id,
        ],
    )?;
    if updated == 0 {
        return Ok(None);
    }
    get_agency(conn, id)
}

/// Apply only the fields present in the patch.
///
/// Setting `primary_underwriter_id` re-resolves the display name from the
/// employee, falling back to any `primary_underwriter` sent alongside.
pub fn update_agency(
    conn: &Connection,
    id: i64,
    update: &AgencyUpdate,
) -> Result<Option<Agency>, DatabaseError> {
    let mut changes = Changes::new();
    changes.required_text("name", &update.name);
    changes.int("office_id", &update.office_id);
    changes.text("web_address", &update.web_address);
    changes.text("notes", &update.notes);
    changes.text("active_flag", &update.active_flag);
    changes.text("dba", &update.dba);
    changes.text("email", &update.email);

    match &update.primary_underwriter_id {
        Some(employee_id) => {
            let fallback = update.primary_underwriter.clone().flatten();
            let display = underwriter_name(conn, *employee_id, fallback.as_deref())?;
            changes.set("primary_underwriter_id", *employee_id);
            changes.set("primary_underwriter", display);
        }
        None => changes.text("primary_underwriter", &update.primary_underwriter),
    }

    if !apply_changes(conn, "agencies", id, &changes)? {
        return Ok(None);
    }
    get_agency(conn, id)
}

pub fn set_agency_active_flag(conn: &Connection, id: i64, flag: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "UPDATE agencies SET active_flag = ?1 WHERE id = ?2",
        params![flag, id],
    )?;
    Ok(())
}

/// Plain delete: contacts cascade, logs/tasks/submissions are unlinked.
pub fn delete_agency(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    delete_row(conn, "agencies", id)
}

/// Remove an agency together with its contacts, logs and tasks.
pub fn delete_agency_cascade(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    if !super::row_exists(&tx, "agencies", id)? {
        return Ok(false);
    }
    let contacts = tx.execute("DELETE FROM contacts WHERE agency_id = ?1", [id])?;
    let logs = tx.execute("DELETE FROM logs WHERE agency_id = ?1", [id])?;
    let tasks = tx.execute("DELETE FROM tasks WHERE agency_id = ?1", [id])?;
    tx.execute("DELETE FROM agencies WHERE id = ?1", [id])?;
    tx.commit()?;
    tracing::info!(agency_id = id, contacts, logs, tasks, "Agency removed with dependents");
    Ok(true)
}
