use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::DatabaseError;
use crate::models::*;

fn office_from_row(row: &Row<'_>) -> rusqlite::Result<Office> {
    Ok(Office {
        id: row.get(0)?,
        code: row.get(1)?,
        name: row.get(2)?,
    })
}

pub fn list_offices(conn: &Connection) -> Result<Vec<Office>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, code, name FROM offices ORDER BY code")?;
    let rows = stmt.query_map([], office_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn get_office_by_code(conn: &Connection, code: &str) -> Result<Option<Office>, DatabaseError> {
    Ok(conn
        .query_row(
            "SELECT id, code, name FROM offices WHERE code = ?1",
            [code],
            office_from_row,
        )
        .optional()?)
}

/// Insert an office; codes are stored trimmed.
pub fn insert_office(conn: &Connection, office: &NewOffice) -> Result<Office, DatabaseError> {
    let code = office.code.trim();
    let name = office.name.trim();
    conn.execute(
        "INSERT INTO offices (code, name) VALUES (?1, ?2)",
        params![code, name],
    )?;
    Ok(Office {
        id: conn.last_insert_rowid(),
        code: code.to_string(),
        name: name.to_string(),
    })
}

/// Insert or rename by code. Returns the office id.
pub fn upsert_office(conn: &Connection, code: &str, name: &str) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO offices (code, name) VALUES (?1, ?2)
         ON CONFLICT(code) DO UPDATE SET name = excluded.name",
        params![code, name],
    )?;
    let id = conn.query_row("SELECT id FROM offices WHERE code = ?1", [code], |row| {
        row.get(0)
    })?;
    Ok(id)
}
