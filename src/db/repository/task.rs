use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{apply_changes, delete_row};
use crate::db::DatabaseError;
use crate::models::datetime::{from_storage, to_storage};
use crate::models::patch::Changes;
use crate::models::*;

const TASK_COLUMNS: &str = "id, title, due_date, status, owner, notes, agency_id";

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        due_date: from_storage(row.get(2)?),
        status: row.get(3)?,
        owner: row.get(4)?,
        notes: row.get(5)?,
        agency_id: row.get(6)?,
    })
}

pub fn list_tasks(conn: &Connection, agency_id: Option<i64>) -> Result<Vec<Task>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks
         WHERE ?1 IS NULL OR agency_id = ?1 ORDER BY due_date IS NULL, due_date, id"
    ))?;
    let rows = stmt.query_map([agency_id], task_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn get_task(conn: &Connection, id: i64) -> Result<Option<Task>, DatabaseError> {
    Ok(conn
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
            [id],
            task_from_row,
        )
        .optional()?)
}

pub fn insert_task(conn: &Connection, task: &NewTask) -> Result<Task, DatabaseError> {
    conn.execute(
        "INSERT INTO tasks (title, due_date, status, owner, notes, agency_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            task.title.trim(),
            task.due_date.as_ref().map(to_storage),
            task.status,
            task.owner,
            task.notes,
            task.agency_id,
        ],
    )?;
    let id = conn.last_insert_rowid();
    get_task(conn, id)?.ok_or_else(|| DatabaseError::not_found("task", id))
}

/// Insert or overwrite the task with a caller-chosen id.
pub fn upsert_task_with_id(conn: &Connection, id: i64, task: &NewTask) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO tasks (id, title, due_date, status, owner, notes, agency_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
            title = excluded.title, due_date = excluded.due_date, status = excluded.status,
            owner = excluded.owner, notes = excluded.notes, agency_id = excluded.agency_id",
        params![
            id,
            task.title,
            task.due_date.as_ref().map(to_storage),
            task.status,
            task.owner,
            task.notes,
            task.agency_id,
        ],
    )?;
    Ok(())
}

pub fn update_task(
    conn: &Connection,
    id: i64,
    update: &TaskUpdate,
) -> Result<Option<Task>, DatabaseError> {
    let mut changes = Changes::new();
    changes.required_text("title", &update.title);
    changes.datetime("due_date", &update.due_date);
    changes.text("status", &update.status);
    changes.text("owner", &update.owner);
    changes.text("notes", &update.notes);
    changes.int("agency_id", &update.agency_id);

    if !apply_changes(conn, "tasks", id, &changes)? {
        return Ok(None);
    }
    get_task(conn, id)
}

pub fn delete_task(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    delete_row(conn, "tasks", id)
}
