use rusqlite::{params, Connection, OptionalExtension, Row};

use super::agency::escape_like;
use super::{apply_changes, delete_row};
use crate::db::DatabaseError;
use crate::models::patch::Changes;
use crate::models::*;

const CONTACT_COLUMNS: &str = "id, name, title, email, phone, agency_id, notes, linkedin_url";

fn contact_from_row(row: &Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get(0)?,
        name: row.get(1)?,
        title: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        agency_id: row.get(5)?,
        notes: row.get(6)?,
        linkedin_url: row.get(7)?,
    })
}

pub fn list_contacts(
    conn: &Connection,
    agency_id: Option<i64>,
) -> Result<Vec<Contact>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts
         WHERE ?1 IS NULL OR agency_id = ?1 ORDER BY name, id"
    ))?;
    let rows = stmt.query_map([agency_id], contact_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn get_contact(conn: &Connection, id: i64) -> Result<Option<Contact>, DatabaseError> {
    Ok(conn
        .query_row(
            &format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = ?1"),
            [id],
            contact_from_row,
        )
        .optional()?)
}

pub fn insert_contact(conn: &Connection, contact: &NewContact) -> Result<Contact, DatabaseError> {
    insert_contact_with_id(conn, None, contact)
}

pub fn insert_contact_with_id(
    conn: &Connection,
    id: Option<i64>,
    contact: &NewContact,
) -> Result<Contact, DatabaseError> {
    conn.execute(
        "INSERT INTO contacts (id, name, title, email, phone, agency_id, notes, linkedin_url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id,
            contact.name.trim(),
            contact.title,
            contact.email,
            contact.phone,
            contact.agency_id,
            contact.notes,
            contact.linkedin_url,
        ],
    )?;
    let new_id = conn.last_insert_rowid();
    get_contact(conn, new_id)?.ok_or_else(|| DatabaseError::not_found("contact", new_id))
}

pub fn update_contact(
    conn: &Connection,
    id: i64,
    update: &ContactUpdate,
) -> Result<Option<Contact>, DatabaseError> {
    let mut changes = Changes::new();
    changes.required_text("name", &update.name);
    changes.text("title", &update.title);
    changes.text("email", &update.email);
    changes.text("phone", &update.phone);
    if let Some(agency_id) = update.agency_id {
        changes.set("agency_id", agency_id);
    }
    changes.text("notes", &update.notes);
    changes.text("linkedin_url", &update.linkedin_url);

    if !apply_changes(conn, "contacts", id, &changes)? {
        return Ok(None);
    }
    get_contact(conn, id)
}

pub fn delete_contact(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    delete_row(conn, "contacts", id)
}

/// Contacts of one agency filtered by partial name and email.
///
/// Both filters apply when both are given; with neither, the agency's
/// contacts are returned up to `limit`.
pub fn search_contacts(
    conn: &Connection,
    agency_id: i64,
    name: Option<&str>,
    email: Option<&str>,
    limit: usize,
) -> Result<Vec<Contact>, DatabaseError> {
    let like = |value: Option<&str>| {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| format!("%{}%", escape_like(v)))
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts
         WHERE agency_id = ?1
           AND (?2 IS NULL OR name LIKE ?2 ESCAPE '\\')
           AND (?3 IS NULL OR email LIKE ?3 ESCAPE '\\')
         ORDER BY id LIMIT ?4"
    ))?;
    let rows = stmt.query_map(
        params![agency_id, like(name), like(email), limit as i64],
        contact_from_row,
    )?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Contacts of an agency whose name matches exactly, ignoring case.
pub fn find_contacts_by_name(
    conn: &Connection,
    agency_id: i64,
    name: &str,
) -> Result<Vec<Contact>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CONTACT_COLUMNS} FROM contacts
         WHERE agency_id = ?1 AND LOWER(TRIM(name)) = LOWER(TRIM(?2)) ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![agency_id, name], contact_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Natural-key lookup used when a CSV row carries no contact id.
pub fn find_contact(
    conn: &Connection,
    agency_id: i64,
    name: &str,
    email: Option<&str>,
) -> Result<Option<Contact>, DatabaseError> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {CONTACT_COLUMNS} FROM contacts
                 WHERE agency_id = ?1 AND name = ?2 AND email IS ?3 ORDER BY id LIMIT 1"
            ),
            params![agency_id, name, email],
            contact_from_row,
        )
        .optional()?)
}

/// Overwrite every column of an existing contact.
pub fn replace_contact(
    conn: &Connection,
    id: i64,
    contact: &NewContact,
) -> Result<bool, DatabaseError> {
    let updated = conn.execute(
        "UPDATE contacts SET name = ?1, title = ?2, email = ?3, phone = ?4, agency_id = ?5,
                notes = ?6, linkedin_url = ?7
         WHERE id = ?8",
        params![
            contact.name.trim(),
            contact.title,
            contact.email,
            contact.phone,
            contact.agency_id,
            contact.notes,
            contact.linkedin_url,
            id,
        ],
    )?;
    Ok(updated > 0)
}
