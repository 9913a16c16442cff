use chrono::{NaiveDateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};

use super::{apply_changes, delete_row};
use crate::db::DatabaseError;
use crate::models::datetime::{from_storage, to_storage};
use crate::models::patch::Changes;
use crate::models::*;

/// Leading metadata columns; the extraction fields follow in
/// `SubmissionFields::NAMES` order, then the review columns.
const HEAD_COLUMNS: &[&str] = &[
    "id",
    "created_at",
    "updated_at",
    "original_filename",
    "file_type",
    "extracted_text",
];
const TAIL_COLUMNS: &[&str] = &["agency_id", "contact_id", "status", "reviewed_by"];

fn select_columns() -> String {
    HEAD_COLUMNS
        .iter()
        .chain(SubmissionFields::NAMES)
        .chain(TAIL_COLUMNS)
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

fn submission_from_row(row: &Row<'_>) -> rusqlite::Result<Submission> {
    let created_raw: String = row.get(1)?;
    let created_at = from_storage(Some(created_raw.clone())).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("unparseable created_at: {created_raw}").into(),
        )
    })?;

    let mut fields = SubmissionFields::default();
    let offset = HEAD_COLUMNS.len();
    for (i, name) in SubmissionFields::NAMES.iter().enumerate() {
        fields.set(name, row.get(offset + i)?);
    }
    let tail = offset + SubmissionFields::NAMES.len();
    let status: Option<String> = row.get(tail + 2)?;

    Ok(Submission {
        id: row.get(0)?,
        created_at,
        updated_at: from_storage(row.get(2)?),
        original_filename: row.get(3)?,
        file_type: row.get(4)?,
        extracted_text: row.get(5)?,
        fields,
        agency_id: row.get(tail)?,
        contact_id: row.get(tail + 1)?,
        status: status.unwrap_or_else(|| DEFAULT_SUBMISSION_STATUS.to_string()),
        reviewed_by: row.get(tail + 3)?,
    })
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

/// Store a reviewed submission; `created_at` is set to now (UTC).
pub fn insert_submission(
    conn: &Connection,
    submission: &NewSubmission,
) -> Result<Submission, DatabaseError> {
    let mut columns: Vec<&str> = vec![
        "created_at",
        "original_filename",
        "file_type",
        "extracted_text",
    ];
    let mut values: Vec<Value> = vec![
        to_storage(&now()).into(),
        submission.original_filename.clone().into(),
        submission.file_type.clone().into(),
        submission.extracted_text.clone().into(),
    ];
    for (name, value) in SubmissionFields::NAMES
        .iter()
        .zip(submission.fields.values())
    {
        columns.push(*name);
        values.push(value.map(str::to_string).into());
    }
    let status = submission
        .status
        .clone()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SUBMISSION_STATUS.to_string());
    columns.extend(["agency_id", "contact_id", "status"]);
    values.push(submission.agency_id.into());
    values.push(submission.contact_id.into());
    values.push(status.into());

    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    conn.execute(
        &format!(
            "INSERT INTO submissions ({}) VALUES ({})",
            columns.join(", "),
            placeholders.join(", ")
        ),
        params_from_iter(values),
    )?;
    let id = conn.last_insert_rowid();
    get_submission(conn, id)?.ok_or_else(|| DatabaseError::not_found("submission", id))
}

/// Newest first, with paging and an optional status filter.
pub fn list_submissions(
    conn: &Connection,
    skip: i64,
    limit: i64,
    status: Option<&str>,
) -> Result<Vec<Submission>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM submissions
         WHERE ?1 IS NULL OR status = ?1
         ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
        select_columns()
    ))?;
    let rows = stmt.query_map(
        rusqlite::params![status, limit.max(0), skip.max(0)],
        submission_from_row,
    )?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn get_submission(conn: &Connection, id: i64) -> Result<Option<Submission>, DatabaseError> {
    Ok(conn
        .query_row(
            &format!("SELECT {} FROM submissions WHERE id = ?1", select_columns()),
            [id],
            submission_from_row,
        )
        .optional()?)
}

/// Apply the fields present in the update and stamp `updated_at`.
pub fn update_submission(
    conn: &Connection,
    id: i64,
    update: &SubmissionUpdate,
) -> Result<Option<Submission>, DatabaseError> {
    let mut changes = Changes::new();
    update.fields.collect(&mut changes);
    changes.int("agency_id", &update.agency_id);
    changes.int("contact_id", &update.contact_id);
    changes.required_text("status", &update.status);
    changes.text("reviewed_by", &update.reviewed_by);
    changes.set("updated_at", to_storage(&now()));

    if !apply_changes(conn, "submissions", id, &changes)? {
        return Ok(None);
    }
    get_submission(conn, id)
}

pub fn delete_submission(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    delete_row(conn, "submissions", id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;

    fn new_submission(insured: &str) -> NewSubmission {
        let mut new = NewSubmission::default();
        new.fields.insured_name = Some(insured.into());
        new.fields.location_city = Some("San Diego".into());
        new
    }

    #[test]
    fn insert_defaults_status_and_timestamp() {
        let conn = open_memory_database().unwrap();
        let created = insert_submission(&conn, &new_submission("Blue Fin LLC")).unwrap();
        assert_eq!(created.status, "pending");
        assert!(created.updated_at.is_none());
        assert_eq!(created.fields.insured_name.as_deref(), Some("Blue Fin LLC"));
        assert_eq!(created.fields.location_city.as_deref(), Some("San Diego"));
        assert!(created.fields.mortgagee.is_none());
    }

    #[test]
    fn list_pages_and_filters() {
        let conn = open_memory_database().unwrap();
        for name in ["A", "B", "C"] {
            insert_submission(&conn, &new_submission(name)).unwrap();
        }
        let mut reviewed = new_submission("D");
        reviewed.status = Some("reviewed".into());
        insert_submission(&conn, &reviewed).unwrap();

        let all = list_submissions(&conn, 0, 100, None).unwrap();
        assert_eq!(all.len(), 4);
        // Same-second inserts fall back to id order, newest first
        assert_eq!(all[0].fields.insured_name.as_deref(), Some("D"));

        assert_eq!(list_submissions(&conn, 1, 2, None).unwrap().len(), 2);
        assert_eq!(list_submissions(&conn, 0, 100, Some("pending")).unwrap().len(), 3);
    }

    #[test]
    fn update_sets_fields_and_updated_at() {
        let conn = open_memory_database().unwrap();
        let created = insert_submission(&conn, &new_submission("Blue Fin")).unwrap();
        let update: SubmissionUpdate = serde_json::from_str(
            r#"{"location_city":null,"deductible":"5,000","status":"reviewed","reviewed_by":"Avery"}"#,
        )
        .unwrap();
        let updated = update_submission(&conn, created.id, &update).unwrap().unwrap();
        assert!(updated.updated_at.is_some());
        assert_eq!(updated.fields.location_city, None);
        assert_eq!(updated.fields.deductible.as_deref(), Some("5,000"));
        assert_eq!(updated.fields.insured_name.as_deref(), Some("Blue Fin"));
        assert_eq!(updated.status, "reviewed");
        assert_eq!(updated.reviewed_by.as_deref(), Some("Avery"));
    }

    #[test]
    fn update_missing_is_none() {
        let conn = open_memory_database().unwrap();
        let result = update_submission(&conn, 9, &SubmissionUpdate::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn delete_reports_presence() {
        let conn = open_memory_database().unwrap();
        let created = insert_submission(&conn, &new_submission("X")).unwrap();
        assert!(delete_submission(&conn, created.id).unwrap());
        assert!(!delete_submission(&conn, created.id).unwrap());
    }
}
