use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{apply_changes, delete_row};
use crate::db::DatabaseError;
use crate::models::datetime::{from_storage, to_storage};
use crate::models::patch::Changes;
use crate::models::*;

const LOG_COLUMNS: &str =
    "id, \"user\", datetime, action, agency_id, office, notes, contact_id, contact";

fn log_from_row(row: &Row<'_>) -> rusqlite::Result<MarketingLog> {
    let raw: String = row.get(2)?;
    let datetime = from_storage(Some(raw.clone())).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unparseable log datetime: {raw}").into(),
        )
    })?;
    Ok(MarketingLog {
        id: row.get(0)?,
        user: row.get(1)?,
        datetime,
        action: row.get(3)?,
        agency_id: row.get(4)?,
        office: row.get(5)?,
        notes: row.get(6)?,
        contact_id: row.get(7)?,
        contact: row.get(8)?,
    })
}

/// Logs newest first, optionally for one agency.
pub fn list_logs(
    conn: &Connection,
    agency_id: Option<i64>,
) -> Result<Vec<MarketingLog>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LOG_COLUMNS} FROM logs
         WHERE ?1 IS NULL OR agency_id = ?1 ORDER BY datetime DESC, id DESC"
    ))?;
    let rows = stmt.query_map([agency_id], log_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn get_log(conn: &Connection, id: i64) -> Result<Option<MarketingLog>, DatabaseError> {
    Ok(conn
        .query_row(
            &format!("SELECT {LOG_COLUMNS} FROM logs WHERE id = ?1"),
            [id],
            log_from_row,
        )
        .optional()?)
}

pub fn insert_log(conn: &Connection, log: &NewMarketingLog) -> Result<MarketingLog, DatabaseError> {
    conn.execute(
        "INSERT INTO logs (\"user\", datetime, action, agency_id, office, notes, contact_id, contact)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            log.user.trim(),
            to_storage(&log.datetime),
            log.action.trim(),
            log.agency_id,
            log.office,
            log.notes,
            log.contact_id,
            log.contact,
        ],
    )?;
    let id = conn.last_insert_rowid();
    get_log(conn, id)?.ok_or_else(|| DatabaseError::not_found("log", id))
}

/// Insert or overwrite the log with a caller-chosen id.
pub fn upsert_log_with_id(
    conn: &Connection,
    id: i64,
    log: &NewMarketingLog,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO logs (id, \"user\", datetime, action, agency_id, office, notes, contact_id, contact)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(id) DO UPDATE SET
            \"user\" = excluded.\"user\", datetime = excluded.datetime, action = excluded.action,
            agency_id = excluded.agency_id, office = excluded.office, notes = excluded.notes,
            contact_id = excluded.contact_id, contact = excluded.contact",
        params![
            id,
            log.user,
            to_storage(&log.datetime),
            log.action,
            log.agency_id,
            log.office,
            log.notes,
            log.contact_id,
            log.contact,
        ],
    )?;
    Ok(())
}

pub fn update_log(
    conn: &Connection,
    id: i64,
    update: &MarketingLogUpdate,
) -> Result<Option<MarketingLog>, DatabaseError> {
    let mut changes = Changes::new();
    changes.required_text("user", &update.user);
    changes.required_datetime("datetime", &update.datetime);
    changes.required_text("action", &update.action);
    changes.int("agency_id", &update.agency_id);
    changes.text("office", &update.office);
    changes.text("notes", &update.notes);
    changes.int("contact_id", &update.contact_id);
    changes.text("contact", &update.contact);

    if !apply_changes(conn, "logs", id, &changes)? {
        return Ok(None);
    }
    get_log(conn, id)
}

pub fn delete_log(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    delete_row(conn, "logs", id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::insert_agency;
    use crate::db::sqlite::open_memory_database;
    use crate::models::datetime::parse_flexible;

    fn entry(user: &str, at: &str, agency_id: Option<i64>) -> NewMarketingLog {
        NewMarketingLog {
            user: user.into(),
            datetime: parse_flexible(at).unwrap(),
            action: "Call".into(),
            agency_id,
            office: Some("SDO".into()),
            notes: None,
            contact_id: None,
            contact: None,
        }
    }

    #[test]
    fn listed_newest_first() {
        let conn = open_memory_database().unwrap();
        insert_log(&conn, &entry("Dana", "2025-01-05T09:00", None)).unwrap();
        insert_log(&conn, &entry("Dana", "2025-03-01T09:00", None)).unwrap();
        insert_log(&conn, &entry("Dana", "2025-02-01T09:00", None)).unwrap();

        let logs = list_logs(&conn, None).unwrap();
        let months: Vec<u32> = logs
            .iter()
            .map(|l| chrono::Datelike::month(&l.datetime))
            .collect();
        assert_eq!(months, vec![3, 2, 1]);
    }

    #[test]
    fn filter_by_agency() {
        let conn = open_memory_database().unwrap();
        let agency = insert_agency(&conn, &AgencyInput::new("Harbor", "H1")).unwrap();
        insert_log(&conn, &entry("Dana", "2025-01-05", Some(agency.id))).unwrap();
        insert_log(&conn, &entry("Dana", "2025-01-06", None)).unwrap();
        assert_eq!(list_logs(&conn, Some(agency.id)).unwrap().len(), 1);
    }

    #[test]
    fn patch_keeps_datetime_on_null() {
        let conn = open_memory_database().unwrap();
        let created = insert_log(&conn, &entry("Dana", "2025-01-05T09:00", None)).unwrap();
        let update: MarketingLogUpdate =
            serde_json::from_str(r#"{"datetime":null,"notes":"left voicemail"}"#).unwrap();
        let updated = update_log(&conn, created.id, &update).unwrap().unwrap();
        assert_eq!(updated.datetime, created.datetime);
        assert_eq!(updated.notes.as_deref(), Some("left voicemail"));
    }

    #[test]
    fn upsert_with_id_overwrites() {
        let conn = open_memory_database().unwrap();
        upsert_log_with_id(&conn, 10, &entry("Dana", "2025-01-05", None)).unwrap();
        upsert_log_with_id(&conn, 10, &entry("Robin", "2025-01-06", None)).unwrap();
        let log = get_log(&conn, 10).unwrap().unwrap();
        assert_eq!(log.user, "Robin");
        assert_eq!(list_logs(&conn, None).unwrap().len(), 1);
    }

    #[test]
    fn delete_missing_is_false() {
        let conn = open_memory_database().unwrap();
        assert!(!delete_log(&conn, 1).unwrap());
    }
}
