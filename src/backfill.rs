//! One-shot loader for the legacy `crm_*.csv` exports.
//!
//! Every file is optional. Rows are upserted so the loader can be re-run
//! against a database that already holds part of the data.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;

use crate::db::repository::{
    find_agency_by_code, find_contact, find_contacts_by_name, find_employee, get_agency,
    get_contact, get_employee, get_office_by_code, insert_agency, insert_agency_with_id,
    insert_contact, insert_contact_with_id, insert_employee, insert_log, insert_office,
    insert_task, replace_agency, replace_contact, row_exists, upsert_employee_with_id,
    upsert_log_with_id, upsert_office, upsert_production, upsert_task_with_id,
};
use crate::db::DatabaseError;
use crate::models::datetime::parse_flexible;
use crate::models::{
    AgencyInput, NewContact, NewEmployee, NewMarketingLog, NewOffice, NewTask, ProductionRecord,
};

pub const OFFICES_FILE: &str = "crm_offices.csv";
pub const EMPLOYEES_FILE: &str = "crm_employees.csv";
pub const AGENCIES_FILE: &str = "crm_agencies.csv";
pub const CONTACTS_FILE: &str = "crm_contacts.csv";
pub const LOGS_FILE: &str = "crm_logs.csv";
pub const TASKS_FILE: &str = "crm_tasks.csv";
pub const PRODUCTION_FILE: &str = "crm_production.csv";

/// Display names for the office codes used in the exports.
pub const OFFICE_LABELS: &[(&str, &str)] = &[
    ("BRA", "Orange County"),
    ("FNO", "Fresno"),
    ("LAF", "Walnut Creek"),
    ("LKO", "Portland"),
    ("MID", "Mid West"),
    ("PAS", "Pasadena"),
    ("PHX", "Phoenix"),
    ("RCH", "Roseville"),
    ("REN", "Reno"),
    ("SDO", "San Diego"),
    ("SEA", "Seattle"),
    ("LVS", "Las Vegas"),
    ("MHL", "Woodland Hills"),
];

pub fn office_label(code: &str) -> &str {
    OFFICE_LABELS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or(code)
}

#[derive(Error, Debug)]
pub enum BackfillError {
    #[error("Could not find {AGENCIES_FILE}; pass --data-dir")]
    DataDirNotFound,

    #[error("CSV error in {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for BackfillError {
    fn from(err: rusqlite::Error) -> Self {
        BackfillError::Database(err.into())
    }
}

/// Rows written per table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillCounts {
    pub offices: usize,
    pub employees: usize,
    pub agencies: usize,
    pub contacts: usize,
    pub logs: usize,
    pub tasks: usize,
    pub production: usize,
}

/// First of `start` and its ancestors that holds the agencies export.
pub fn find_data_dir(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(AGENCIES_FILE).is_file())
        .map(Path::to_path_buf)
}

/// One CSV record keyed by header name.
struct CsvRow(HashMap<String, String>);

impl CsvRow {
    fn text(&self, column: &str) -> &str {
        self.0.get(column).map(|v| v.trim()).unwrap_or("")
    }

    fn opt(&self, column: &str) -> Option<String> {
        Some(self.text(column))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn int(&self, column: &str) -> Option<i64> {
        parse_int(self.text(column))
    }
}

/// Integers arrive as `12`, `12.0` or blank.
pub fn parse_int(raw: &str) -> Option<i64> {
    let value: f64 = raw.trim().parse().ok()?;
    value.is_finite().then(|| value.trunc() as i64)
}

fn read_rows(dir: &Path, file: &str) -> Result<Option<Vec<CsvRow>>, BackfillError> {
    let path = dir.join(file);
    if !path.is_file() {
        tracing::debug!(file, "CSV not present, skipping");
        return Ok(None);
    }
    let csv_err = |source| BackfillError::Csv {
        file: file.to_string(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(&path)
        .map_err(csv_err)?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let values = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push(CsvRow(values));
    }
    Ok(Some(rows))
}

/// Office ids by code, created on first reference.
struct OfficeMap(HashMap<String, i64>);

impl OfficeMap {
    fn resolve(&mut self, conn: &Connection, code: &str) -> Result<Option<i64>, DatabaseError> {
        if code.is_empty() {
            return Ok(None);
        }
        if let Some(id) = self.0.get(code) {
            return Ok(Some(*id));
        }
        let id = match get_office_by_code(conn, code)? {
            Some(office) => office.id,
            None => {
                tracing::info!(code, "Creating office referenced by CSV");
                insert_office(
                    conn,
                    &NewOffice {
                        code: code.to_string(),
                        name: office_label(code).to_string(),
                    },
                )?
                .id
            }
        };
        self.0.insert(code.to_string(), id);
        Ok(Some(id))
    }
}

fn load_offices(conn: &Connection, rows: &[CsvRow], offices: &mut OfficeMap) -> Result<(), DatabaseError> {
    for row in rows {
        let code = row.text("OfficeName");
        if code.is_empty() {
            continue;
        }
        let id = upsert_office(conn, code, office_label(code))?;
        offices.0.insert(code.to_string(), id);
    }
    Ok(())
}

fn load_employees(
    conn: &Connection,
    rows: &[CsvRow],
    offices: &mut OfficeMap,
) -> Result<usize, DatabaseError> {
    let mut written = 0;
    for row in rows {
        let name = row.text("Name");
        if name.is_empty() {
            continue;
        }
        let office_id = offices.resolve(conn, row.text("Office"))?;
        let csv_id = row.int("EmployeeID");

        let known_id = match csv_id {
            Some(id) if get_employee(conn, id)?.is_some() => Some(id),
            _ => find_employee(conn, name, office_id)?.map(|e| e.id),
        };
        match (known_id, csv_id) {
            (Some(id), _) | (None, Some(id)) => upsert_employee_with_id(conn, id, name, office_id)?,
            (None, None) => {
                insert_employee(
                    conn,
                    &NewEmployee {
                        name: name.to_string(),
                        office_id,
                    },
                )?;
            }
        }
        written += 1;
    }
    Ok(written)
}

/// Returns rows written and the CSV agency id -> database id map.
fn load_agencies(
    conn: &Connection,
    rows: &[CsvRow],
    offices: &mut OfficeMap,
) -> Result<(usize, HashMap<i64, i64>), DatabaseError> {
    let mut id_map = HashMap::new();
    let mut written = 0;
    for row in rows {
        let code = row.text("AgencyCode");
        if code.is_empty() {
            continue;
        }
        let csv_id = row.int("AgencyID");
        let mut input = AgencyInput::new(row.text("AgencyName"), code);
        input.office_id = offices.resolve(conn, row.text("Office"))?;
        input.web_address = row.opt("WebAddress");
        input.notes = row.opt("Notes");
        input.primary_underwriter = row.opt("PrimaryUnderwriter");
        input.active_flag = row.opt("ActiveFlag");

        let db_id = match find_agency_by_code(conn, code)? {
            Some(existing) => {
                input.primary_underwriter_id = existing.primary_underwriter_id;
                input.dba = existing.dba;
                input.email = existing.email;
                replace_agency(conn, existing.id, &input)?;
                existing.id
            }
            None => {
                let free_id = match csv_id {
                    Some(id) if get_agency(conn, id)?.is_none() => Some(id),
                    _ => None,
                };
                match free_id {
                    Some(id) => insert_agency_with_id(conn, Some(id), &input)?.id,
                    None => insert_agency(conn, &input)?.id,
                }
            }
        };
        if let Some(id) = csv_id {
            id_map.insert(id, db_id);
        }
        written += 1;
    }
    Ok((written, id_map))
}

/// Map a CSV agency id to a database id that exists.
fn resolve_agency(
    conn: &Connection,
    id_map: &HashMap<i64, i64>,
    csv_id: Option<i64>,
) -> Result<Option<i64>, DatabaseError> {
    let Some(raw) = csv_id else {
        return Ok(None);
    };
    let id = id_map.get(&raw).copied().unwrap_or(raw);
    if row_exists(conn, "agencies", id)? {
        Ok(Some(id))
    } else {
        tracing::warn!(agency_id = raw, "CSV references unknown agency");
        Ok(None)
    }
}

fn load_contacts(
    conn: &Connection,
    rows: &[CsvRow],
    id_map: &HashMap<i64, i64>,
) -> Result<usize, DatabaseError> {
    let mut written = 0;
    for row in rows {
        let Some(agency_id) = resolve_agency(conn, id_map, row.int("AgencyID"))? else {
            continue;
        };
        let name = row.text("Name");
        if name.is_empty() {
            continue;
        }
        let mut contact = NewContact {
            name: name.to_string(),
            title: row.opt("Role"),
            email: row.opt("Email"),
            phone: row.opt("Phone"),
            agency_id,
            notes: None,
            linkedin_url: None,
        };

        let csv_id = row.int("ContactID");
        let existing = match csv_id {
            Some(id) => get_contact(conn, id)?,
            None => None,
        };
        let existing = match existing {
            Some(c) => Some(c),
            None => find_contact(conn, agency_id, name, contact.email.as_deref())?,
        };
        match existing {
            Some(found) => {
                contact.notes = found.notes;
                contact.linkedin_url = found.linkedin_url;
                replace_contact(conn, found.id, &contact)?;
            }
            None => match csv_id {
                Some(id) => {
                    insert_contact_with_id(conn, Some(id), &contact)?;
                }
                None => {
                    insert_contact(conn, &contact)?;
                }
            },
        }
        written += 1;
    }
    Ok(written)
}

fn datetime_or_now(raw: &str) -> NaiveDateTime {
    parse_flexible(raw).unwrap_or_else(|| Local::now().naive_local())
}

fn load_logs(
    conn: &Connection,
    rows: &[CsvRow],
    id_map: &HashMap<i64, i64>,
) -> Result<usize, DatabaseError> {
    let mut written = 0;
    for row in rows {
        let agency_id = resolve_agency(conn, id_map, row.int("AgencyID"))?;
        let contact = row.opt("ContactName");

        // Link the contact only when the name is unambiguous
        let contact_id = match (agency_id, contact.as_deref()) {
            (Some(agency), Some(name)) => {
                let matches = find_contacts_by_name(conn, agency, name)?;
                match matches.as_slice() {
                    [only] => Some(only.id),
                    _ => None,
                }
            }
            _ => None,
        };

        let log = NewMarketingLog {
            user: row.text("EmployeeName").to_string(),
            datetime: datetime_or_now(row.text("Date")),
            action: row.text("Type").to_string(),
            agency_id,
            office: row.opt("Office"),
            notes: row.opt("Notes"),
            contact_id,
            contact,
        };
        match row.int("LogID") {
            Some(id) => upsert_log_with_id(conn, id, &log)?,
            None => {
                insert_log(conn, &log)?;
            }
        }
        written += 1;
    }
    Ok(written)
}

fn load_tasks(
    conn: &Connection,
    rows: &[CsvRow],
    id_map: &HashMap<i64, i64>,
) -> Result<usize, DatabaseError> {
    let mut written = 0;
    for row in rows {
        let task = NewTask {
            title: row.text("Title").to_string(),
            due_date: parse_flexible(row.text("DueDate")),
            status: row.opt("Status"),
            owner: row.opt("Owner"),
            notes: row.opt("Notes"),
            agency_id: resolve_agency(conn, id_map, row.int("AgencyID"))?,
        };
        match row.int("TaskID") {
            Some(id) => upsert_task_with_id(conn, id, &task)?,
            None => {
                insert_task(conn, &task)?;
            }
        }
        written += 1;
    }
    Ok(written)
}

fn load_production(conn: &Connection, rows: &[CsvRow]) -> Result<usize, DatabaseError> {
    let mut written = 0;
    for row in rows {
        let record = ProductionRecord {
            office: row.text("Office").to_string(),
            agency_code: row.text("AgencyCode").to_string(),
            agency_name: row.text("AgencyName").to_string(),
            active_flag: row.opt("ActiveFlag"),
            month: row.text("Month").to_string(),
            all_ytd_wp: row.int("AllYTDWP"),
            all_ytd_nb: row.int("AllYTDNB"),
            pytd_wp: row.int("PYTDWP"),
            pytd_nb: row.int("PYTDNB"),
            py_total_nb: row.int("PYTotalNB"),
            ..Default::default()
        };
        if record.agency_code.is_empty() || record.month.is_empty() {
            tracing::warn!(agency_code = %record.agency_code, "Skipping production row without code or month");
            continue;
        }
        upsert_production(conn, &record)?;
        written += 1;
    }
    Ok(written)
}

/// Load every export found in `dir` inside a single transaction.
pub fn run_backfill(conn: &Connection, dir: &Path) -> Result<BackfillCounts, BackfillError> {
    let offices_csv = read_rows(dir, OFFICES_FILE)?.unwrap_or_default();
    let employees_csv = read_rows(dir, EMPLOYEES_FILE)?.unwrap_or_default();
    let agencies_csv = read_rows(dir, AGENCIES_FILE)?.unwrap_or_default();
    let contacts_csv = read_rows(dir, CONTACTS_FILE)?.unwrap_or_default();
    let logs_csv = read_rows(dir, LOGS_FILE)?.unwrap_or_default();
    let tasks_csv = read_rows(dir, TASKS_FILE)?.unwrap_or_default();
    let production_csv = read_rows(dir, PRODUCTION_FILE)?.unwrap_or_default();

    let tx = conn.unchecked_transaction()?;
    let mut offices = OfficeMap(HashMap::new());
    let mut counts = BackfillCounts::default();

    load_offices(&tx, &offices_csv, &mut offices)?;
    counts.employees = load_employees(&tx, &employees_csv, &mut offices)?;
    let (agencies, id_map) = load_agencies(&tx, &agencies_csv, &mut offices)?;
    counts.agencies = agencies;
    counts.contacts = load_contacts(&tx, &contacts_csv, &id_map)?;
    counts.logs = load_logs(&tx, &logs_csv, &id_map)?;
    counts.tasks = load_tasks(&tx, &tasks_csv, &id_map)?;
    counts.production = load_production(&tx, &production_csv)?;
    counts.offices = offices.0.len();

    tx.commit()?;

    tracing::info!(
        dir = %dir.display(),
        offices = counts.offices,
        employees = counts.employees,
        agencies = counts.agencies,
        contacts = counts.contacts,
        logs = counts.logs,
        tasks = counts.tasks,
        production = counts.production,
        "Backfill complete"
    );
    Ok(counts)
}
