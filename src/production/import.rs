use std::collections::HashSet;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use rusqlite::Connection;

use super::{parse_production_grid, ImportError, ImportSummary, ProductionRow};
use crate::db::repository::{
    delete_production_for_month, find_agency_by_code, first_employee_in_office,
    get_office_by_code, insert_agency, insert_production, set_agency_active_flag,
};
use crate::models::{is_valid_month, AgencyInput, ProductionRecord};

/// How many new agency names the summary carries.
pub const MAX_REPORTED_NAMES: usize = 10;

const EXCEL_EXTENSIONS: &[&str] = &[".xls", ".xlsx"];

/// Reject uploads before touching the workbook.
pub fn validate_import_request(filename: &str, office: &str, month: &str) -> Result<(), ImportError> {
    let lower = filename.to_lowercase();
    if !EXCEL_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return Err(ImportError::InvalidFileType);
    }
    if office.trim().is_empty() {
        return Err(ImportError::MissingOffice);
    }
    if !is_valid_month(month) {
        return Err(ImportError::InvalidMonth);
    }
    Ok(())
}

/// First worksheet as a raw grid, header rows included.
pub fn read_first_sheet(bytes: &[u8]) -> Result<Vec<Vec<Data>>, ImportError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ImportError::Workbook(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::Workbook("workbook has no sheets".into()))?
        .map_err(|e| ImportError::Workbook(e.to_string()))?;
    Ok(range.rows().map(|row| row.to_vec()).collect())
}

fn to_record(row: &ProductionRow, office: &str, month: &str) -> ProductionRecord {
    ProductionRecord {
        office: office.to_string(),
        agency_code: row.agency_code.clone(),
        agency_name: row.agency_name.clone(),
        active_flag: Some(row.active_flag.clone()),
        month: month.to_string(),
        all_ytd_wp: Some(row.all_ytd_wp),
        all_ytd_nb: Some(row.all_ytd_nb),
        pytd_wp: Some(row.pytd_wp),
        pytd_nb: Some(row.pytd_nb),
        py_total_nb: Some(row.py_total_nb),
        ..Default::default()
    }
}

/// Replace an office's month of production and sync the agency list.
///
/// Runs in one transaction; nothing is written if any step fails.
pub fn apply_production_rows(
    conn: &Connection,
    office: &str,
    month: &str,
    rows: &[ProductionRow],
) -> Result<ImportSummary, ImportError> {
    let tx = conn.unchecked_transaction()?;

    let removed = delete_production_for_month(&tx, office, month)?;
    for row in rows {
        insert_production(&tx, &to_record(row, office, month))?;
    }

    let office_row = get_office_by_code(&tx, office)?;
    let underwriter = match &office_row {
        Some(o) => first_employee_in_office(&tx, o.id)?,
        None => None,
    };

    let mut seen = HashSet::new();
    let mut new_names = Vec::new();
    let mut updated = 0;
    for row in rows {
        if !seen.insert(row.agency_code.trim().to_uppercase()) {
            continue;
        }
        if let Some(agency) = find_agency_by_code(&tx, &row.agency_code)? {
            if !row.active_flag.is_empty() {
                set_agency_active_flag(&tx, agency.id, &row.active_flag)?;
            }
            updated += 1;
        } else if let Some(o) = &office_row {
            let mut input = AgencyInput::new(row.agency_name.as_str(), row.agency_code.as_str());
            input.office_id = Some(o.id);
            input.primary_underwriter_id = underwriter.as_ref().map(|e| e.id);
            if !row.active_flag.is_empty() {
                input.active_flag = Some(row.active_flag.clone());
            }
            insert_agency(&tx, &input)?;
            new_names.push(row.agency_name.clone());
        }
    }

    tx.commit()?;

    tracing::info!(
        office,
        month,
        removed,
        imported = rows.len(),
        created = new_names.len(),
        updated,
        "Production import applied"
    );

    let created = new_names.len();
    new_names.truncate(MAX_REPORTED_NAMES);
    Ok(ImportSummary {
        success: true,
        production_rows_imported: rows.len(),
        new_agencies_created: created,
        agencies_updated: updated,
        office: office.to_string(),
        month: month.to_string(),
        new_agency_names: new_names,
    })
}

/// Validate, parse and apply an uploaded production workbook.
pub fn import_production_workbook(
    conn: &Connection,
    filename: &str,
    bytes: &[u8],
    office: &str,
    month: &str,
) -> Result<ImportSummary, ImportError> {
    validate_import_request(filename, office, month)?;
    let grid = read_first_sheet(bytes)?;
    let rows = parse_production_grid(&grid)?;
    apply_production_rows(conn, office, month, &rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{insert_employee, insert_office, list_agencies, list_production};
    use crate::db::sqlite::open_memory_database;
    use crate::models::{NewEmployee, NewOffice, DEFAULT_ACTIVE_FLAG};
    use crate::production::testing::{sample_production_report, xlsx_with};

    fn row(code: &str, name: &str, flag: &str, wp: i64) -> ProductionRow {
        ProductionRow {
            agency_code: code.into(),
            agency_name: name.into(),
            active_flag: flag.into(),
            all_ytd_wp: wp,
            ..Default::default()
        }
    }

    fn seeded() -> Connection {
        let conn = open_memory_database().unwrap();
        let office = insert_office(
            &conn,
            &NewOffice {
                code: "SDO".into(),
                name: "San Diego".into(),
            },
        )
        .unwrap();
        for name in ["Dana Whitfield", "Luis Ortega"] {
            insert_employee(
                &conn,
                &NewEmployee {
                    name: name.into(),
                    office_id: Some(office.id),
                },
            )
            .unwrap();
        }
        conn
    }

    #[test]
    fn request_validation() {
        assert!(validate_import_request("April.XLSX", "SDO", "2025-04").is_ok());
        assert!(validate_import_request("april.xls", "SDO", "2025-04").is_ok());
        assert!(matches!(
            validate_import_request("april.csv", "SDO", "2025-04"),
            Err(ImportError::InvalidFileType)
        ));
        assert!(matches!(
            validate_import_request("april.xlsx", " ", "2025-04"),
            Err(ImportError::MissingOffice)
        ));
        assert!(matches!(
            validate_import_request("april.xlsx", "SDO", "2025-4"),
            Err(ImportError::InvalidMonth)
        ));
    }

    #[test]
    fn unreadable_workbook_is_rejected() {
        let err = read_first_sheet(b"not a spreadsheet").unwrap_err();
        assert!(matches!(err, ImportError::Workbook(_)));
    }

    #[test]
    fn workbook_import_end_to_end() {
        let conn = seeded();
        let summary = import_production_workbook(
            &conn,
            "April.xlsx",
            &sample_production_report(),
            "SDO",
            "2025-04",
        )
        .unwrap();

        assert_eq!(summary.production_rows_imported, 2);
        assert_eq!(summary.new_agencies_created, 2);
        assert_eq!(summary.new_agency_names, vec!["Harbor Insurance", "Summit Risk"]);

        let production = list_production(&conn, Some("SDO"), None).unwrap();
        assert_eq!(production.len(), 2);
        let harbor = production
            .iter()
            .find(|p| p.record.agency_code == "A100")
            .unwrap();
        // Repeated figure columns: the rightmost filled one wins
        assert_eq!(harbor.record.all_ytd_wp, Some(1250));
        assert_eq!(harbor.record.all_ytd_nb, Some(4));
        assert_eq!(harbor.record.pytd_wp, Some(900));
        assert_eq!(harbor.record.py_total_nb, Some(7));
        let summit = production
            .iter()
            .find(|p| p.record.agency_code == "B200")
            .unwrap();
        assert_eq!(summit.record.all_ytd_wp, Some(500));

        let agency = find_agency_by_code(&conn, "B200").unwrap().unwrap();
        assert_eq!(agency.active_flag.as_deref(), Some("Inactive"));
    }

    #[test]
    fn workbook_without_code_header_fails() {
        let conn = seeded();
        let bytes = xlsx_with(&[&["Agency", "YTD WP"], &["Harbor", "10"]]);
        let err = import_production_workbook(&conn, "April.xlsx", &bytes, "SDO", "2025-04")
            .unwrap_err();
        assert!(matches!(err, ImportError::HeaderNotFound));
        assert!(list_production(&conn, None, None).unwrap().is_empty());
    }

    #[test]
    fn creates_agencies_with_first_employee_as_underwriter() {
        let conn = seeded();
        let rows = vec![
            row("A100", "Harbor Insurance", "Active", 1000),
            row("B200", "Summit Risk", "", 500),
        ];
        let summary = apply_production_rows(&conn, "SDO", "2025-04", &rows).unwrap();

        assert!(summary.success);
        assert_eq!(summary.production_rows_imported, 2);
        assert_eq!(summary.new_agencies_created, 2);
        assert_eq!(summary.agencies_updated, 0);
        assert_eq!(summary.new_agency_names, vec!["Harbor Insurance", "Summit Risk"]);

        let agencies = list_agencies(&conn, None).unwrap();
        let harbor = agencies.iter().find(|a| a.code == "A100").unwrap();
        assert_eq!(harbor.primary_underwriter.as_deref(), Some("Dana Whitfield"));
        assert_eq!(harbor.active_flag.as_deref(), Some("Active"));
        let summit = agencies.iter().find(|a| a.code == "B200").unwrap();
        assert_eq!(summit.active_flag.as_deref(), Some(DEFAULT_ACTIVE_FLAG));
    }

    #[test]
    fn existing_agencies_are_updated_case_insensitively() {
        let conn = seeded();
        insert_agency(&conn, &AgencyInput::new("Harbor Insurance", "a100")).unwrap();

        let rows = vec![row("A100", "Harbor Insurance", "Inactive", 10)];
        let summary = apply_production_rows(&conn, "SDO", "2025-04", &rows).unwrap();
        assert_eq!(summary.agencies_updated, 1);
        assert_eq!(summary.new_agencies_created, 0);

        let agency = find_agency_by_code(&conn, "A100").unwrap().unwrap();
        assert_eq!(agency.active_flag.as_deref(), Some("Inactive"));
    }

    #[test]
    fn blank_flag_leaves_existing_agency_untouched() {
        let conn = seeded();
        let mut input = AgencyInput::new("Harbor Insurance", "A100");
        input.active_flag = Some("Active".into());
        insert_agency(&conn, &input).unwrap();

        apply_production_rows(&conn, "SDO", "2025-04", &[row("A100", "Harbor", "", 1)]).unwrap();
        let agency = find_agency_by_code(&conn, "A100").unwrap().unwrap();
        assert_eq!(agency.active_flag.as_deref(), Some("Active"));
    }

    #[test]
    fn duplicate_codes_create_one_agency_but_keep_all_rows() {
        let conn = seeded();
        let rows = vec![
            row("A100", "Harbor Insurance", "Active", 10),
            row(" a100 ", "Harbor Insurance (dup)", "Active", 20),
        ];
        let summary = apply_production_rows(&conn, "SDO", "2025-04", &rows).unwrap();
        assert_eq!(summary.production_rows_imported, 2);
        assert_eq!(summary.new_agencies_created, 1);
        assert_eq!(list_agencies(&conn, None).unwrap().len(), 1);
    }

    #[test]
    fn reimport_replaces_the_month() {
        let conn = seeded();
        apply_production_rows(&conn, "SDO", "2025-04", &[row("A100", "Harbor", "", 10)]).unwrap();
        apply_production_rows(&conn, "SDO", "2025-04", &[row("A100", "Harbor", "", 99)]).unwrap();

        let production = list_production(&conn, Some("SDO"), None).unwrap();
        assert_eq!(production.len(), 1);
        assert_eq!(production[0].record.all_ytd_wp, Some(99));
    }

    #[test]
    fn unknown_office_imports_figures_without_agencies() {
        let conn = seeded();
        let summary =
            apply_production_rows(&conn, "LAX", "2025-04", &[row("Z9", "Nowhere", "", 1)]).unwrap();
        assert_eq!(summary.production_rows_imported, 1);
        assert_eq!(summary.new_agencies_created, 0);
        assert!(list_agencies(&conn, None).unwrap().is_empty());
    }

    #[test]
    fn reported_names_are_capped() {
        let conn = seeded();
        let rows: Vec<ProductionRow> = (0..12)
            .map(|i| row(&format!("C{i}"), &format!("Agency {i}"), "", 1))
            .collect();
        let summary = apply_production_rows(&conn, "SDO", "2025-04", &rows).unwrap();
        assert_eq!(summary.new_agencies_created, 12);
        assert_eq!(summary.new_agency_names.len(), MAX_REPORTED_NAMES);
    }
}
