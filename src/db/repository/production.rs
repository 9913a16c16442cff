use rusqlite::{params, Connection, Row};

use crate::db::DatabaseError;
use crate::models::enums::ProductionLine;
use crate::models::*;

const PRODUCTION_COLUMNS: &str = "office, agency_code, agency_name, active_flag, month,
    all_ytd_wp, all_ytd_nb, pytd_wp, pytd_nb, py_total_nb, affiliated_code,
    standard_lines_ytd_wp, standard_lines_ytd_nb, standard_lines_pytd_wp, standard_lines_pytd_nb,
    surplus_lines_ytd_wp, surplus_lines_ytd_nb, surplus_lines_pytd_wp, surplus_lines_pytd_nb,
    premium_change, three_year_plus, twelve_mo_bind_ratio, twelve_mo_bound, twelve_mo_quoted,
    twelve_mo_decline";

const PRODUCTION_PLACEHOLDERS: &str = "?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
    ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25";

fn production_from_row(row: &Row<'_>) -> rusqlite::Result<Production> {
    Ok(Production {
        id: row.get(0)?,
        record: ProductionRecord {
            office: row.get(1)?,
            agency_code: row.get(2)?,
            agency_name: row.get(3)?,
            active_flag: row.get(4)?,
            month: row.get(5)?,
            all_ytd_wp: row.get(6)?,
            all_ytd_nb: row.get(7)?,
            pytd_wp: row.get(8)?,
            pytd_nb: row.get(9)?,
            py_total_nb: row.get(10)?,
            affiliated_code: row.get(11)?,
            standard_lines_ytd_wp: row.get(12)?,
            standard_lines_ytd_nb: row.get(13)?,
            standard_lines_pytd_wp: row.get(14)?,
            standard_lines_pytd_nb: row.get(15)?,
            surplus_lines_ytd_wp: row.get(16)?,
            surplus_lines_ytd_nb: row.get(17)?,
            surplus_lines_pytd_wp: row.get(18)?,
            surplus_lines_pytd_nb: row.get(19)?,
            premium_change: row.get(20)?,
            three_year_plus: row.get(21)?,
            twelve_mo_bind_ratio: row.get(22)?,
            twelve_mo_bound: row.get(23)?,
            twelve_mo_quoted: row.get(24)?,
            twelve_mo_decline: row.get(25)?,
        },
    })
}

fn record_params(r: &ProductionRecord) -> [&dyn rusqlite::ToSql; 25] {
    [
        &r.office,
        &r.agency_code,
        &r.agency_name,
        &r.active_flag,
        &r.month,
        &r.all_ytd_wp,
        &r.all_ytd_nb,
        &r.pytd_wp,
        &r.pytd_nb,
        &r.py_total_nb,
        &r.affiliated_code,
        &r.standard_lines_ytd_wp,
        &r.standard_lines_ytd_nb,
        &r.standard_lines_pytd_wp,
        &r.standard_lines_pytd_nb,
        &r.surplus_lines_ytd_wp,
        &r.surplus_lines_ytd_nb,
        &r.surplus_lines_pytd_wp,
        &r.surplus_lines_pytd_nb,
        &r.premium_change,
        &r.three_year_plus,
        &r.twelve_mo_bind_ratio,
        &r.twelve_mo_bound,
        &r.twelve_mo_quoted,
        &r.twelve_mo_decline,
    ]
}

/// Rows ordered by month then agency code, optionally filtered.
pub fn list_production(
    conn: &Connection,
    office: Option<&str>,
    agency_code: Option<&str>,
) -> Result<Vec<Production>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, {PRODUCTION_COLUMNS} FROM production
         WHERE (?1 IS NULL OR office = ?1) AND (?2 IS NULL OR agency_code = ?2)
         ORDER BY month, agency_code"
    ))?;
    let rows = stmt.query_map(params![office, agency_code], production_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn insert_production(
    conn: &Connection,
    record: &ProductionRecord,
) -> Result<Production, DatabaseError> {
    conn.execute(
        &format!("INSERT INTO production ({PRODUCTION_COLUMNS}) VALUES ({PRODUCTION_PLACEHOLDERS})"),
        record_params(record),
    )?;
    Ok(Production {
        id: conn.last_insert_rowid(),
        record: record.clone(),
    })
}

/// Replace the row for (agency_code, month) or insert a new one.
///
/// Returns `true` when an existing row was overwritten.
pub fn upsert_production(
    conn: &Connection,
    record: &ProductionRecord,
) -> Result<bool, DatabaseError> {
    let removed = conn.execute(
        "DELETE FROM production WHERE agency_code = ?1 AND month = ?2",
        params![record.agency_code, record.month],
    )?;
    insert_production(conn, record)?;
    Ok(removed > 0)
}

/// Upsert every record in a single transaction. Returns rows written.
pub fn bulk_upsert_production(
    conn: &Connection,
    records: &[ProductionRecord],
) -> Result<usize, DatabaseError> {
    let tx = conn.unchecked_transaction()?;
    for record in records {
        upsert_production(&tx, record)?;
    }
    tx.commit()?;
    Ok(records.len())
}

/// Drop one office's figures for a reporting month.
pub fn delete_production_for_month(
    conn: &Connection,
    office: &str,
    month: &str,
) -> Result<usize, DatabaseError> {
    Ok(conn.execute(
        "DELETE FROM production WHERE office = ?1 AND month = ?2",
        params![office, month],
    )?)
}

/// Monthly totals for one production line, current year against prior.
pub fn production_trend(
    conn: &Connection,
    office: Option<&str>,
    line: ProductionLine,
) -> Result<Vec<ProductionTrendPoint>, DatabaseError> {
    let (cur_wp, prior_wp, cur_nb, prior_nb) = match line {
        ProductionLine::All => ("all_ytd_wp", "pytd_wp", "all_ytd_nb", "pytd_nb"),
        ProductionLine::Standard => (
            "standard_lines_ytd_wp",
            "standard_lines_pytd_wp",
            "standard_lines_ytd_nb",
            "standard_lines_pytd_nb",
        ),
        ProductionLine::Surplus => (
            "surplus_lines_ytd_wp",
            "surplus_lines_pytd_wp",
            "surplus_lines_ytd_nb",
            "surplus_lines_pytd_nb",
        ),
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT month,
                COALESCE(SUM({cur_wp}), 0), COALESCE(SUM({prior_wp}), 0),
                COALESCE(SUM({cur_nb}), 0), COALESCE(SUM({prior_nb}), 0)
         FROM production
         WHERE ?1 IS NULL OR office = ?1
         GROUP BY month ORDER BY month"
    ))?;
    let rows = stmt.query_map([office], |row| {
        Ok(ProductionTrendPoint {
            month: row.get(0)?,
            current_ytd_wp: row.get(1)?,
            prior_ytd_wp: row.get(2)?,
            current_ytd_nb: row.get(3)?,
            prior_ytd_nb: row.get(4)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
