use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{apply_changes, delete_row};
use crate::db::DatabaseError;
use crate::models::patch::Changes;
use crate::models::*;

const EMPLOYEE_COLUMNS: &str = "e.id, e.name, e.office_id";

fn employee_from_row(row: &Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row.get(0)?,
        name: row.get(1)?,
        office_id: row.get(2)?,
    })
}

/// All employees, or only those in the office with `office_code`.
pub fn list_employees(
    conn: &Connection,
    office_code: Option<&str>,
) -> Result<Vec<Employee>, DatabaseError> {
    let employees = match office_code {
        Some(code) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EMPLOYEE_COLUMNS} FROM employees e
                 JOIN offices o ON o.id = e.office_id
                 WHERE o.code = ?1 ORDER BY e.name"
            ))?;
            let rows = stmt.query_map([code], employee_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EMPLOYEE_COLUMNS} FROM employees e ORDER BY e.name"
            ))?;
            let rows = stmt.query_map([], employee_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        }
    };
    Ok(employees)
}

pub fn get_employee(conn: &Connection, id: i64) -> Result<Option<Employee>, DatabaseError> {
    Ok(conn
        .query_row(
            &format!("SELECT {EMPLOYEE_COLUMNS} FROM employees e WHERE e.id = ?1"),
            [id],
            employee_from_row,
        )
        .optional()?)
}

/// Lowest-id employee in an office; the default underwriter for new agencies.
pub fn first_employee_in_office(
    conn: &Connection,
    office_id: i64,
) -> Result<Option<Employee>, DatabaseError> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {EMPLOYEE_COLUMNS} FROM employees e
                 WHERE e.office_id = ?1 ORDER BY e.id LIMIT 1"
            ),
            [office_id],
            employee_from_row,
        )
        .optional()?)
}

pub fn insert_employee(conn: &Connection, employee: &NewEmployee) -> Result<Employee, DatabaseError> {
    let name = employee.name.trim();
    conn.execute(
        "INSERT INTO employees (name, office_id) VALUES (?1, ?2)",
        params![name, employee.office_id],
    )?;
    Ok(Employee {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        office_id: employee.office_id,
    })
}

pub fn update_employee(
    conn: &Connection,
    id: i64,
    update: &EmployeeUpdate,
) -> Result<Option<Employee>, DatabaseError> {
    let mut changes = Changes::new();
    changes.required_text("name", &update.name);
    changes.int("office_id", &update.office_id);

    if !apply_changes(conn, "employees", id, &changes)? {
        return Ok(None);
    }
    // Keep agency display names in step with a renamed underwriter
    if let Some(name) = &update.name {
        conn.execute(
            "UPDATE agencies SET primary_underwriter = ?1 WHERE primary_underwriter_id = ?2",
            params![name, id],
        )?;
    }
    get_employee(conn, id)
}

pub fn delete_employee(conn: &Connection, id: i64) -> Result<bool, DatabaseError> {
    delete_row(conn, "employees", id)
}

/// Find by exact name within an office (office may be unset).
pub fn find_employee(
    conn: &Connection,
    name: &str,
    office_id: Option<i64>,
) -> Result<Option<Employee>, DatabaseError> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {EMPLOYEE_COLUMNS} FROM employees e
                 WHERE e.name = ?1 AND e.office_id IS ?2 ORDER BY e.id LIMIT 1"
            ),
            params![name, office_id],
            employee_from_row,
        )
        .optional()?)
}

/// Insert with a caller-chosen id, or rewrite that row if it exists.
pub fn upsert_employee_with_id(
    conn: &Connection,
    id: i64,
    name: &str,
    office_id: Option<i64>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO employees (id, name, office_id) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name, office_id = excluded.office_id",
        params![id, name, office_id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::office::insert_office;
    use crate::db::sqlite::open_memory_database;

    fn setup() -> (Connection, i64, i64) {
        let conn = open_memory_database().unwrap();
        let sdo = insert_office(
            &conn,
            &NewOffice {
                code: "SDO".into(),
                name: "San Diego".into(),
            },
        )
        .unwrap();
        let sea = insert_office(
            &conn,
            &NewOffice {
                code: "SEA".into(),
                name: "Seattle".into(),
            },
        )
        .unwrap();
        (conn, sdo.id, sea.id)
    }

    fn hire(conn: &Connection, name: &str, office_id: Option<i64>) -> Employee {
        insert_employee(
            conn,
            &NewEmployee {
                name: name.into(),
                office_id,
            },
        )
        .unwrap()
    }

    #[test]
    fn list_filters_by_office_code() {
        let (conn, sdo, sea) = setup();
        hire(&conn, "Avery", Some(sdo));
        hire(&conn, "Blake", Some(sea));
        hire(&conn, "Casey", None);

        assert_eq!(list_employees(&conn, None).unwrap().len(), 3);
        let sdo_staff = list_employees(&conn, Some("SDO")).unwrap();
        assert_eq!(sdo_staff.len(), 1);
        assert_eq!(sdo_staff[0].name, "Avery");
        assert!(list_employees(&conn, Some("NOPE")).unwrap().is_empty());
    }

    #[test]
    fn first_employee_is_lowest_id() {
        let (conn, sdo, _) = setup();
        let first = hire(&conn, "Zed", Some(sdo));
        hire(&conn, "Amy", Some(sdo));
        let found = first_employee_in_office(&conn, sdo).unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[test]
    fn update_sets_only_given_fields() {
        let (conn, sdo, sea) = setup();
        let emp = hire(&conn, "Avery", Some(sdo));

        let moved = update_employee(
            &conn,
            emp.id,
            &EmployeeUpdate {
                name: None,
                office_id: Some(Some(sea)),
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(moved.name, "Avery");
        assert_eq!(moved.office_id, Some(sea));

        let cleared = update_employee(
            &conn,
            emp.id,
            &EmployeeUpdate {
                name: None,
                office_id: Some(None),
            },
        )
        .unwrap()
        .unwrap();
        assert_eq!(cleared.office_id, None);
    }

    #[test]
    fn update_missing_employee_is_none() {
        let (conn, _, _) = setup();
        let result = update_employee(&conn, 404, &EmployeeUpdate::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn unknown_office_is_foreign_key_violation() {
        let (conn, _, _) = setup();
        let err = insert_employee(
            &conn,
            &NewEmployee {
                name: "Ghost".into(),
                office_id: Some(999),
            },
        )
        .unwrap_err();
        assert!(matches!(err, DatabaseError::ForeignKeyViolation(_)));
    }

    #[test]
    fn upsert_with_id_overwrites() {
        let (conn, sdo, _) = setup();
        upsert_employee_with_id(&conn, 42, "Avery", Some(sdo)).unwrap();
        upsert_employee_with_id(&conn, 42, "Avery Q", None).unwrap();
        let emp = get_employee(&conn, 42).unwrap().unwrap();
        assert_eq!(emp.name, "Avery Q");
        assert_eq!(emp.office_id, None);
    }
}
