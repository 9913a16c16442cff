use std::path::Path;

use rusqlite::Connection;
use tracing;

use super::DatabaseError;

/// Columns added to the schema after the first deployments. Databases
/// created by earlier builds get them through `ensure_columns`.
const LATE_COLUMNS: &[(&str, &str, &str)] = &[
    ("agencies", "primary_underwriter", "VARCHAR(255)"),
    ("agencies", "active_flag", "VARCHAR(50) DEFAULT 'Unknown'"),
    ("agencies", "dba", "VARCHAR(255)"),
    ("agencies", "email", "VARCHAR(255)"),
    ("contacts", "notes", "TEXT"),
    ("contacts", "linkedin_url", "VARCHAR(255)"),
    ("logs", "contact_id", "INTEGER"),
    ("logs", "contact", "VARCHAR(255)"),
    ("production", "affiliated_code", "VARCHAR(50)"),
    ("production", "standard_lines_ytd_wp", "INTEGER"),
    ("production", "standard_lines_ytd_nb", "INTEGER"),
    ("production", "standard_lines_pytd_wp", "INTEGER"),
    ("production", "standard_lines_pytd_nb", "INTEGER"),
    ("production", "surplus_lines_ytd_wp", "INTEGER"),
    ("production", "surplus_lines_ytd_nb", "INTEGER"),
    ("production", "surplus_lines_pytd_wp", "INTEGER"),
    ("production", "surplus_lines_pytd_nb", "INTEGER"),
    ("production", "premium_change", "INTEGER"),
    ("production", "three_year_plus", "INTEGER"),
    ("production", "twelve_mo_bind_ratio", "VARCHAR(50)"),
    ("production", "twelve_mo_bound", "INTEGER"),
    ("production", "twelve_mo_quoted", "INTEGER"),
    ("production", "twelve_mo_decline", "INTEGER"),
];

/// Open a SQLite connection to the given path and run migrations
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Open an already-migrated database without re-running migrations.
///
/// Used per request; `open_database` runs once at startup.
pub fn connect(path: &Path) -> Result<Connection, DatabaseError> {
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    Ok(conn)
}

/// Open an in-memory database (for testing)
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

fn configure_pragmas(conn: &Connection) -> Result<(), DatabaseError> {
    // journal_mode returns a row, so it cannot go through execute_batch
    conn.query_row("PRAGMA journal_mode=WAL", [], |_| Ok(()))?;
    conn.execute_batch(
        "PRAGMA foreign_keys=ON;
         PRAGMA busy_timeout=5000;",
    )?;
    Ok(())
}

/// Run all pending migrations, then backfill late columns
pub fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    let current_version = get_current_version(conn);

    let migrations: Vec<(i64, &str)> = vec![
        (1, include_str!("../../resources/migrations/001_initial.sql")),
        (2, include_str!("../../resources/migrations/002_indexes.sql")),
    ];

    for (version, sql) in migrations {
        if version > current_version {
            tracing::info!("Running migration v{version}");
            conn.execute_batch(sql).map_err(|e| DatabaseError::MigrationFailed {
                version,
                reason: e.to_string(),
            })?;
        }
    }

    ensure_columns(conn)?;
    Ok(())
}

/// Get the current schema version (0 if no schema exists yet)
fn get_current_version(conn: &Connection) -> i64 {
    conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get::<_, i64>(0),
    )
    .unwrap_or(0)
}

/// Add any `LATE_COLUMNS` entry missing from its table.
///
/// Returns the number of columns added.
pub fn ensure_columns(conn: &Connection) -> Result<usize, DatabaseError> {
    let mut added = 0;
    for (table, column, decl) in LATE_COLUMNS {
        if column_exists(conn, table, column)? {
            continue;
        }
        tracing::info!(table, column, "Adding missing column");
        conn.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {column} {decl}"))?;
        added += 1;
    }
    Ok(added)
}

/// Check `PRAGMA table_info` for a column.
pub fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, DatabaseError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;
    for name in names {
        if name? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Count tables in the database (for verification)
pub fn count_tables(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

/// Cheap liveness probe used by `/health`.
pub fn ping(conn: &Connection) -> Result<(), DatabaseError> {
    conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
    Ok(())
}
