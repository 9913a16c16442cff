//! Load the legacy CRM CSV exports into the workbench database.
//!
//! Usage:
//!   workbench-ingest                          # find the exports from the current directory up
//!   workbench-ingest --data-dir exports/crm   # explicit export directory
//!   workbench-ingest --database data/wb.db    # override DATABASE_URL

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use workbench_lib::backfill::{find_data_dir, run_backfill, BackfillError};
use workbench_lib::config::WorkbenchConfig;
use workbench_lib::db;

#[derive(Parser)]
#[command(name = "workbench-ingest")]
#[command(about = "Backfill the workbench database from CRM CSV exports")]
struct Args {
    /// Directory holding the crm_*.csv files
    #[arg(short = 'd', long)]
    data_dir: Option<PathBuf>,

    /// SQLite database file (defaults to DATABASE_URL)
    #[arg(long)]
    database: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    workbench_lib::init_tracing();

    let database_path = match args.database {
        Some(path) => path,
        None => match WorkbenchConfig::from_env() {
            Ok(config) => config.database_path,
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        },
    };

    let data_dir = match args.data_dir {
        Some(dir) => Some(dir),
        None => std::env::current_dir()
            .ok()
            .and_then(|cwd| find_data_dir(&cwd)),
    };
    let Some(data_dir) = data_dir else {
        eprintln!("Error: {}", BackfillError::DataDirNotFound);
        return ExitCode::FAILURE;
    };

    let conn = match db::open_database(&database_path) {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("Error opening {}: {e}", database_path.display());
            return ExitCode::FAILURE;
        }
    };

    println!("Loading CSV exports from {}", data_dir.display());
    match run_backfill(&conn, &data_dir) {
        Ok(counts) => {
            println!("Backfill complete:");
            println!("  offices:    {}", counts.offices);
            println!("  employees:  {}", counts.employees);
            println!("  agencies:   {}", counts.agencies);
            println!("  contacts:   {}", counts.contacts);
            println!("  logs:       {}", counts.logs);
            println!("  tasks:      {}", counts.tasks);
            println!("  production: {}", counts.production);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Backfill failed: {e}");
            ExitCode::FAILURE
        }
    }
}
