use std::env;
use std::fs;
use std::path::PathBuf;

use rusqlite::Connection;

use crate::error::EngineError;

use super::migrations;

const DATA_DIR: &str = ".taskdesk";
const DB_FILE: &str = "taskdesk.db";

/// Find the workspace root by walking up from the current directory until a
/// `.taskdesk` data directory appears.
pub fn find_data_root() -> Result<PathBuf, EngineError> {
    let mut dir = env::current_dir().map_err(|e| EngineError::database(e.to_string()))?;
    loop {
        if dir.join(DATA_DIR).exists() {
            return Ok(dir);
        }
        if !dir.pop() {
            return Err(EngineError::not_initialized());
        }
    }
}

/// Path to the taskdesk database for the surrounding workspace.
pub fn db_path() -> Result<PathBuf, EngineError> {
    let root = find_data_root()?;
    Ok(root.join(DATA_DIR).join(DB_FILE))
}

/// Open a connection to the database. Returns an error if not initialized.
pub fn open_db() -> Result<Connection, EngineError> {
    let path = db_path()?;
    if !path.exists() {
        return Err(EngineError::not_initialized());
    }
    let conn = Connection::open(&path)?;
    configure_connection(&conn)?;
    Ok(conn)
}

/// Initialize the database in the current directory: create the data
/// directory and run migrations.
pub fn init_db() -> Result<PathBuf, EngineError> {
    let cwd = env::current_dir().map_err(|e| EngineError::database(e.to_string()))?;
    let path = cwd.join(DATA_DIR).join(DB_FILE);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| EngineError::database(e.to_string()))?;
    }
    let conn = Connection::open(&path)?;
    configure_connection(&conn)?;
    migrations::run_migrations(&conn)?;
    Ok(path)
}

fn configure_connection(conn: &Connection) -> Result<(), EngineError> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA busy_timeout=5000;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}
