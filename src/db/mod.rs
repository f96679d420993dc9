// Database layer — SQLite storage for share events, coefficients, and metrics.
//
// We use rusqlite with the "bundled" feature so there's no system SQLite
// dependency. The database file lives wherever WILDFIRE_DB_PATH points
// (defaults to ./wildfire.db).

pub mod models;
pub mod queries;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use traits::Database;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;

/// Create (or migrate) the database at the given path.
///
/// Called by `wildfire init`; safe to call again on an existing file since
/// migrations are idempotent.
pub fn initialize(db_path: &str) -> Result<Connection> {
    let parent = Path::new(db_path).parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = parent {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory for database: {db_path}"))?;
    }

    let conn = open_connection(db_path)?;
    schema::create_tables(&conn)?;
    Ok(conn)
}

/// Open an existing database. Fails if the file doesn't exist yet, so a
/// typo'd WILDFIRE_DB_PATH surfaces instead of silently starting empty.
pub fn open(db_path: &str) -> Result<Connection> {
    if !Path::new(db_path).exists() {
        anyhow::bail!(
            "Database not found at {}. Run `wildfire init` first.",
            db_path
        );
    }
    open_connection(db_path)
}

fn open_connection(db_path: &str) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {db_path}"))?;
    // WAL lets the reporting views read while a recalculation writes
    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(conn)
}

/// Open (or create) the database and wrap it in the async interface.
pub fn initialize_sqlite(db_path: &str) -> Result<Arc<dyn Database>> {
    let conn = initialize(db_path)?;
    Ok(Arc::new(sqlite::SqliteDatabase::new(conn)))
}

/// Open an existing database wrapped in the async interface.
pub fn open_sqlite(db_path: &str) -> Result<Arc<dyn Database>> {
    let conn = open(db_path)?;
    Ok(Arc::new(sqlite::SqliteDatabase::new(conn)))
}
