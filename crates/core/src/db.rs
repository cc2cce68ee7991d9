//! SQLite store: connection setup and schema migrations.
//!
//! Every request opens its own connection. Migrations are recorded in `schema_version` and only
//! the ones newer than the recorded version run, so opening an up-to-date database is cheap.

use crate::error::{CoreError, CoreResult};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("../migrations/001_initial.sql"))];

/// Open a SQLite connection to the given path and run pending migrations.
///
/// The parent directory is created if it does not exist.
pub fn open_database(path: &Path) -> CoreResult<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(CoreError::StorageDirCreation)?;
    }
    let conn = Connection::open(path).map_err(CoreError::Store)?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

/// Open an in-memory database with the full schema.
pub fn open_memory_database() -> CoreResult<Connection> {
    let conn = Connection::open_in_memory().map_err(CoreError::Store)?;
    configure_pragmas(&conn)?;
    run_migrations(&conn)?;
    Ok(conn)
}

fn configure_pragmas(conn: &Connection) -> CoreResult<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys=ON;
         PRAGMA busy_timeout=5000;",
    )
    .map_err(CoreError::Store)
}

/// Run all pending migrations.
pub fn run_migrations(conn: &Connection) -> CoreResult<()> {
    let current_version = current_version(conn)?;

    for &(version, sql) in MIGRATIONS {
        if version > current_version {
            tracing::info!(version, "running migration");
            conn.execute_batch(sql)
                .map_err(|e| CoreError::Migration {
                    version,
                    reason: e.to_string(),
                })?;
        }
    }

    Ok(())
}

/// Current schema version, 0 for an empty database.
pub fn current_version(conn: &Connection) -> CoreResult<i64> {
    let has_table = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
            [],
            |_| Ok(()),
        )
        .optional()
        .map_err(CoreError::Store)?
        .is_some();

    if !has_table {
        return Ok(0);
    }

    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |row| {
        row.get(0)
    })
    .map_err(CoreError::Store)
}
