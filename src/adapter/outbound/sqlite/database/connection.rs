//! Connection setup for the metrics database.
//!
//! Connections are short-lived: one per write, configured for concurrent
//! readers (WAL) and a bounded wait on writer contention.

use std::path::Path;
use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::SqliteConnection;

use super::schema::CREATE_SCHEMA;
use crate::error::StoreError;

/// How long SQLite waits on a locked database before reporting busy.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(3000);

/// Open `path`, creating parent directories as needed, and apply pragmas.
///
/// # Errors
/// Returns [`StoreError::Busy`] on contention, [`StoreError::Storage`] otherwise.
pub fn open_connection(path: &Path, busy_timeout: Duration) -> Result<SqliteConnection, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| StoreError::Storage(e.to_string()))?;
    }
    let url = path.to_string_lossy();
    let mut conn =
        SqliteConnection::establish(&url).map_err(|e| StoreError::classify(e.to_string()))?;
    configure_connection(&mut conn, busy_timeout)?;
    Ok(conn)
}

/// Apply the busy timeout, WAL journal, and NORMAL sync.
///
/// # Errors
/// Returns an error if a pragma fails to apply.
pub fn configure_connection(
    conn: &mut SqliteConnection,
    busy_timeout: Duration,
) -> Result<(), StoreError> {
    let pragmas = format!(
        "PRAGMA busy_timeout={}; PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;",
        busy_timeout.as_millis()
    );
    conn.batch_execute(&pragmas)
        .map_err(|e| StoreError::classify(e.to_string()))
}

/// Create the four history tables and their indexes if missing.
///
/// # Errors
/// Returns an error if the DDL fails.
pub fn ensure_schema(conn: &mut SqliteConnection) -> Result<(), StoreError> {
    conn.batch_execute(CREATE_SCHEMA)
        .map_err(|e| StoreError::classify(e.to_string()))
}
