//! SQLite metrics history store.
//!
//! Implements [`SnapshotStore`] with one connection per append: open, make
//! sure the schema exists, insert every row in one immediate transaction,
//! then drop the connection.

use std::path::{Path, PathBuf};
use std::time::Duration;

use diesel::prelude::*;
use tracing::debug;

use super::database::connection::{ensure_schema, open_connection, DEFAULT_BUSY_TIMEOUT};
use super::database::model::{
    NewBotEquityRow, NewEquityRow, NewLatencyRow, NewStrategyEquityRow,
};
use super::database::schema::{equity, equity_bot, equity_strategy, latency};
use crate::domain::SnapshotRows;
use crate::error::StoreError;
use crate::port::SnapshotStore;

#[derive(Debug, Clone)]
pub struct SqliteSnapshotStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn insert_rows(conn: &mut SqliteConnection, rows: &SnapshotRows) -> QueryResult<()> {
        if let Some(row) = &rows.equity {
            diesel::insert_into(equity::table)
                .values(NewEquityRow::from(row))
                .execute(conn)?;
        }
        for row in &rows.equity_bot {
            diesel::insert_into(equity_bot::table)
                .values(NewBotEquityRow::from(row))
                .execute(conn)?;
        }
        for row in &rows.equity_strategy {
            diesel::insert_into(equity_strategy::table)
                .values(NewStrategyEquityRow::from(row))
                .execute(conn)?;
        }
        if let Some(row) = &rows.latency {
            diesel::insert_into(latency::table)
                .values(NewLatencyRow::from(row))
                .execute(conn)?;
        }
        Ok(())
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn append(&self, rows: &SnapshotRows) -> Result<(), StoreError> {
        let mut conn = open_connection(&self.path, self.busy_timeout)?;
        ensure_schema(&mut conn)?;
        conn.immediate_transaction(|conn| Self::insert_rows(conn, rows))
            .map_err(|e| StoreError::classify(e.to_string()))?;
        debug!(path = %self.path.display(), rows = rows.row_count(), "Appended metrics rows");
        Ok(())
    }
}
