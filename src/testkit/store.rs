//! Snapshot store doubles.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};

use parking_lot::Mutex;

use crate::domain::SnapshotRows;
use crate::error::StoreError;
use crate::port::SnapshotStore;

/// Pops one scripted outcome per append (succeeding once the script runs
/// out) and keeps every row set it was handed.
#[derive(Debug, Default)]
pub struct ScriptedStore {
    outcomes: Mutex<VecDeque<StoreError>>,
    appended: Mutex<Vec<SnapshotRows>>,
    attempts: AtomicU32,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failures(failures: Vec<StoreError>) -> Self {
        Self {
            outcomes: Mutex::new(failures.into()),
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Rows passed to every append, failed ones included.
    pub fn appended(&self) -> Vec<SnapshotRows> {
        self.appended.lock().clone()
    }
}

impl SnapshotStore for ScriptedStore {
    fn append(&self, rows: &SnapshotRows) -> Result<(), StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.appended.lock().push(rows.clone());
        match self.outcomes.lock().pop_front() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Reports the database as locked on every append.
#[derive(Debug, Default)]
pub struct AlwaysBusyStore {
    attempts: AtomicU32,
}

impl AlwaysBusyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl SnapshotStore for AlwaysBusyStore {
    fn append(&self, _rows: &SnapshotRows) -> Result<(), StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Busy("database is locked".into()))
    }
}
