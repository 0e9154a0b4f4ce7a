//! Durable snapshot storage port.

use crate::domain::SnapshotRows;
use crate::error::StoreError;

/// Append-only sink for periodic metrics rows.
///
/// # Implementation Notes
///
/// - Each call must make sure the schema exists before inserting
///   (idempotent create), so the first write to a fresh target succeeds.
/// - All rows of one call are committed together.
/// - Contention must surface as [`StoreError::Busy`] so callers can retry;
///   anything else is [`StoreError::Storage`].
/// - Implementations must release their connection before returning, on
///   every path.
pub trait SnapshotStore: Send + Sync {
    fn append(&self, rows: &SnapshotRows) -> Result<(), StoreError>;
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for std::sync::Arc<S> {
    fn append(&self, rows: &SnapshotRows) -> Result<(), StoreError> {
        (**self).append(rows)
    }
}
