//! SQLite persistence for the metrics history, using Diesel ORM.

pub mod database;
pub mod store;

pub use store::SqliteSnapshotStore;
