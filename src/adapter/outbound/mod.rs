//! Outbound adapters (driven side).

#[cfg(feature = "exporter")]
pub mod prometheus;
pub mod sqlite;
