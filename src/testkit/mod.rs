//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`bus`] - [`InMemoryEventBus`], a synchronous [`EventBus`](crate::port::EventBus).
//! - [`store`] - Scripted [`SnapshotStore`](crate::port::SnapshotStore) doubles.
//! - [`domain`] - Builders for fills and event payloads.
//! - [`config`] - Canonical test configurations (fast retry, quiet telemetry).

pub mod bus;
pub mod config;
pub mod domain;
pub mod store;

pub use bus::InMemoryEventBus;
pub use store::{AlwaysBusyStore, ScriptedStore};
