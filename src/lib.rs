//! Tradewarden - call guards and runtime metrics for trading bots.
//!
//! Wraps outbound exchange calls with a per-endpoint token bucket and circuit
//! breaker, aggregates latency, request and equity metrics in process, mirrors
//! counters to a Prometheus endpoint, and appends periodic snapshots to SQLite.
//!
//! # Modules
//!
//! - [`domain`] - Guard keys, fills, latency summaries, snapshot rows
//! - [`port`] - Exporter, snapshot store, event bus and policy traits
//! - [`application`] - Guards, metrics registry, persistence writer
//! - [`adapter`] - SQLite store and Prometheus exporter
//! - [`infrastructure`] - Configuration and the [`Telemetry`](infrastructure::Telemetry) composition root
//! - [`error`] - Error types for the crate
//!
//! # Features
//!
//! - `exporter` (default) - Prometheus exposition on `GET /metrics`
//! - `testkit` - In-memory bus and store doubles for integration tests
//!
//! # Example
//!
//! ```no_run
//! use tradewarden::application::guard::GuardRegistry;
//! use tradewarden::domain::GuardSettings;
//! use tradewarden::error::GuardError;
//! use tradewarden::infrastructure::config::settings::Config;
//! use tradewarden::infrastructure::Telemetry;
//!
//! let telemetry = Telemetry::build(&Config::default());
//! let result: Result<u32, GuardError<std::io::Error>> =
//!     telemetry.guard("binance:rest:/api/v3/order").call(|| Ok(42));
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
