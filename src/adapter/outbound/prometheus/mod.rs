//! Prometheus exposition of guard and event counters.

pub mod exporter;
pub mod server;

pub use exporter::PrometheusExporter;
pub use server::{serve, ExporterHandle};
