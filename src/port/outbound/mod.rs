//! Outbound ports (driven side): interfaces implemented by outbound adapters.
//!
//! These contracts describe the collaborators the telemetry layer talks to:
//! a metrics exposition endpoint, durable storage, the host's event bus, and
//! the configuration that shapes each guard.

pub mod event_bus;
pub mod exporter;
pub mod policy;
pub mod store;
