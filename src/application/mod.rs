//! Application services (use cases).
//!
//! Guarded outbound calls, metrics aggregation, and periodic persistence.
//! These services depend on domain types and ports only.

pub mod guard;
pub mod metrics;
pub mod persistence;
