//! Admission control and failure isolation for outbound exchange calls.
//!
//! ```text
//! caller ─▶ CallGuard ─▶ GuardRegistry::get_or_create(key)
//!                │            └─ (TokenBucket, CircuitBreaker)
//!                ├─ bucket.consume(1) ── denied ─▶ rate drop, RateLimited
//!                └─ breaker.call(f) ─▶ latency + OK/ERR + circuit gauge
//! ```

pub mod breaker;
pub mod bucket;
pub mod call;
pub mod registry;

use std::sync::Arc;

pub use breaker::{CircuitBreaker, CircuitState};
pub use bucket::TokenBucket;
pub use call::{CallGuard, GuardNamespace};
pub use registry::{GuardEntry, GuardRegistry, UNMAPPED_METHOD};

use crate::application::metrics::MetricsRegistry;
use crate::port::MetricsExporter;

/// Hands out [`CallGuard`]s that share one registry, metrics sink, and
/// exporter.
#[derive(Clone)]
pub struct GuardFactory {
    registry: Arc<GuardRegistry>,
    metrics: Arc<MetricsRegistry>,
    exporter: Arc<dyn MetricsExporter>,
}

impl GuardFactory {
    pub fn new(
        registry: Arc<GuardRegistry>,
        metrics: Arc<MetricsRegistry>,
        exporter: Arc<dyn MetricsExporter>,
    ) -> Self {
        Self {
            registry,
            metrics,
            exporter,
        }
    }

    /// Guard for a key such as `binance:rest:/api/v3/order` or
    /// `exchange:get_balance`.
    #[must_use]
    pub fn guard(&self, key: &str) -> CallGuard {
        CallGuard::new(
            key,
            Arc::clone(&self.registry),
            Arc::clone(&self.metrics),
            Arc::clone(&self.exporter),
        )
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<GuardRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }
}

impl std::fmt::Debug for GuardFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardFactory")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
