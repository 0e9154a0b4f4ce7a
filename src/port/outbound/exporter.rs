//! Metrics exposition port.
//!
//! The runtime registry is the source of truth; an exporter mirrors counters
//! and gauges into a pull-based exposition format for external scrapers.

use crate::domain::CallStatus;

/// Mirror of guard and event counters for an external scraper.
///
/// Implementations must never fail the caller: exposition problems are
/// swallowed or logged inside the implementation.
pub trait MetricsExporter: Send + Sync {
    /// `http_requests_total{exchange,method,endpoint,status}` += 1.
    fn inc_http(&self, exchange: &str, method: &str, endpoint: &str, status: CallStatus);

    /// `rate_limit_drops_total{exchange,endpoint}` += 1.
    fn inc_rate_drop(&self, exchange: &str, endpoint: &str);

    /// `circuit_open{exchange,endpoint}` = 1 or 0.
    fn set_circuit(&self, exchange: &str, endpoint: &str, open: bool);

    /// `events_total{event}` += 1.
    fn inc_event(&self, event: &str);

    /// `orders_total{exchange,symbol,side}` += 1.
    fn inc_order(&self, exchange: &str, symbol: &str, side: &str);
}

/// Exporter used when exposition is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopExporter;

impl MetricsExporter for NoopExporter {
    fn inc_http(&self, _: &str, _: &str, _: &str, _: CallStatus) {}
    fn inc_rate_drop(&self, _: &str, _: &str) {}
    fn set_circuit(&self, _: &str, _: &str, _: bool) {}
    fn inc_event(&self, _: &str) {}
    fn inc_order(&self, _: &str, _: &str, _: &str) {}
}
