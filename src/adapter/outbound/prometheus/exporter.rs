//! Prometheus mirror of the guard and event counters.

use prometheus::{
    opts, Encoder, IntCounterVec, IntGaugeVec, Registry, TextEncoder,
};
use tracing::error;

use crate::domain::CallStatus;
use crate::error::{Error, Result};
use crate::port::MetricsExporter;

/// Counters and gauges on a private registry, rendered in the text
/// exposition format.
pub struct PrometheusExporter {
    registry: Registry,
    http_requests: IntCounterVec,
    rate_drops: IntCounterVec,
    events: IntCounterVec,
    orders: IntCounterVec,
    circuit_open: IntGaugeVec,
}

fn exporter_error(e: prometheus::Error) -> Error {
    Error::Exporter(e.to_string())
}

impl PrometheusExporter {
    /// Build and register every metric family.
    ///
    /// # Errors
    /// Returns an error if a family fails to register.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests = IntCounterVec::new(
            opts!("http_requests_total", "Guarded exchange requests"),
            &["exchange", "method", "endpoint", "status"],
        )
        .map_err(exporter_error)?;
        let rate_drops = IntCounterVec::new(
            opts!("rate_limit_drops_total", "Requests refused by the rate limiter"),
            &["exchange", "endpoint"],
        )
        .map_err(exporter_error)?;
        let events = IntCounterVec::new(
            opts!("events_total", "Trading events observed"),
            &["event"],
        )
        .map_err(exporter_error)?;
        let orders = IntCounterVec::new(
            opts!("orders_total", "Orders submitted"),
            &["exchange", "symbol", "side"],
        )
        .map_err(exporter_error)?;
        let circuit_open = IntGaugeVec::new(
            opts!("circuit_open", "1 while the endpoint's circuit breaker is open"),
            &["exchange", "endpoint"],
        )
        .map_err(exporter_error)?;

        registry
            .register(Box::new(http_requests.clone()))
            .map_err(exporter_error)?;
        registry
            .register(Box::new(rate_drops.clone()))
            .map_err(exporter_error)?;
        registry
            .register(Box::new(events.clone()))
            .map_err(exporter_error)?;
        registry
            .register(Box::new(orders.clone()))
            .map_err(exporter_error)?;
        registry
            .register(Box::new(circuit_open.clone()))
            .map_err(exporter_error)?;

        Ok(Self {
            registry,
            http_requests,
            rate_drops,
            events,
            orders,
            circuit_open,
        })
    }

    /// Text exposition of every family. Empty on encoding failure.
    #[must_use]
    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            error!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_else(|e| {
            error!(error = %e, "Metrics buffer is not valid UTF-8");
            String::new()
        })
    }
}

impl MetricsExporter for PrometheusExporter {
    fn inc_http(&self, exchange: &str, method: &str, endpoint: &str, status: CallStatus) {
        self.http_requests
            .with_label_values(&[exchange, method, endpoint, status.as_str()])
            .inc();
    }

    fn inc_rate_drop(&self, exchange: &str, endpoint: &str) {
        self.rate_drops
            .with_label_values(&[exchange, endpoint])
            .inc();
    }

    fn set_circuit(&self, exchange: &str, endpoint: &str, open: bool) {
        self.circuit_open
            .with_label_values(&[exchange, endpoint])
            .set(i64::from(open));
    }

    fn inc_event(&self, event: &str) {
        self.events.with_label_values(&[event]).inc();
    }

    fn inc_order(&self, exchange: &str, symbol: &str, side: &str) {
        self.orders
            .with_label_values(&[exchange, symbol, side])
            .inc();
    }
}

impl std::fmt::Debug for PrometheusExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusExporter").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_labelled_families() {
        let exporter = PrometheusExporter::new().unwrap();
        exporter.inc_http("binance", "REST", "/api/v3/order", CallStatus::Err);
        exporter.inc_rate_drop("binance", "/api/v3/order");
        exporter.set_circuit("binance", "/api/v3/order", true);
        exporter.inc_event("TradeFilled");
        exporter.inc_order("binance", "BTCUSDT", "buy");

        let text = exporter.render();
        assert!(text.contains(
            r#"http_requests_total{endpoint="/api/v3/order",exchange="binance",method="REST",status="ERR"} 1"#
        ));
        assert!(text.contains(r#"rate_limit_drops_total{endpoint="/api/v3/order",exchange="binance"} 1"#));
        assert!(text.contains(r#"circuit_open{endpoint="/api/v3/order",exchange="binance"} 1"#));
        assert!(text.contains(r#"events_total{event="TradeFilled"} 1"#));
        assert!(text.contains(r#"orders_total{exchange="binance",side="buy",symbol="BTCUSDT"} 1"#));
    }

    #[test]
    fn circuit_gauge_closes() {
        let exporter = PrometheusExporter::new().unwrap();
        exporter.set_circuit("okx", "/x", true);
        exporter.set_circuit("okx", "/x", false);
        assert!(exporter
            .render()
            .contains(r#"circuit_open{endpoint="/x",exchange="okx"} 0"#));
    }

    #[test]
    fn instances_do_not_share_state() {
        let a = PrometheusExporter::new().unwrap();
        let b = PrometheusExporter::new().unwrap();
        a.inc_event("Retry");
        assert!(!b.render().contains("Retry"));
    }
}
