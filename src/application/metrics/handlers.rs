//! Event-bus subscribers that feed the metrics registry.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::domain::{Fill, Side};
use crate::port::{events, EventBus, EventHandler, MetricsExporter};

use super::registry::MetricsRegistry;

/// Numeric payload field; accepts JSON numbers and numeric strings.
fn number(payload: &Value, field: &str) -> Option<f64> {
    match payload.get(field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Non-empty string payload field.
fn text<'a>(payload: &'a Value, field: &str) -> Option<&'a str> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Translates trading events into registry and exporter updates.
#[derive(Clone)]
pub struct MetricsSubscriber {
    metrics: Arc<MetricsRegistry>,
    exporter: Arc<dyn MetricsExporter>,
}

impl MetricsSubscriber {
    pub fn new(metrics: Arc<MetricsRegistry>, exporter: Arc<dyn MetricsExporter>) -> Self {
        Self { metrics, exporter }
    }

    /// Subscribe every handler on `bus`. Call again after the bus is cleared.
    pub fn install(&self, bus: &dyn EventBus) {
        for event in events::COUNTED {
            let this = self.clone();
            let handler: EventHandler = Arc::new(move |_payload: &Value| this.on_counted(event));
            bus.subscribe(event, handler);
        }

        for event in events::FILLS {
            let this = self.clone();
            bus.subscribe(event, Arc::new(move |payload: &Value| this.on_fill(payload)));
        }

        let this = self.clone();
        bus.subscribe(
            events::ORDER_SUBMITTED,
            Arc::new(move |payload: &Value| this.on_order_submitted(payload)),
        );

        let this = self.clone();
        bus.subscribe(
            events::MARKET_DATA_UPDATE,
            Arc::new(move |payload: &Value| this.on_market_tick(payload)),
        );

        debug!("Installed metrics subscribers");
    }

    pub fn on_counted(&self, event: &str) {
        self.metrics.record_event(event);
        self.exporter.inc_event(event);
    }

    /// Apply a fill payload:
    /// `{exchange, symbol, side, price, qty, bot_id?, strategy?}`.
    pub fn on_fill(&self, payload: &Value) {
        if !payload.is_object() {
            debug!(payload = %payload, "Ignoring malformed fill event");
            return;
        }
        let exchange = text(payload, "exchange").unwrap_or("na");
        let symbol = text(payload, "symbol").unwrap_or("NA");
        let side = text(payload, "side").unwrap_or("NA");
        let price = number(payload, "price").unwrap_or(0.0);
        let qty = number(payload, "qty").unwrap_or(0.0);

        let mut fill = Fill::new(exchange, symbol, Side::from_label(side), price, qty);
        fill.bot_id = text(payload, "bot_id").map(str::to_string);
        fill.strategy = text(payload, "strategy").map(str::to_string);

        self.metrics.record_fill(&fill);
        self.metrics.record_order(exchange, symbol, side);
    }

    pub fn on_order_submitted(&self, payload: &Value) {
        if !payload.is_object() {
            debug!(payload = %payload, "Ignoring malformed order event");
            return;
        }
        let exchange = text(payload, "exchange").unwrap_or("na");
        let symbol = text(payload, "symbol").unwrap_or("NA");
        let side = text(payload, "side").unwrap_or("NA");
        self.metrics.record_order(exchange, symbol, side);
        self.exporter.inc_order(exchange, symbol, side);
    }

    /// Mark to the tick's `price`, falling back to `bid` then `ask`.
    pub fn on_market_tick(&self, payload: &Value) {
        let price = ["price", "bid", "ask"]
            .into_iter()
            .find_map(|field| number(payload, field).filter(|p| *p != 0.0));
        match price {
            Some(price) => {
                let symbol = text(payload, "symbol").unwrap_or("NA");
                self.metrics.mark_price(symbol, price);
            }
            None => debug!(payload = %payload, "Market tick without price"),
        }
    }
}

impl std::fmt::Debug for MetricsSubscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsSubscriber").finish_non_exhaustive()
    }
}
