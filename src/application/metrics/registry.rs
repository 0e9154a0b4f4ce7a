//! Process-wide runtime metrics.
//!
//! One lock guards the whole aggregate so a snapshot is a single consistent
//! point in time across counters, latency rings, and equity curves.

use std::collections::{BTreeSet, HashMap, VecDeque};

use parking_lot::Mutex;

use crate::domain::{
    epoch_seconds, CallLabels, CallStatus, EndpointKey, EquityPoint, Fill, LatencySummary,
    MetricsSnapshot, OrderKey, RequestKey, Side,
};

/// Starting balance of the simulated ledger.
pub const DEFAULT_STARTING_CASH: f64 = 10_000.0;

pub const GLOBAL_LATENCY_CAP: usize = 500;
pub const EXCHANGE_LATENCY_CAP: usize = 300;
pub const ENDPOINT_LATENCY_CAP: usize = 200;
pub const EQUITY_CURVE_CAP: usize = 10_000;

fn push_bounded<T>(ring: &mut VecDeque<T>, value: T, cap: usize) {
    if ring.len() >= cap {
        ring.pop_front();
    }
    ring.push_back(value);
}

#[derive(Debug)]
struct State {
    events_total: HashMap<String, u64>,
    orders_total: HashMap<OrderKey, u64>,
    rate_drops: HashMap<EndpointKey, u64>,
    circuit_open: HashMap<EndpointKey, bool>,
    requests_total: HashMap<RequestKey, u64>,
    http_requests: u64,
    retries: u64,
    reconnects: u64,

    latency: VecDeque<f64>,
    latency_per_exchange: HashMap<String, VecDeque<f64>>,
    latency_per_endpoint: HashMap<EndpointKey, VecDeque<f64>>,

    equity_curve: VecDeque<EquityPoint>,
    equity_curve_per_bot: HashMap<String, VecDeque<EquityPoint>>,
    equity_curve_per_strategy: HashMap<String, VecDeque<EquityPoint>>,
    cash: f64,
    positions: HashMap<String, f64>,
    last_price: HashMap<String, f64>,

    exchanges: BTreeSet<String>,
    bots: BTreeSet<String>,
    strategies: BTreeSet<String>,
}

impl State {
    fn new(starting_cash: f64) -> Self {
        Self {
            events_total: HashMap::new(),
            orders_total: HashMap::new(),
            rate_drops: HashMap::new(),
            circuit_open: HashMap::new(),
            requests_total: HashMap::new(),
            http_requests: 0,
            retries: 0,
            reconnects: 0,
            latency: VecDeque::with_capacity(GLOBAL_LATENCY_CAP),
            latency_per_exchange: HashMap::new(),
            latency_per_endpoint: HashMap::new(),
            equity_curve: VecDeque::new(),
            equity_curve_per_bot: HashMap::new(),
            equity_curve_per_strategy: HashMap::new(),
            cash: starting_cash,
            positions: HashMap::new(),
            last_price: HashMap::new(),
            exchanges: BTreeSet::new(),
            bots: BTreeSet::new(),
            strategies: BTreeSet::new(),
        }
    }

    fn push_latency(&mut self, latency_ms: f64, exchange: Option<&str>, endpoint: Option<&str>) {
        self.http_requests += 1;
        push_bounded(&mut self.latency, latency_ms, GLOBAL_LATENCY_CAP);
        if let Some(exchange) = exchange {
            let ring = self
                .latency_per_exchange
                .entry(exchange.to_string())
                .or_default();
            push_bounded(ring, latency_ms, EXCHANGE_LATENCY_CAP);
            if let Some(endpoint) = endpoint {
                let ring = self
                    .latency_per_endpoint
                    .entry(EndpointKey::new(exchange, endpoint))
                    .or_default();
                push_bounded(ring, latency_ms, ENDPOINT_LATENCY_CAP);
            }
        }
    }

    fn equity(&self) -> f64 {
        let held: f64 = self
            .positions
            .iter()
            .map(|(symbol, qty)| qty * self.last_price.get(symbol).copied().unwrap_or(0.0))
            .sum();
        self.cash + held
    }

    fn push_equity(&mut self, bot: Option<&str>, strategy: Option<&str>) {
        let point = EquityPoint {
            ts: epoch_seconds(),
            value: self.equity(),
        };
        push_bounded(&mut self.equity_curve, point, EQUITY_CURVE_CAP);
        if let Some(bot) = bot {
            let curve = self.equity_curve_per_bot.entry(bot.to_string()).or_default();
            push_bounded(curve, point, EQUITY_CURVE_CAP);
        }
        if let Some(strategy) = strategy {
            let curve = self
                .equity_curve_per_strategy
                .entry(strategy.to_string())
                .or_default();
            push_bounded(curve, point, EQUITY_CURVE_CAP);
        }
    }
}

fn or_default_label(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

/// Lock-protected aggregate of counters, latency samples, and a simulated
/// mark-to-market equity ledger.
///
/// Construct one per process and share it behind an `Arc`.
#[derive(Debug)]
pub struct MetricsRegistry {
    starting_cash: f64,
    state: Mutex<State>,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::with_starting_cash(DEFAULT_STARTING_CASH)
    }

    #[must_use]
    pub fn with_starting_cash(starting_cash: f64) -> Self {
        Self {
            starting_cash,
            state: Mutex::new(State::new(starting_cash)),
        }
    }

    #[must_use]
    pub const fn starting_cash(&self) -> f64 {
        self.starting_cash
    }

    /// Restore the initial state.
    pub fn clear(&self) {
        *self.state.lock() = State::new(self.starting_cash);
    }

    /// Record one request latency. Per-exchange and per-endpoint rings are
    /// only fed when the labels are known.
    pub fn record_http(&self, latency_ms: f64, exchange: Option<&str>, endpoint: Option<&str>) {
        self.state.lock().push_latency(latency_ms, exchange, endpoint);
    }

    pub fn record_rate_drop(&self, exchange: &str, endpoint: &str) {
        let mut state = self.state.lock();
        *state
            .rate_drops
            .entry(EndpointKey::new(exchange, endpoint))
            .or_insert(0) += 1;
    }

    /// Count an order. Empty labels are recorded as `na` / `NA`.
    pub fn record_order(&self, exchange: &str, symbol: &str, side: &str) {
        let key = OrderKey {
            exchange: or_default_label(exchange, "na"),
            symbol: or_default_label(symbol, "NA"),
            side: or_default_label(side, "NA"),
        };
        *self.state.lock().orders_total.entry(key).or_insert(0) += 1;
    }

    /// Count an event by name. Names starting with `retry` or `reconnect`
    /// (any case) also bump the dedicated counters.
    pub fn record_event(&self, event: &str) {
        let lower = event.to_lowercase();
        let mut state = self.state.lock();
        *state.events_total.entry(event.to_string()).or_insert(0) += 1;
        if lower.starts_with("reconnect") {
            state.reconnects += 1;
        }
        if lower.starts_with("retry") {
            state.retries += 1;
        }
    }

    pub fn set_circuit(&self, exchange: &str, endpoint: &str, open: bool) {
        self.state
            .lock()
            .circuit_open
            .insert(EndpointKey::new(exchange, endpoint), open);
    }

    /// Record a finished guarded call in one step: latency, status counter,
    /// and the breaker gauge.
    pub fn record_attempt(
        &self,
        labels: &CallLabels,
        latency_ms: f64,
        status: CallStatus,
        circuit_open: bool,
    ) {
        let request = RequestKey {
            exchange: labels.exchange.clone(),
            method: labels.method.clone(),
            endpoint: labels.endpoint.clone(),
            status,
        };
        let gauge = EndpointKey::new(&labels.exchange, &labels.endpoint);

        let mut state = self.state.lock();
        state.push_latency(latency_ms, Some(&labels.exchange), Some(&labels.endpoint));
        *state.requests_total.entry(request).or_insert(0) += 1;
        state.circuit_open.insert(gauge, circuit_open);
    }

    /// Apply a fill to the simulated ledger and append an equity point.
    ///
    /// Tagged fills also append the same value to their bot and strategy
    /// curves.
    pub fn record_fill(&self, fill: &Fill) {
        let bot = fill.bot_id.as_deref().filter(|b| !b.is_empty());
        let strategy = fill.strategy.as_deref().filter(|s| !s.is_empty());

        let mut state = self.state.lock();
        if !fill.exchange.is_empty() {
            state.exchanges.insert(fill.exchange.to_lowercase());
        }
        if let Some(bot) = bot {
            state.bots.insert(bot.to_string());
        }
        if let Some(strategy) = strategy {
            state.strategies.insert(strategy.to_string());
        }

        state.cash += fill.cash_delta();
        *state.positions.entry(fill.symbol.clone()).or_insert(0.0) += fill.qty_delta();
        state.last_price.insert(fill.symbol.clone(), fill.price);
        state.push_equity(bot, strategy);
    }

    /// Convenience form of [`Self::record_fill`] taking a side label.
    #[allow(clippy::too_many_arguments)]
    pub fn record_fill_parts(
        &self,
        exchange: &str,
        symbol: &str,
        side: &str,
        price: f64,
        qty: f64,
        bot_id: Option<&str>,
        strategy: Option<&str>,
    ) {
        let mut fill = Fill::new(exchange, symbol, Side::from_label(side), price, qty);
        fill.bot_id = bot_id.map(str::to_string);
        fill.strategy = strategy.map(str::to_string);
        self.record_fill(&fill);
    }

    /// Revalue holdings at a new price. Appends to the global curve only.
    pub fn mark_price(&self, symbol: &str, price: f64) {
        let mut state = self.state.lock();
        state.last_price.insert(symbol.to_string(), price);
        state.push_equity(None, None);
    }

    /// Copy every metric family under the lock.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let state = self.state.lock();
        MetricsSnapshot {
            events_total: state.events_total.clone(),
            orders_total: state.orders_total.clone(),
            rate_drops: state.rate_drops.clone(),
            circuit_open: state.circuit_open.clone(),
            requests_total: state.requests_total.clone(),
            http_requests: state.http_requests,
            retries: state.retries,
            reconnects: state.reconnects,
            http_latency_ms: state.latency.iter().copied().collect(),
            latency: LatencySummary::from_samples(&state.latency),
            latency_per_exchange: state
                .latency_per_exchange
                .iter()
                .map(|(k, ring)| (k.clone(), LatencySummary::from_samples(ring)))
                .collect(),
            latency_per_endpoint: state
                .latency_per_endpoint
                .iter()
                .map(|(k, ring)| (k.clone(), LatencySummary::from_samples(ring)))
                .collect(),
            equity_curve: state.equity_curve.iter().copied().collect(),
            equity_curve_per_bot: state
                .equity_curve_per_bot
                .iter()
                .map(|(k, curve)| (k.clone(), curve.iter().copied().collect()))
                .collect(),
            equity_curve_per_strategy: state
                .equity_curve_per_strategy
                .iter()
                .map(|(k, curve)| (k.clone(), curve.iter().copied().collect()))
                .collect(),
            cash: state.cash,
            positions: state.positions.clone(),
            last_price: state.last_price.clone(),
            exchanges: state.exchanges.clone(),
            bots: state.bots.clone(),
            strategies: state.strategies.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> CallLabels {
        CallLabels {
            exchange: "binance".into(),
            method: "REST".into(),
            endpoint: "/api/v3/order".into(),
        }
    }

    #[test]
    fn fill_then_mark_revalues_position() {
        let metrics = MetricsRegistry::with_starting_cash(0.0);
        metrics.record_fill(
            &Fill::new("binance", "BTCUSDT", Side::Buy, 30000.0, 0.001)
                .with_bot("bot-1")
                .with_strategy("strat-1"),
        );
        metrics.mark_price("BTCUSDT", 30500.0);

        let snap = metrics.snapshot();
        assert_eq!(snap.equity_curve.len(), 2);
        let expected = (-30000.0 * 0.001) + 0.001 * 30500.0;
        assert!((snap.equity().unwrap() - expected).abs() < 1e-9);
        assert_eq!(snap.equity_curve_per_bot["bot-1"].len(), 1);
        assert_eq!(snap.equity_curve_per_strategy["strat-1"].len(), 1);
    }

    #[test]
    fn default_ledger_starts_with_cash() {
        let metrics = MetricsRegistry::new();
        metrics.record_fill(&Fill::new("Binance", "BTCUSDT", Side::Buy, 30000.0, 0.001));
        metrics.mark_price("BTCUSDT", 30500.0);

        let snap = metrics.snapshot();
        assert!((snap.equity().unwrap() - 10_000.5).abs() < 1e-9);
        assert!(snap.equity_curve_per_bot.is_empty());
        assert!(snap.equity_curve_per_strategy.is_empty());
        assert!(snap.exchanges.contains("binance"));
    }

    #[test]
    fn sell_adds_cash_and_shorts() {
        let metrics = MetricsRegistry::with_starting_cash(100.0);
        metrics.record_fill(&Fill::new("kraken", "ETHUSD", Side::Sell, 2000.0, 0.5));
        let snap = metrics.snapshot();
        assert_eq!(snap.cash, 1100.0);
        assert_eq!(snap.positions["ETHUSD"], -0.5);
        assert_eq!(snap.equity(), Some(100.0));
    }

    #[test]
    fn latency_rings_are_bounded() {
        let metrics = MetricsRegistry::new();
        for i in 0..(GLOBAL_LATENCY_CAP + 50) {
            metrics.record_http(i as f64, Some("binance"), Some("/x"));
        }
        let snap = metrics.snapshot();
        assert_eq!(snap.http_requests, (GLOBAL_LATENCY_CAP + 50) as u64);
        assert_eq!(snap.http_latency_ms.len(), GLOBAL_LATENCY_CAP);
        assert_eq!(snap.http_latency_ms[0], 50.0);
        assert_eq!(snap.latency_per_exchange["binance"].count, EXCHANGE_LATENCY_CAP);
        assert_eq!(
            snap.latency_per_endpoint[&EndpointKey::new("binance", "/x")].count,
            ENDPOINT_LATENCY_CAP
        );
        assert_eq!(snap.latency.latest, (GLOBAL_LATENCY_CAP + 49) as f64);
    }

    #[test]
    fn unlabelled_latency_feeds_global_ring_only() {
        let metrics = MetricsRegistry::new();
        metrics.record_http(12.0, None, None);
        metrics.record_http(14.0, Some("okx"), None);
        let snap = metrics.snapshot();
        assert_eq!(snap.latency.count, 2);
        assert_eq!(snap.latency_per_exchange.len(), 1);
        assert!(snap.latency_per_endpoint.is_empty());
    }

    #[test]
    fn retry_and_reconnect_prefixes_count() {
        let metrics = MetricsRegistry::new();
        metrics.record_event("Retry");
        metrics.record_event("RETRY_later");
        metrics.record_event("ReconnectAttempt");
        metrics.record_event("TradeFilled");
        let snap = metrics.snapshot();
        assert_eq!(snap.retries, 2);
        assert_eq!(snap.reconnects, 1);
        assert_eq!(snap.events_total["TradeFilled"], 1);
        assert_eq!(snap.events_total.len(), 4);
    }

    #[test]
    fn empty_order_labels_use_placeholders() {
        let metrics = MetricsRegistry::new();
        metrics.record_order("", "", "");
        metrics.record_order("binance", "BTCUSDT", "buy");
        let snap = metrics.snapshot();
        let placeholder = OrderKey {
            exchange: "na".into(),
            symbol: "NA".into(),
            side: "NA".into(),
        };
        assert_eq!(snap.orders_total[&placeholder], 1);
        assert_eq!(snap.orders("binance", "BTCUSDT", Side::Buy), 1);
    }

    #[test]
    fn record_attempt_updates_all_families() {
        let metrics = MetricsRegistry::new();
        metrics.record_attempt(&labels(), 5.0, CallStatus::Ok, false);
        metrics.record_attempt(&labels(), 7.0, CallStatus::Err, true);
        let snap = metrics.snapshot();
        assert_eq!(snap.http_requests, 2);
        assert_eq!(snap.requests("binance", "/api/v3/order", CallStatus::Ok), 1);
        assert_eq!(snap.requests("binance", "/api/v3/order", CallStatus::Err), 1);
        assert!(snap.circuit_open[&EndpointKey::new("binance", "/api/v3/order")]);
        assert_eq!(snap.latency.latest, 7.0);
    }

    #[test]
    fn clear_restores_initial_state() {
        let metrics = MetricsRegistry::with_starting_cash(50.0);
        metrics.record_fill(&Fill::new("binance", "BTCUSDT", Side::Buy, 10.0, 1.0));
        metrics.record_rate_drop("binance", "/x");
        metrics.clear();
        let snap = metrics.snapshot();
        assert_eq!(snap.cash, 50.0);
        assert!(snap.equity_curve.is_empty());
        assert!(snap.rate_drops.is_empty());
        assert!(snap.exchanges.is_empty());
    }

    #[test]
    fn fill_parts_parses_side() {
        let metrics = MetricsRegistry::with_starting_cash(0.0);
        metrics.record_fill_parts("binance", "BTCUSDT", "BUY", 10.0, 2.0, Some("b"), None);
        let snap = metrics.snapshot();
        assert_eq!(snap.cash, -20.0);
        assert!(snap.bots.contains("b"));
        assert!(snap.strategies.is_empty());
    }
}
