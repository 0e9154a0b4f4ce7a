//! Point-in-time view of the runtime metrics registry.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use chrono::Utc;

use super::latency::LatencySummary;
use super::trade::Side;

/// `(exchange, endpoint)` label pair for rate-drop and circuit metrics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointKey {
    pub exchange: String,
    pub endpoint: String,
}

impl EndpointKey {
    pub fn new(exchange: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            endpoint: endpoint.into(),
        }
    }
}

/// `(exchange, symbol, side)` label triple for order counters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderKey {
    pub exchange: String,
    pub symbol: String,
    pub side: String,
}

/// Outcome label of an attempted call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CallStatus {
    Ok,
    Err,
}

impl CallStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Err => "ERR",
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(exchange, method, endpoint, status)` label set for request counters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestKey {
    pub exchange: String,
    pub method: String,
    pub endpoint: String,
    pub status: CallStatus,
}

/// Current wall-clock time as fractional seconds since the Unix epoch.
#[must_use]
pub fn epoch_seconds() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// One point of a simulated equity curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquityPoint {
    /// Seconds since the Unix epoch.
    pub ts: f64,
    pub value: f64,
}

/// Consistent copy of every metric family, taken under one lock.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub events_total: HashMap<String, u64>,
    pub orders_total: HashMap<OrderKey, u64>,
    pub rate_drops: HashMap<EndpointKey, u64>,
    pub circuit_open: HashMap<EndpointKey, bool>,
    pub requests_total: HashMap<RequestKey, u64>,
    pub http_requests: u64,
    pub retries: u64,
    pub reconnects: u64,

    /// Raw global latency samples in recording order.
    pub http_latency_ms: Vec<f64>,
    pub latency: LatencySummary,
    pub latency_per_exchange: HashMap<String, LatencySummary>,
    pub latency_per_endpoint: HashMap<EndpointKey, LatencySummary>,

    pub equity_curve: Vec<EquityPoint>,
    pub equity_curve_per_bot: HashMap<String, Vec<EquityPoint>>,
    pub equity_curve_per_strategy: HashMap<String, Vec<EquityPoint>>,
    pub cash: f64,
    pub positions: HashMap<String, f64>,
    pub last_price: HashMap<String, f64>,

    pub exchanges: BTreeSet<String>,
    pub bots: BTreeSet<String>,
    pub strategies: BTreeSet<String>,
}

impl MetricsSnapshot {
    /// Latest global equity value, if any point exists.
    #[must_use]
    pub fn equity(&self) -> Option<f64> {
        self.equity_curve.last().map(|p| p.value)
    }

    /// Request count for one label set.
    #[must_use]
    pub fn requests(&self, exchange: &str, endpoint: &str, status: CallStatus) -> u64 {
        self.requests_total
            .iter()
            .filter(|(k, _)| k.exchange == exchange && k.endpoint == endpoint && k.status == status)
            .map(|(_, v)| *v)
            .sum()
    }

    /// Order count for one `(exchange, symbol, side)`.
    #[must_use]
    pub fn orders(&self, exchange: &str, symbol: &str, side: Side) -> u64 {
        self.orders_total
            .iter()
            .filter(|(k, _)| k.exchange == exchange && k.symbol == symbol && k.side == side.as_str())
            .map(|(_, v)| *v)
            .sum()
    }
}
