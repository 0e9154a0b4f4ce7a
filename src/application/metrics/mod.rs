//! Runtime metrics aggregation and its event-bus feed.

pub mod handlers;
pub mod registry;

pub use handlers::MetricsSubscriber;
pub use registry::{
    MetricsRegistry, DEFAULT_STARTING_CASH, ENDPOINT_LATENCY_CAP, EQUITY_CURVE_CAP,
    EXCHANGE_LATENCY_CAP, GLOBAL_LATENCY_CAP,
};
