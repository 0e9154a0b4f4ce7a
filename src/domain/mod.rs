//! Exchange-agnostic value types for guarding calls and describing telemetry.

pub mod key;
pub mod latency;
pub mod limits;
pub mod row;
pub mod snapshot;
pub mod trade;

pub use key::{channel_method, CallLabels, GuardKey, KeyTarget, NAMESPACE_PLACEHOLDER};
pub use latency::{interpolated_percentile, nearest_rank_percentile, LatencySummary};
pub use limits::{
    EndpointRoute, GuardSettings, DEFAULT_FAILURE_THRESHOLD, DEFAULT_RATE_PER_SEC,
    DEFAULT_RECOVERY_TIME,
};
pub use row::{BotEquityRow, EquityRow, LatencyRow, SnapshotRows, StrategyEquityRow};
pub use snapshot::{
    epoch_seconds, CallStatus, EndpointKey, EquityPoint, MetricsSnapshot, OrderKey, RequestKey,
};
pub use trade::{Fill, Side};
