//! Resolved per-key guard settings and endpoint routes.

use std::time::Duration;

pub const DEFAULT_RATE_PER_SEC: f64 = 10.0;
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
pub const DEFAULT_RECOVERY_TIME: Duration = Duration::from_secs(30);

/// Settings for one rate limiter + circuit breaker pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuardSettings {
    /// Token refill rate per second.
    pub rate_per_sec: f64,
    /// Bucket size; also the initial token count.
    pub capacity: f64,
    /// Consecutive failures that open the breaker.
    pub failure_threshold: u32,
    /// How long an open breaker fails fast.
    pub recovery_time: Duration,
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            rate_per_sec: DEFAULT_RATE_PER_SEC,
            capacity: DEFAULT_RATE_PER_SEC,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            recovery_time: DEFAULT_RECOVERY_TIME,
        }
    }
}

/// HTTP method and path a named client operation maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRoute {
    pub method: String,
    pub path: String,
}
