//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.

use std::time::Duration;

use crate::application::persistence::RetryPolicy;
use crate::domain::GuardSettings;
use crate::infrastructure::config::settings::TelemetryConfig;

/// Three attempts with a 1ms backoff step.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        attempts: 3,
        backoff: Duration::from_millis(1),
    }
}

/// Telemetry with the exporter off, a fast tick and fast retries.
pub fn quiet_telemetry() -> TelemetryConfig {
    let mut settings = TelemetryConfig::default();
    settings.exporter.enabled = false;
    settings.persist_interval_secs = 0.01;
    settings.retry_backoff_ms = 1;
    settings
}

/// Guard settings with explicit limits.
pub fn limits(
    rate_per_sec: f64,
    capacity: f64,
    failure_threshold: u32,
    recovery_time: Duration,
) -> GuardSettings {
    GuardSettings {
        rate_per_sec,
        capacity,
        failure_threshold,
        recovery_time,
    }
}
