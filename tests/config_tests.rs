//! Configuration files on disk and their effect on guards.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tradewarden::application::guard::GuardRegistry;
use tradewarden::domain::{GuardKey, GuardSettings};
use tradewarden::error::{ConfigError, Error};
use tradewarden::infrastructure::config::endpoints::EndpointMap;
use tradewarden::infrastructure::config::limits::RateLimitsConfig;
use tradewarden::infrastructure::config::settings::Config;

const LIMITS: &str = r#"
[exchanges.binance.default]
rate_per_sec = 10
capacity = 20
failure_threshold = 3
recovery_time = 15.0

[[exchanges.binance.patterns]]
path = "/api/v3/order"
rate_per_sec = 2
capacity = 2
"#;

const ROUTES: &str = r#"
[exchanges.binance.get_balance]
method = "get"
path = "/api/v3/account"

[exchanges.Binance.cancelOrder]
method = "delete"
path = "/api/v3/order"
"#;

#[test]
fn config_files_shape_guard_settings_and_labels() {
    let dir = tempfile::tempdir().unwrap();
    let limits_path = dir.path().join("rate_limits.toml");
    let routes_path = dir.path().join("endpoint_map.toml");
    fs::write(&limits_path, LIMITS).unwrap();
    fs::write(&routes_path, ROUTES).unwrap();

    let registry = GuardRegistry::new(
        Arc::new(RateLimitsConfig::load(&limits_path).unwrap()),
        Arc::new(EndpointMap::load(&routes_path).unwrap()),
    );

    let order = registry.get_or_create(&GuardKey::parse("binance:rest:/api/v3/order"));
    assert_eq!(order.settings().rate_per_sec, 2.0);
    assert_eq!(order.settings().capacity, 2.0);
    assert_eq!(order.settings().failure_threshold, 3);
    assert_eq!(order.settings().recovery_time, Duration::from_secs(15));

    let depth = registry.get_or_create(&GuardKey::parse("binance:rest:/api/v3/depth"));
    assert_eq!(depth.settings().capacity, 20.0);

    let balance = registry.get_or_create(&GuardKey::parse("binance:get_balance"));
    assert_eq!(balance.labels().method, "GET");
    assert_eq!(balance.labels().endpoint, "/api/v3/account");

    let cancel = registry.get_or_create(&GuardKey::parse("binance:cancelOrder"));
    assert_eq!(cancel.labels().method, "DELETE");
    assert_eq!(cancel.labels().endpoint, "/api/v3/order");
}

#[test]
fn unreadable_limits_fall_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("rate_limits.toml");
    fs::write(&broken, "[exchanges.binance.default\nrate_per_sec = ").unwrap();

    let config = RateLimitsConfig::load_or_default(&broken);
    let settings = config.resolve(&GuardKey::parse("binance:rest:/api/v3/order"));
    assert_eq!(settings, GuardSettings::default());
}

#[test]
fn out_of_range_limit_falls_back_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("rate_limits.toml");
    fs::write(&broken, "[exchanges.binance.default]\nrate_per_sec = -1\n").unwrap();

    let config = RateLimitsConfig::load_or_default(&broken);
    let settings = config.resolve(&GuardKey::parse("binance:rest:/api/v3/order"));
    assert_eq!(settings, GuardSettings::default());
    assert_eq!(settings.rate_per_sec, 10.0);
    assert_eq!(settings.capacity, 10.0);
    assert_eq!(settings.failure_threshold, 5);
    assert_eq!(settings.recovery_time, Duration::from_secs(30));
}

#[test]
fn main_config_rejects_invalid_values_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[telemetry]\npersist_interval_secs = -5\n").unwrap();

    let err = Config::load(&path).unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::InvalidValue {
            field: "persist_interval_secs",
            ..
        })
    ));
}

#[test]
fn main_config_reports_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[telemetry\n").unwrap();

    assert!(matches!(
        Config::load(&path).unwrap_err(),
        Error::Config(ConfigError::Parse(_))
    ));
}
