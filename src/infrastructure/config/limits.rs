//! Per-exchange rate limit and circuit breaker settings.
//!
//! Loaded from a TOML file shaped like:
//!
//! ```toml
//! [exchanges.binance.default]
//! rate_per_sec = 10
//! capacity = 20
//! failure_threshold = 5
//! recovery_time = 30.0
//!
//! [[exchanges.binance.patterns]]
//! path = "/api/v3/order"
//! rate_per_sec = 2
//! capacity = 2
//! ```
//!
//! The first pattern whose `path` equals the key's endpoint overrides rate
//! and capacity only.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{
    GuardKey, GuardSettings, DEFAULT_FAILURE_THRESHOLD, DEFAULT_RATE_PER_SEC, DEFAULT_RECOVERY_TIME,
};
use crate::error::{ConfigError, Result};
use crate::port::LimitSource;

/// Exchange-wide defaults. Unset fields fall back to the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitDefaults {
    pub rate_per_sec: Option<f64>,
    pub capacity: Option<f64>,
    pub failure_threshold: Option<u32>,
    /// Seconds.
    pub recovery_time: Option<f64>,
}

/// Endpoint-specific override.
#[derive(Debug, Clone, Deserialize)]
pub struct PatternOverride {
    pub path: String,
    pub rate_per_sec: Option<f64>,
    pub capacity: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExchangeLimits {
    #[serde(default)]
    pub default: LimitDefaults,
    #[serde(default)]
    pub patterns: Vec<PatternOverride>,
}

/// All configured exchanges, keyed by lower-cased exchange name.
#[derive(Debug, Clone, Default)]
pub struct RateLimitsConfig {
    pub exchanges: HashMap<String, ExchangeLimits>,
}

/// File layout before exchange names are folded to lower case.
#[derive(Debug, Deserialize)]
struct LimitsFile {
    #[serde(default)]
    exchanges: BTreeMap<String, ExchangeLimits>,
}

fn positive(value: Option<f64>, exchange: &str, field: &'static str) -> Option<f64> {
    match value {
        Some(v) if !(v.is_finite() && v > 0.0) => {
            warn!(exchange, field, value = v, "Ignoring out-of-range limit, using default");
            None
        }
        other => other,
    }
}

impl LimitDefaults {
    /// Drop out-of-range fields so they fall back to built-in defaults.
    fn sanitized(self, exchange: &str) -> Self {
        let failure_threshold = match self.failure_threshold {
            Some(0) => {
                warn!(exchange, field = "failure_threshold", "Ignoring zero threshold, using default");
                None
            }
            other => other,
        };
        let recovery_time = match self.recovery_time {
            Some(secs) if !(secs.is_finite() && secs >= 0.0) => {
                warn!(exchange, field = "recovery_time", value = secs, "Ignoring out-of-range limit, using default");
                None
            }
            other => other,
        };
        Self {
            rate_per_sec: positive(self.rate_per_sec, exchange, "rate_per_sec"),
            capacity: positive(self.capacity, exchange, "capacity"),
            failure_threshold,
            recovery_time,
        }
    }

    /// Fields set in `other` replace ours.
    fn merge(&mut self, other: Self) {
        self.rate_per_sec = other.rate_per_sec.or(self.rate_per_sec);
        self.capacity = other.capacity.or(self.capacity);
        self.failure_threshold = other.failure_threshold.or(self.failure_threshold);
        self.recovery_time = other.recovery_time.or(self.recovery_time);
    }
}

impl PatternOverride {
    fn sanitized(self, exchange: &str) -> Self {
        Self {
            rate_per_sec: positive(self.rate_per_sec, exchange, "patterns.rate_per_sec"),
            capacity: positive(self.capacity, exchange, "patterns.capacity"),
            path: self.path,
        }
    }
}

impl RateLimitsConfig {
    /// Parse TOML content.
    ///
    /// Sections whose exchange names differ only in case are merged in byte
    /// order of the names as written: later defaults replace earlier ones
    /// field by field, and patterns are appended. Out-of-range values are
    /// logged and replaced by the built-in default for that field only.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let raw: LimitsFile = toml::from_str(content).map_err(ConfigError::Parse)?;
        let mut config = Self::default();
        for (name, limits) in raw.exchanges {
            let merged = config.exchanges.entry(name.to_lowercase()).or_default();
            merged.default.merge(limits.default.sanitized(&name));
            merged
                .patterns
                .extend(limits.patterns.into_iter().map(|p| p.sanitized(&name)));
        }
        Ok(config)
    }

    /// Load from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or fails [`Self::parse_toml`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Load from a file, substituting built-in defaults on any error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => {
                debug!(path = %path.display(), exchanges = config.exchanges.len(), "Loaded rate limits");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Rate limits unavailable, using defaults");
                Self::default()
            }
        }
    }

    /// Resolve settings for a key: exchange defaults, then the first matching
    /// endpoint pattern.
    #[must_use]
    pub fn resolve(&self, key: &GuardKey) -> GuardSettings {
        let Some(limits) = self.exchanges.get(key.exchange()) else {
            return GuardSettings::default();
        };
        let d = &limits.default;

        let mut rate = d.rate_per_sec.unwrap_or(DEFAULT_RATE_PER_SEC);
        let mut capacity = d.capacity.unwrap_or(rate);

        if let Some(path) = key.path() {
            let matched = limits
                .patterns
                .iter()
                .find(|p| p.path.eq_ignore_ascii_case(path));
            if let Some(pattern) = matched {
                if let Some(r) = pattern.rate_per_sec {
                    rate = r;
                }
                capacity = pattern.capacity.or(d.capacity).unwrap_or(rate);
            }
        }

        GuardSettings {
            rate_per_sec: rate,
            capacity,
            failure_threshold: d.failure_threshold.unwrap_or(DEFAULT_FAILURE_THRESHOLD),
            recovery_time: d
                .recovery_time
                .map_or(DEFAULT_RECOVERY_TIME, Duration::from_secs_f64),
        }
    }

    /// Set exchange defaults in code, replacing any previous defaults.
    pub fn set_defaults(&mut self, exchange: &str, defaults: LimitDefaults) {
        self.exchanges
            .entry(exchange.to_lowercase())
            .or_default()
            .default = defaults;
    }

    /// Append an endpoint pattern in code.
    pub fn add_pattern(&mut self, exchange: &str, pattern: PatternOverride) {
        self.exchanges
            .entry(exchange.to_lowercase())
            .or_default()
            .patterns
            .push(pattern);
    }
}

impl LimitSource for RateLimitsConfig {
    fn limits_for(&self, key: &GuardKey) -> GuardSettings {
        self.resolve(key)
    }
}
