//! Application configuration loading and validation.
//!
//! [`Config`] aggregates the service settings. Guard limits and endpoint
//! routes live in their own files, referenced from `[guard]`.
//!
//! # Example
//!
//! ```no_run
//! use tradewarden::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;

use super::logging::LoggingConfig;
use crate::application::metrics::DEFAULT_STARTING_CASH;
use crate::application::persistence::RetryPolicy;
use crate::error::{ConfigError, Result};

/// Locations of the guard policy files.
#[derive(Debug, Clone, Deserialize)]
pub struct GuardFiles {
    #[serde(default = "default_rate_limits_path")]
    pub rate_limits: PathBuf,
    #[serde(default = "default_endpoint_map_path")]
    pub endpoint_map: PathBuf,
}

fn default_rate_limits_path() -> PathBuf {
    PathBuf::from("config/rate_limits.toml")
}

fn default_endpoint_map_path() -> PathBuf {
    PathBuf::from("config/endpoint_map.toml")
}

impl Default for GuardFiles {
    fn default() -> Self {
        Self {
            rate_limits: default_rate_limits_path(),
            endpoint_map: default_endpoint_map_path(),
        }
    }
}

/// Prometheus scrape endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ExporterConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_bind")]
    pub bind: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_true() -> bool {
    true
}

fn default_bind() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

const fn default_port() -> u16 {
    8000
}

impl ExporterConfig {
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: default_bind(),
            port: default_port(),
        }
    }
}

/// Metrics aggregation, history persistence and export.
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// SQLite file for the metrics history.
    #[serde(default = "default_database_path")]
    pub database: PathBuf,
    #[serde(default = "default_persist_interval_secs")]
    pub persist_interval_secs: f64,
    /// Cash the equity curve starts from.
    #[serde(default = "default_starting_cash")]
    pub starting_cash: f64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
    #[serde(default)]
    pub exporter: ExporterConfig,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("data/metrics.db")
}

const fn default_persist_interval_secs() -> f64 {
    5.0
}

const fn default_starting_cash() -> f64 {
    DEFAULT_STARTING_CASH
}

const fn default_retry_attempts() -> u32 {
    3
}

const fn default_retry_backoff_ms() -> u64 {
    200
}

impl TelemetryConfig {
    #[must_use]
    pub fn persist_interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.persist_interval_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_persist_interval_secs()))
    }

    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry_attempts,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            database: default_database_path(),
            persist_interval_secs: default_persist_interval_secs(),
            starting_cash: default_starting_cash(),
            retry_attempts: default_retry_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
            exporter: ExporterConfig::default(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub guard: GuardFiles,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Load configuration, falling back to defaults when the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file is malformed or invalid.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parse configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or fails validation.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    fn validate(&self) -> Result<()> {
        let telemetry = &self.telemetry;
        if !telemetry.persist_interval_secs.is_finite() || telemetry.persist_interval_secs <= 0.0
        {
            return Err(ConfigError::InvalidValue {
                field: "persist_interval_secs",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if telemetry.retry_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "retry_attempts",
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        if !telemetry.starting_cash.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "starting_cash",
                reason: "must be a finite number".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Initialize the tracing subscriber based on logging configuration.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
