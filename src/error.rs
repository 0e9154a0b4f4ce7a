use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),
}

/// Outcome of a guarded call that did not return a value.
///
/// `RateLimited` and `CircuitOpen` mean the wrapped call was never attempted.
/// `Call` carries the wrapped call's own error value, untouched.
#[derive(Error, Debug)]
pub enum GuardError<E> {
    #[error("rate_limited:{key}")]
    RateLimited { key: String },

    #[error("circuit_open:{key}")]
    CircuitOpen { key: String },

    #[error(transparent)]
    Call(E),
}

impl<E> GuardError<E> {
    /// True when the guard refused to attempt the call.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::CircuitOpen { .. })
    }

    /// Recover the wrapped call's error, if the call was attempted and failed.
    pub fn into_call_error(self) -> Option<E> {
        match self {
            Self::Call(e) => Some(e),
            _ => None,
        }
    }
}

/// Durable storage errors, split by whether a retry can help.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The database is locked or busy; the write may succeed later.
    #[error("storage busy: {0}")]
    Busy(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Busy(_))
    }

    /// Classify a raw storage message the way SQLite reports contention.
    #[must_use]
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_lowercase();
        if lower.contains("locked") || lower.contains("busy") {
            Self::Busy(message)
        } else {
            Self::Storage(message)
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("exporter error: {0}")]
    Exporter(String),
}

pub type Result<T> = std::result::Result<T, Error>;
