//! Guard keys: the identity that selects a rate limiter and circuit breaker.
//!
//! A key is written as `exchange:channel:endpoint` (for example
//! `binance:rest:/api/v3/order`) or `exchange:operation` (for example
//! `exchange:get_balance`). Keys are case-insensitive and stored lower-cased.

use std::fmt;

/// Exchange segment that is replaced by the calling client's namespace.
pub const NAMESPACE_PLACEHOLDER: &str = "exchange";

/// What a guard key points at below the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyTarget {
    /// A literal endpoint on a transport channel (`rest`, `ws`, ...).
    Endpoint { channel: String, path: String },
    /// A named client operation, mapped to an endpoint by configuration.
    Operation(String),
}

/// Identity of one rate limiter + circuit breaker pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GuardKey {
    exchange: String,
    target: KeyTarget,
}

impl GuardKey {
    /// Parse a key string. Never fails: anything after the second `:` is the endpoint.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let lower = raw.trim().to_lowercase();
        let mut parts = lower.splitn(3, ':');
        let exchange = parts.next().unwrap_or_default().to_string();
        let second = parts.next();
        let third = parts.next();

        let target = match (second, third) {
            (Some(channel), Some(path)) => KeyTarget::Endpoint {
                channel: channel.to_string(),
                path: path.to_string(),
            },
            (Some(operation), None) => KeyTarget::Operation(operation.to_string()),
            _ => KeyTarget::Operation(String::new()),
        };

        Self { exchange, target }
    }

    #[must_use]
    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    #[must_use]
    pub const fn target(&self) -> &KeyTarget {
        &self.target
    }

    /// Literal endpoint path, when the key embeds one.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match &self.target {
            KeyTarget::Endpoint { path, .. } => Some(path),
            KeyTarget::Operation(_) => None,
        }
    }

    /// True when the exchange segment awaits a client namespace.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.exchange == NAMESPACE_PLACEHOLDER
    }

    /// Re-prefix a placeholder key with a client namespace.
    ///
    /// Keys that already name a concrete exchange are returned unchanged, as
    /// are empty namespaces.
    #[must_use]
    pub fn with_namespace(&self, namespace: &str) -> Self {
        let namespace = namespace.trim();
        if !self.is_placeholder() || namespace.is_empty() {
            return self.clone();
        }
        Self {
            exchange: namespace.to_lowercase(),
            target: self.target.clone(),
        }
    }
}

impl fmt::Display for GuardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            KeyTarget::Endpoint { channel, path } => {
                write!(f, "{}:{}:{}", self.exchange, channel, path)
            }
            KeyTarget::Operation(op) if op.is_empty() => write!(f, "{}", self.exchange),
            KeyTarget::Operation(op) => write!(f, "{}:{}", self.exchange, op),
        }
    }
}

impl From<&str> for GuardKey {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

/// Metric label for a transport channel.
#[must_use]
pub fn channel_method(channel: &str) -> String {
    if channel.contains("rest") {
        "REST".to_string()
    } else if channel.contains("ws") {
        "WS".to_string()
    } else {
        channel.to_uppercase()
    }
}

/// Labels attached to every metric emitted for a guarded call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallLabels {
    pub exchange: String,
    pub method: String,
    pub endpoint: String,
}
