//! Guard configuration lookups.

use std::collections::HashMap;

use crate::domain::{EndpointRoute, GuardKey, GuardSettings};

/// Resolves rate limit and breaker settings for a key on first use.
pub trait LimitSource: Send + Sync {
    fn limits_for(&self, key: &GuardKey) -> GuardSettings;
}

/// Uniform settings for every key.
impl LimitSource for GuardSettings {
    fn limits_for(&self, _key: &GuardKey) -> GuardSettings {
        *self
    }
}

/// Maps `(exchange, operation)` to the endpoint it calls, for metric labels.
pub trait RouteSource: Send + Sync {
    fn route(&self, exchange: &str, operation: &str) -> Option<EndpointRoute>;
}

/// Route source with no entries.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRoutes;

impl RouteSource for NoRoutes {
    fn route(&self, _exchange: &str, _operation: &str) -> Option<EndpointRoute> {
        None
    }
}

impl RouteSource for HashMap<(String, String), EndpointRoute> {
    fn route(&self, exchange: &str, operation: &str) -> Option<EndpointRoute> {
        self.get(&(exchange.to_string(), operation.to_string())).cloned()
    }
}
