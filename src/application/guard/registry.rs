//! Lazily created rate limiter + circuit breaker per guard key.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::domain::{channel_method, CallLabels, GuardKey, GuardSettings, KeyTarget};
use crate::port::{LimitSource, NoRoutes, RouteSource};

use super::breaker::CircuitBreaker;
use super::bucket::TokenBucket;

/// Method label used when an operation has no configured route.
pub const UNMAPPED_METHOD: &str = "NA";

/// Everything a guarded call needs for one key.
#[derive(Debug)]
pub struct GuardEntry {
    key: GuardKey,
    labels: CallLabels,
    settings: GuardSettings,
    bucket: TokenBucket,
    breaker: CircuitBreaker,
}

impl GuardEntry {
    #[must_use]
    pub const fn key(&self) -> &GuardKey {
        &self.key
    }

    #[must_use]
    pub const fn labels(&self) -> &CallLabels {
        &self.labels
    }

    #[must_use]
    pub const fn settings(&self) -> &GuardSettings {
        &self.settings
    }

    #[must_use]
    pub const fn bucket(&self) -> &TokenBucket {
        &self.bucket
    }

    #[must_use]
    pub const fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }
}

/// Owns every guard entry for the process. Entries are never evicted.
pub struct GuardRegistry {
    limits: Arc<dyn LimitSource>,
    routes: Arc<dyn RouteSource>,
    entries: DashMap<GuardKey, Arc<GuardEntry>>,
}

impl GuardRegistry {
    pub fn new(limits: Arc<dyn LimitSource>, routes: Arc<dyn RouteSource>) -> Self {
        Self {
            limits,
            routes,
            entries: DashMap::new(),
        }
    }

    /// Registry with the same settings for every key and no operation routes.
    #[must_use]
    pub fn uniform(settings: GuardSettings) -> Self {
        Self::new(Arc::new(settings), Arc::new(NoRoutes))
    }

    /// Fetch the entry for `key`, creating it on first use.
    ///
    /// Concurrent first callers for the same key all receive the same entry.
    pub fn get_or_create(&self, key: &GuardKey) -> Arc<GuardEntry> {
        if let Some(entry) = self.entries.get(key) {
            return Arc::clone(entry.value());
        }
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Arc::new(self.build(key)));
        Arc::clone(entry.value())
    }

    fn build(&self, key: &GuardKey) -> GuardEntry {
        let settings = self.limits.limits_for(key);
        let labels = self.labels_for(key);
        debug!(
            key = %key,
            rate_per_sec = settings.rate_per_sec,
            capacity = settings.capacity,
            failure_threshold = settings.failure_threshold,
            "Created guard"
        );
        GuardEntry {
            key: key.clone(),
            labels,
            settings,
            bucket: TokenBucket::new(settings.rate_per_sec, settings.capacity),
            breaker: CircuitBreaker::new(settings.failure_threshold, settings.recovery_time)
                .with_label(key.to_string()),
        }
    }

    /// Metric labels for a key: taken from the key itself, or from the route
    /// map for operation keys.
    #[must_use]
    pub fn labels_for(&self, key: &GuardKey) -> CallLabels {
        let exchange = key.exchange().to_string();
        match key.target() {
            KeyTarget::Endpoint { channel, path } => CallLabels {
                exchange,
                method: channel_method(channel),
                endpoint: path.clone(),
            },
            KeyTarget::Operation(op) => match self.routes.route(&exchange, op) {
                Some(route) => CallLabels {
                    exchange,
                    method: route.method.to_uppercase(),
                    endpoint: route.path,
                },
                None => CallLabels {
                    exchange,
                    method: UNMAPPED_METHOD.to_string(),
                    endpoint: op.clone(),
                },
            },
        }
    }

    /// Existing entry, without creating one.
    #[must_use]
    pub fn get(&self, key: &GuardKey) -> Option<Arc<GuardEntry>> {
        self.entries.get(key).map(|e| Arc::clone(e.value()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for GuardRegistry {
    fn default() -> Self {
        Self::uniform(GuardSettings::default())
    }
}

impl std::fmt::Debug for GuardRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardRegistry")
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EndpointRoute;
    use std::collections::HashMap;
    use std::time::Duration;

    #[test]
    fn same_key_returns_same_entry() {
        let registry = GuardRegistry::default();
        let a = registry.get_or_create(&GuardKey::parse("binance:rest:/api/v3/order"));
        let b = registry.get_or_create(&GuardKey::parse("BINANCE:rest:/api/v3/order"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn entries_use_resolved_settings() {
        let settings = GuardSettings {
            rate_per_sec: 2.0,
            capacity: 3.0,
            failure_threshold: 4,
            recovery_time: Duration::from_secs(1),
        };
        let registry = GuardRegistry::uniform(settings);
        let entry = registry.get_or_create(&GuardKey::parse("kraken:rest:/0/private/addorder"));
        assert_eq!(entry.bucket().capacity(), 3.0);
        assert_eq!(entry.breaker().failure_threshold(), 4);
        assert_eq!(entry.breaker().label(), "kraken:rest:/0/private/addorder");
    }

    #[test]
    fn endpoint_key_labels() {
        let registry = GuardRegistry::default();
        let labels = registry.labels_for(&GuardKey::parse("binance:rest:/api/v3/order"));
        assert_eq!(labels.method, "REST");
        assert_eq!(labels.endpoint, "/api/v3/order");

        let labels = registry.labels_for(&GuardKey::parse("binance:ws_public:stream"));
        assert_eq!(labels.method, "WS");
    }

    #[test]
    fn operation_key_labels_use_routes() {
        let mut routes = HashMap::new();
        routes.insert(
            ("bybit".to_string(), "get_balance".to_string()),
            EndpointRoute {
                method: "get".into(),
                path: "/v5/account/wallet-balance".into(),
            },
        );
        let registry = GuardRegistry::new(Arc::new(GuardSettings::default()), Arc::new(routes));

        let mapped = registry.labels_for(&GuardKey::parse("bybit:get_balance"));
        assert_eq!(mapped.method, "GET");
        assert_eq!(mapped.endpoint, "/v5/account/wallet-balance");

        let unmapped = registry.labels_for(&GuardKey::parse("bybit:cancel_all"));
        assert_eq!(unmapped.method, UNMAPPED_METHOD);
        assert_eq!(unmapped.endpoint, "cancel_all");
    }

    #[test]
    fn concurrent_first_callers_share_one_entry() {
        let registry = Arc::new(GuardRegistry::default());
        let key = GuardKey::parse("okx:rest:/api/v5/trade/order");
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let key = key.clone();
                std::thread::spawn(move || registry.get_or_create(&key))
            })
            .collect();
        let entries: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(entries.iter().all(|e| Arc::ptr_eq(e, &entries[0])));
        assert_eq!(registry.len(), 1);
    }
}
