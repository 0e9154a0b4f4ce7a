//! Guarded invocation of outbound exchange calls.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::application::metrics::MetricsRegistry;
use crate::domain::{CallStatus, GuardKey};
use crate::error::GuardError;
use crate::port::MetricsExporter;

use super::registry::{GuardEntry, GuardRegistry};

/// Supplies the exchange name for keys written with the `exchange`
/// placeholder, so several client instances get separate guards.
pub trait GuardNamespace {
    fn guard_namespace(&self) -> Option<&str>;
}

/// Rate limit + circuit breaker wrapper for one guard key.
///
/// Every attempted call, successful or not, records latency, an `OK`/`ERR`
/// request count, and the breaker gauge. A rate-limited call records only a
/// drop and is never attempted.
#[derive(Clone)]
pub struct CallGuard {
    key: GuardKey,
    registry: Arc<GuardRegistry>,
    metrics: Arc<MetricsRegistry>,
    exporter: Arc<dyn MetricsExporter>,
}

impl CallGuard {
    pub fn new(
        key: impl Into<GuardKey>,
        registry: Arc<GuardRegistry>,
        metrics: Arc<MetricsRegistry>,
        exporter: Arc<dyn MetricsExporter>,
    ) -> Self {
        Self {
            key: key.into(),
            registry,
            metrics,
            exporter,
        }
    }

    #[must_use]
    pub const fn key(&self) -> &GuardKey {
        &self.key
    }

    /// Same guard, re-keyed under `namespace` when the key uses the
    /// placeholder exchange.
    #[must_use]
    pub fn scoped(&self, namespace: &str) -> Self {
        Self {
            key: self.key.with_namespace(namespace),
            ..self.clone()
        }
    }

    /// Same guard, re-keyed under the client's namespace if it has one.
    #[must_use]
    pub fn for_client<C: GuardNamespace + ?Sized>(&self, client: &C) -> Self {
        match client.guard_namespace() {
            Some(namespace) => self.scoped(namespace),
            None => self.clone(),
        }
    }

    /// Resolve the entry and take a token.
    fn admit<E>(&self) -> Result<Arc<GuardEntry>, GuardError<E>> {
        let entry = self.registry.get_or_create(&self.key);
        if entry.bucket().consume(1.0) {
            return Ok(entry);
        }

        let labels = entry.labels();
        self.metrics
            .record_rate_drop(&labels.exchange, &labels.endpoint);
        self.exporter
            .inc_rate_drop(&labels.exchange, &labels.endpoint);
        debug!(key = %self.key, "Rate limited");
        Err(GuardError::RateLimited {
            key: self.key.to_string(),
        })
    }

    fn finish(&self, entry: &GuardEntry, started: Instant, ok: bool) {
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        let status = if ok { CallStatus::Ok } else { CallStatus::Err };
        let open = entry.breaker().is_open();
        let labels = entry.labels();

        self.metrics.record_attempt(labels, latency_ms, status, open);
        self.exporter
            .inc_http(&labels.exchange, &labels.method, &labels.endpoint, status);
        self.exporter
            .set_circuit(&labels.exchange, &labels.endpoint, open);
    }

    /// Run a blocking call under the guard.
    ///
    /// # Errors
    ///
    /// [`GuardError::RateLimited`] or [`GuardError::CircuitOpen`] when the
    /// call was not attempted, otherwise the call's own error as
    /// [`GuardError::Call`].
    pub fn call<T, E, F>(&self, f: F) -> Result<T, GuardError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let entry = self.admit::<E>()?;
        let started = Instant::now();
        let outcome = entry.breaker().call(f);
        self.finish(&entry, started, outcome.is_ok());
        outcome
    }

    /// Run an async call under the guard. `f` is only invoked when admitted.
    ///
    /// # Errors
    ///
    /// Same as [`Self::call`].
    pub async fn call_async<T, E, F, Fut>(&self, f: F) -> Result<T, GuardError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let entry = self.admit::<E>()?;
        let started = Instant::now();
        let outcome = entry.breaker().call_async(f).await;
        self.finish(&entry, started, outcome.is_ok());
        outcome
    }
}

impl std::fmt::Debug for CallGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallGuard")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EndpointKey, GuardSettings};
    use crate::port::NoopExporter;
    use std::cell::Cell;
    use std::time::Duration;

    fn guard(key: &str, settings: GuardSettings) -> (CallGuard, Arc<MetricsRegistry>) {
        let metrics = Arc::new(MetricsRegistry::new());
        let guard = CallGuard::new(
            key,
            Arc::new(GuardRegistry::uniform(settings)),
            Arc::clone(&metrics),
            Arc::new(NoopExporter),
        );
        (guard, metrics)
    }

    fn tight() -> GuardSettings {
        GuardSettings {
            rate_per_sec: 1.0,
            capacity: 1.0,
            failure_threshold: 2,
            recovery_time: Duration::from_secs(60),
        }
    }

    #[test]
    fn rate_limited_call_is_not_invoked() {
        let (guard, metrics) = guard("binance:rest:/api/v3/order", tight());
        let ok: Result<(), GuardError<&str>> = guard.call(|| Ok(()));
        assert!(ok.is_ok());

        let invoked = Cell::new(false);
        let denied: Result<(), GuardError<&str>> = guard.call(|| {
            invoked.set(true);
            Ok(())
        });
        assert!(matches!(denied, Err(GuardError::RateLimited { .. })));
        assert!(!invoked.get());

        let snap = metrics.snapshot();
        assert_eq!(snap.http_requests, 1);
        assert_eq!(
            snap.rate_drops[&EndpointKey::new("binance", "/api/v3/order")],
            1
        );
    }

    #[test]
    fn failed_call_counts_err_and_keeps_error() {
        let settings = GuardSettings {
            capacity: 10.0,
            ..tight()
        };
        let (guard, metrics) = guard("binance:rest:/api/v3/order", settings);
        let result: Result<(), _> = guard.call(|| Err(std::io::Error::other("exchange down")));
        let err = result.unwrap_err().into_call_error().unwrap();
        assert_eq!(err.to_string(), "exchange down");

        let snap = metrics.snapshot();
        assert_eq!(snap.requests("binance", "/api/v3/order", CallStatus::Err), 1);
        assert_eq!(snap.requests("binance", "/api/v3/order", CallStatus::Ok), 0);
    }

    #[test]
    fn circuit_open_rejection_counts_as_err() {
        let settings = GuardSettings {
            capacity: 10.0,
            ..tight()
        };
        let (guard, metrics) = guard("kraken:rest:/0/private/addorder", settings);
        for _ in 0..2 {
            let _: Result<(), _> = guard.call(|| Err("timeout"));
        }
        let rejected: Result<(), GuardError<&str>> = guard.call(|| Ok(()));
        assert!(matches!(rejected, Err(GuardError::CircuitOpen { .. })));

        let snap = metrics.snapshot();
        assert_eq!(snap.requests("kraken", "/0/private/addorder", CallStatus::Err), 3);
        assert!(snap.circuit_open[&EndpointKey::new("kraken", "/0/private/addorder")]);
    }

    struct Client {
        slug: &'static str,
    }

    impl GuardNamespace for Client {
        fn guard_namespace(&self) -> Option<&str> {
            Some(self.slug)
        }
    }

    #[test]
    fn client_namespace_splits_buckets() {
        let (guard, _) = guard("exchange:get_balance", tight());
        let a = guard.for_client(&Client { slug: "Binance" });
        let b = guard.for_client(&Client { slug: "bybit" });
        assert_eq!(a.key().to_string(), "binance:get_balance");

        let first: Result<(), GuardError<&str>> = a.call(|| Ok(()));
        let second: Result<(), GuardError<&str>> = b.call(|| Ok(()));
        assert!(first.is_ok());
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn async_call_records_latency() {
        let (guard, metrics) = guard("okx:rest:/api/v5/account/balance", tight());
        let value: Result<u32, GuardError<&str>> = guard
            .call_async(|| async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Ok(3)
            })
            .await;
        assert_eq!(value.unwrap(), 3);
        let snap = metrics.snapshot();
        assert!(snap.latency.latest >= 5.0);
        assert_eq!(snap.requests("okx", "/api/v5/account/balance", CallStatus::Ok), 1);
    }
}
