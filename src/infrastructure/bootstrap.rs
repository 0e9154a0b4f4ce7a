//! Composition root: builds the guard, metrics, exporter and persistence
//! graph from a [`Config`].

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[cfg(feature = "exporter")]
use crate::adapter::outbound::prometheus::{serve, ExporterHandle, PrometheusExporter};
use crate::adapter::outbound::sqlite::SqliteSnapshotStore;
use crate::application::guard::{CallGuard, GuardFactory, GuardRegistry};
use crate::application::metrics::{MetricsRegistry, MetricsSubscriber};
use crate::application::persistence::PersistenceWriter;
use crate::infrastructure::config::endpoints::EndpointMap;
use crate::infrastructure::config::limits::RateLimitsConfig;
use crate::infrastructure::config::settings::{Config, TelemetryConfig};
use crate::port::{EventBus, MetricsExporter, NoopExporter, SnapshotStore};

/// Everything the host needs to guard calls and record trading metrics.
pub struct Telemetry {
    settings: TelemetryConfig,
    guards: GuardFactory,
    subscriber: MetricsSubscriber,
    writer: Arc<PersistenceWriter>,
    #[cfg(feature = "exporter")]
    prometheus: Option<Arc<PrometheusExporter>>,
}

/// Background tasks started by [`Telemetry::start`].
#[derive(Debug)]
pub struct RunningTelemetry {
    #[cfg(feature = "exporter")]
    pub exporter: Option<ExporterHandle>,
    pub persistence: JoinHandle<()>,
}

impl RunningTelemetry {
    /// Wait for the persistence loop to exit and stop the exporter.
    pub async fn join(self) {
        if let Err(e) = self.persistence.await {
            tracing::warn!(error = %e, "Persistence task ended abnormally");
        }
        #[cfg(feature = "exporter")]
        if let Some(handle) = self.exporter {
            handle.abort();
        }
    }
}

impl Telemetry {
    /// Build from configuration, reading the guard policy files and using a
    /// SQLite store at the configured path.
    #[must_use]
    pub fn build(config: &Config) -> Self {
        let limits = RateLimitsConfig::load_or_default(&config.guard.rate_limits);
        let routes = EndpointMap::load_or_default(&config.guard.endpoint_map);
        let store = SqliteSnapshotStore::new(&config.telemetry.database);
        Self::from_parts(
            config.telemetry.clone(),
            GuardRegistry::new(Arc::new(limits), Arc::new(routes)),
            Arc::new(store),
        )
    }

    /// Build with an explicit guard registry and snapshot store.
    #[must_use]
    pub fn from_parts(
        settings: TelemetryConfig,
        registry: GuardRegistry,
        store: Arc<dyn SnapshotStore>,
    ) -> Self {
        let metrics = Arc::new(MetricsRegistry::with_starting_cash(settings.starting_cash));

        #[cfg(feature = "exporter")]
        let prometheus = if settings.exporter.enabled {
            match PrometheusExporter::new() {
                Ok(exporter) => Some(Arc::new(exporter)),
                Err(e) => {
                    warn!(error = %e, "Prometheus exporter unavailable, metrics stay in-process");
                    None
                }
            }
        } else {
            None
        };

        #[cfg(feature = "exporter")]
        let exporter: Arc<dyn MetricsExporter> = match &prometheus {
            Some(p) => Arc::clone(p) as Arc<dyn MetricsExporter>,
            None => Arc::new(NoopExporter),
        };
        #[cfg(not(feature = "exporter"))]
        let exporter: Arc<dyn MetricsExporter> = Arc::new(NoopExporter);

        let guards = GuardFactory::new(
            Arc::new(registry),
            Arc::clone(&metrics),
            Arc::clone(&exporter),
        );
        let subscriber = MetricsSubscriber::new(Arc::clone(&metrics), exporter);
        let writer = Arc::new(
            PersistenceWriter::new(metrics, store).with_retry(settings.retry_policy()),
        );

        Self {
            settings,
            guards,
            subscriber,
            writer,
            #[cfg(feature = "exporter")]
            prometheus,
        }
    }

    /// Guard for `key`, sharing this telemetry's registry and sinks.
    #[must_use]
    pub fn guard(&self, key: &str) -> CallGuard {
        self.guards.guard(key)
    }

    #[must_use]
    pub const fn guards(&self) -> &GuardFactory {
        &self.guards
    }

    #[must_use]
    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        self.guards.metrics()
    }

    #[must_use]
    pub fn writer(&self) -> &Arc<PersistenceWriter> {
        &self.writer
    }

    #[cfg(feature = "exporter")]
    #[must_use]
    pub fn prometheus(&self) -> Option<&Arc<PrometheusExporter>> {
        self.prometheus.as_ref()
    }

    /// Subscribe the metrics handlers to `bus`. Call again after the bus is
    /// cleared.
    pub fn attach(&self, bus: &dyn EventBus) {
        self.subscriber.install(bus);
    }

    /// Persist one last snapshot on the blocking pool. Returns `false` and
    /// logs when the write did not land.
    pub async fn flush(&self) -> bool {
        let writer = Arc::clone(&self.writer);
        match tokio::task::spawn_blocking(move || writer.save_snapshot()).await {
            Ok(true) => true,
            Ok(false) => {
                warn!("Final metrics flush failed");
                false
            }
            Err(e) => {
                warn!(error = %e, "Final metrics flush task failed");
                false
            }
        }
    }

    /// Start the exporter endpoint (when enabled) and the persistence loop.
    pub async fn start(&self, shutdown: watch::Receiver<bool>) -> RunningTelemetry {
        #[cfg(feature = "exporter")]
        let exporter = match &self.prometheus {
            Some(p) => serve(Arc::clone(p), self.settings.exporter.addr()).await,
            None => None,
        };

        info!(
            database = %self.settings.database.display(),
            interval_secs = self.settings.persist_interval_secs,
            "Starting telemetry"
        );
        let persistence = tokio::spawn(
            Arc::clone(&self.writer).run(self.settings.persist_interval(), shutdown),
        );

        RunningTelemetry {
            #[cfg(feature = "exporter")]
            exporter,
            persistence,
        }
    }
}

impl std::fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telemetry")
            .field("settings", &self.settings)
            .field("guards", &self.guards)
            .finish_non_exhaustive()
    }
}
