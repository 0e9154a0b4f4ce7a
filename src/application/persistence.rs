//! Periodic flush of the metrics registry to durable storage.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::application::metrics::MetricsRegistry;
use crate::domain::{epoch_seconds, SnapshotRows};
use crate::port::SnapshotStore;

/// Bounded retry for transient storage contention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Delay before retry `n` is `backoff * n`.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(200),
        }
    }
}

/// Appends one set of rows per tick. Never panics or raises into the
/// scheduler; failures are logged and reported as `false`.
pub struct PersistenceWriter {
    metrics: Arc<MetricsRegistry>,
    store: Arc<dyn SnapshotStore>,
    retry: RetryPolicy,
}

impl PersistenceWriter {
    pub fn new(metrics: Arc<MetricsRegistry>, store: Arc<dyn SnapshotStore>) -> Self {
        Self {
            metrics,
            store,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = RetryPolicy {
            attempts: retry.attempts.max(1),
            ..retry
        };
        self
    }

    #[must_use]
    pub const fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Snapshot the registry once and append the rows. Blocks while retrying.
    pub fn save_snapshot(&self) -> bool {
        let snapshot = self.metrics.snapshot();
        let rows = SnapshotRows::from_snapshot(&snapshot, epoch_seconds());

        for attempt in 1..=self.retry.attempts {
            match self.store.append(&rows) {
                Ok(()) => {
                    debug!(rows = rows.row_count(), attempt, "Persisted metrics snapshot");
                    return true;
                }
                Err(e) if e.is_transient() && attempt < self.retry.attempts => {
                    let delay = self.retry.backoff * attempt;
                    debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Storage busy, retrying"
                    );
                    std::thread::sleep(delay);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Failed to persist metrics snapshot");
                    return false;
                }
            }
        }
        false
    }

    /// Flush every `interval` until `shutdown` flips to `true` or closes.
    ///
    /// Each flush runs on the blocking pool; missed ticks are skipped. A zero
    /// interval is raised to one millisecond.
    pub async fn run(self: Arc<Self>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let interval = interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        info!(interval_secs = interval.as_secs_f64(), "Metrics persistence started");

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    match result {
                        Ok(()) => {
                            if *shutdown.borrow() {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }
                _ = ticker.tick() => {
                    let writer = Arc::clone(&self);
                    match tokio::task::spawn_blocking(move || writer.save_snapshot()).await {
                        Ok(true) => {}
                        Ok(false) => debug!("Metrics persistence tick skipped"),
                        Err(e) => warn!(error = %e, "Metrics persistence task failed"),
                    }
                }
            }
        }

        info!("Metrics persistence stopped");
    }
}

impl std::fmt::Debug for PersistenceWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceWriter")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
