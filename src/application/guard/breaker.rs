//! Time-windowed circuit breaker.
//!
//! There is no explicit half-open flag. Once `recovery_time` has passed since
//! the breaker last opened, calls are let through again; a success resets it
//! and a failure re-opens it for a fresh full window.

use std::future::Future;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::error::GuardError;

/// Observable breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Never tripped, or reset since.
    Closed,
    /// Failing fast until the recovery window elapses.
    Open,
    /// Window elapsed; the next call decides.
    Probe,
}

#[derive(Debug, Default)]
struct BreakerState {
    failures: u32,
    opened_at: Option<Instant>,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    label: String,
    failure_threshold: u32,
    recovery_time: Duration,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(failure_threshold: u32, recovery_time: Duration) -> Self {
        Self {
            label: String::new(),
            failure_threshold: failure_threshold.max(1),
            recovery_time,
            state: Mutex::new(BreakerState::default()),
        }
    }

    /// Name used in logs and in [`GuardError::CircuitOpen`].
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub const fn failure_threshold(&self) -> u32 {
        self.failure_threshold
    }

    #[must_use]
    pub const fn recovery_time(&self) -> Duration {
        self.recovery_time
    }

    #[must_use]
    pub fn failures(&self) -> u32 {
        self.state.lock().failures
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.is_open_at(Instant::now())
    }

    #[must_use]
    pub fn is_open_at(&self, now: Instant) -> bool {
        let state = self.state.lock();
        self.within_window(&state, now)
    }

    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.state_at(Instant::now())
    }

    #[must_use]
    pub fn state_at(&self, now: Instant) -> CircuitState {
        let state = self.state.lock();
        match state.opened_at {
            None => CircuitState::Closed,
            Some(_) if self.within_window(&state, now) => CircuitState::Open,
            Some(_) => CircuitState::Probe,
        }
    }

    fn within_window(&self, state: &BreakerState, now: Instant) -> bool {
        state
            .opened_at
            .is_some_and(|opened| now.saturating_duration_since(opened) < self.recovery_time)
    }

    pub fn record_failure(&self) {
        self.record_failure_at(Instant::now());
    }

    /// Count a failure. At or past the threshold every failure restarts the
    /// recovery window.
    pub fn record_failure_at(&self, now: Instant) {
        let mut state = self.state.lock();
        state.failures = state.failures.saturating_add(1);
        if state.failures >= self.failure_threshold {
            if state.opened_at.is_none() {
                warn!(
                    breaker = %self.label,
                    failures = state.failures,
                    recovery_ms = self.recovery_time.as_millis() as u64,
                    "Circuit breaker tripped"
                );
            }
            state.opened_at = Some(now);
        }
    }

    pub fn reset(&self) {
        let mut state = self.state.lock();
        if state.opened_at.is_some() {
            info!(breaker = %self.label, "Circuit breaker closed");
        }
        *state = BreakerState::default();
    }

    fn rejection<E>(&self) -> GuardError<E> {
        GuardError::CircuitOpen {
            key: self.label.clone(),
        }
    }

    /// Run a blocking call through the breaker.
    ///
    /// The lock is released while `f` runs.
    ///
    /// # Errors
    ///
    /// [`GuardError::CircuitOpen`] without calling `f` while the window is
    /// active, otherwise `f`'s own error as [`GuardError::Call`].
    pub fn call<T, E, F>(&self, f: F) -> Result<T, GuardError<E>>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if self.is_open() {
            return Err(self.rejection());
        }
        self.settle(f())
    }

    /// Run an async call through the breaker. `f` is not invoked while open.
    ///
    /// # Errors
    ///
    /// Same as [`Self::call`].
    pub async fn call_async<T, E, F, Fut>(&self, f: F) -> Result<T, GuardError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if self.is_open() {
            return Err(self.rejection());
        }
        let outcome = f().await;
        self.settle(outcome)
    }

    fn settle<T, E>(&self, outcome: Result<T, E>) -> Result<T, GuardError<E>> {
        match outcome {
            Ok(value) => {
                self.reset();
                Ok(value)
            }
            Err(e) => {
                self.record_failure();
                Err(GuardError::Call(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(2, Duration::from_millis(200)).with_label("test:rest:/x")
    }

    #[test]
    fn opens_at_threshold() {
        let b = breaker();
        let t0 = Instant::now();
        b.record_failure_at(t0);
        assert_eq!(b.state_at(t0), CircuitState::Closed);
        b.record_failure_at(t0);
        assert!(b.is_open_at(t0));
        assert_eq!(b.state_at(t0), CircuitState::Open);
    }

    #[test]
    fn window_elapses_into_trial() {
        let b = breaker();
        let t0 = Instant::now();
        b.record_failure_at(t0);
        b.record_failure_at(t0);
        assert!(b.is_open_at(t0 + Duration::from_millis(199)));
        assert!(!b.is_open_at(t0 + Duration::from_millis(200)));
        assert_eq!(b.state_at(t0 + Duration::from_millis(250)), CircuitState::Probe);
    }

    #[test]
    fn failure_during_trial_restarts_full_window() {
        let b = breaker();
        let t0 = Instant::now();
        b.record_failure_at(t0);
        b.record_failure_at(t0);
        let trial = t0 + Duration::from_millis(250);
        b.record_failure_at(trial);
        assert_eq!(b.failures(), 3);
        assert!(b.is_open_at(trial + Duration::from_millis(150)));
        assert!(!b.is_open_at(trial + Duration::from_millis(200)));
    }

    #[test]
    fn reset_clears_failures_and_window() {
        let b = breaker();
        b.record_failure();
        b.record_failure();
        assert!(b.is_open());
        b.reset();
        assert_eq!(b.failures(), 0);
        assert_eq!(b.state(), CircuitState::Closed);
    }

    #[test]
    fn open_call_is_rejected_without_invoking() {
        let b = breaker();
        b.record_failure();
        b.record_failure();
        let invoked = Cell::new(false);
        let result: Result<(), GuardError<&str>> = b.call(|| {
            invoked.set(true);
            Ok(())
        });
        assert!(matches!(result, Err(GuardError::CircuitOpen { ref key }) if key == "test:rest:/x"));
        assert!(!invoked.get());
    }

    #[test]
    fn call_error_passes_through_and_counts() {
        let b = breaker();
        let result: Result<(), _> = b.call(|| Err("boom"));
        assert_eq!(result.unwrap_err().into_call_error(), Some("boom"));
        assert_eq!(b.failures(), 1);
    }

    #[test]
    fn success_resets_failures() {
        let b = breaker();
        b.record_failure();
        let result: Result<u32, GuardError<&str>> = b.call(|| Ok(7));
        assert_eq!(result.unwrap(), 7);
        assert_eq!(b.failures(), 0);
    }

    #[tokio::test]
    async fn async_call_follows_same_rules() {
        let b = breaker();
        let first: Result<(), _> = b.call_async(|| async { Err("down") }).await;
        assert!(first.is_err());
        let second: Result<(), _> = b.call_async(|| async { Err("down") }).await;
        assert!(matches!(second, Err(GuardError::Call("down"))));
        assert!(b.is_open());

        let invoked = std::sync::atomic::AtomicBool::new(false);
        let third: Result<(), GuardError<&str>> = b
            .call_async(|| {
                invoked.store(true, std::sync::atomic::Ordering::SeqCst);
                async { Ok(()) }
            })
            .await;
        assert!(matches!(third, Err(GuardError::CircuitOpen { .. })));
        assert!(!invoked.load(std::sync::atomic::Ordering::SeqCst));
    }
}
