//! Token bucket admission control.

use std::time::Instant;

use parking_lot::Mutex;

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Fail-fast token bucket. Starts full.
///
/// `consume` never blocks waiting for tokens: it either debits the full
/// amount or leaves the bucket untouched and returns `false`.
#[derive(Debug)]
pub struct TokenBucket {
    rate: f64,
    capacity: f64,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    #[must_use]
    pub fn new(rate: f64, capacity: f64) -> Self {
        let capacity = capacity.max(0.0);
        Self {
            rate: rate.max(0.0),
            capacity,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    #[must_use]
    pub const fn rate(&self) -> f64 {
        self.rate
    }

    #[must_use]
    pub const fn capacity(&self) -> f64 {
        self.capacity
    }

    /// Try to take `amount` tokens now.
    pub fn consume(&self, amount: f64) -> bool {
        self.consume_at(amount, Instant::now())
    }

    /// Try to take `amount` tokens as of `now`.
    ///
    /// Refill and debit happen under one lock, so concurrent callers racing
    /// for the last token see exactly one winner.
    pub fn consume_at(&self, amount: f64, now: Instant) -> bool {
        let mut state = self.state.lock();
        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.rate).min(self.capacity);
        if now > state.last_refill {
            state.last_refill = now;
        }

        if state.tokens >= amount {
            state.tokens -= amount;
            true
        } else {
            false
        }
    }

    /// Current token count without refilling.
    #[must_use]
    pub fn available(&self) -> f64 {
        self.state.lock().tokens
    }
}
