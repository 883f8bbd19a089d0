//! Circuit breaker for the remote price sheet.
//!
//! A batch scan issues one fetch per symbol. When the sheet host starts
//! refusing requests (HTTP 403/429) or keeps failing, the breaker opens and every
//! following fetch fails fast with `FetchError::CircuitOpen` until the
//! cooldown elapses, instead of paying a full timeout per symbol.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Requests are allowed.
    Closed,
    /// Requests are refused until the cooldown expires.
    Open { tripped_at: Instant },
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
}

/// Shared, thread-safe breaker. Wrap in `Arc` to share across workers.
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    cooldown: Duration,
    failure_threshold: u32,
}

impl CircuitBreaker {
    pub fn new(cooldown: Duration, failure_threshold: u32) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
            }),
            cooldown,
            failure_threshold: failure_threshold.max(1),
        }
    }

    /// 30-minute cooldown, opens after 3 consecutive failures.
    pub fn default_sheet() -> Self {
        Self::new(Duration::from_secs(30 * 60), 3)
    }

    // A worker that panicked mid-update leaves plain counters behind; keep using them.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// True when a request may be sent. An expired cooldown closes the breaker.
    pub fn is_allowed(&self) -> bool {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::Closed => true,
            BreakerState::Open { tripped_at } => {
                if tripped_at.elapsed() >= self.cooldown {
                    inner.state = BreakerState::Closed;
                    inner.consecutive_failures = 0;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    pub fn record_success(&self) {
        self.lock().consecutive_failures = 0;
    }

    /// Count a failure; opens the breaker once the threshold is reached.
    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures += 1;
        if inner.consecutive_failures >= self.failure_threshold {
            inner.state = BreakerState::Open {
                tripped_at: Instant::now(),
            };
        }
    }

    /// Open immediately (HTTP 403 or 429).
    pub fn trip(&self) {
        self.lock().state = BreakerState::Open {
            tripped_at: Instant::now(),
        };
    }

    /// Time left before requests are allowed again (zero when closed).
    pub fn remaining_cooldown(&self) -> Duration {
        match self.lock().state {
            BreakerState::Closed => Duration::ZERO,
            BreakerState::Open { tripped_at } => {
                self.cooldown.saturating_sub(tripped_at.elapsed())
            }
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::default_sheet()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_closed() {
        let cb = CircuitBreaker::new(Duration::from_secs(60), 3);
        assert!(cb.is_allowed());
        assert_eq!(cb.state(), BreakerState::Closed);
        assert_eq!(cb.remaining_cooldown(), Duration::ZERO);
    }

    #[test]
    fn opens_at_threshold() {
        let cb = CircuitBreaker::new(Duration::from_secs(60), 3);
        cb.record_failure();
        cb.record_failure();
        assert!(cb.is_allowed());
        cb.record_failure();
        assert!(!cb.is_allowed());
        assert!(cb.remaining_cooldown() > Duration::ZERO);
    }

    #[test]
    fn trip_opens_immediately() {
        let cb = CircuitBreaker::new(Duration::from_secs(60), 3);
        cb.trip();
        assert!(!cb.is_allowed());
    }

    #[test]
    fn success_resets_failures() {
        let cb = CircuitBreaker::new(Duration::from_secs(60), 3);
        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        assert!(cb.is_allowed());
    }

    #[test]
    fn closes_after_cooldown() {
        let cb = CircuitBreaker::new(Duration::from_millis(10), 1);
        cb.record_failure();
        assert!(!cb.is_allowed());
        std::thread::sleep(Duration::from_millis(20));
        assert!(cb.is_allowed());
    }

    #[test]
    fn zero_threshold_behaves_like_one() {
        let cb = CircuitBreaker::new(Duration::from_secs(60), 0);
        cb.record_failure();
        assert!(!cb.is_allowed());
    }
}
