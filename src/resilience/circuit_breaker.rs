//! Circuit breaker for backend protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: backend assumed down, requests fail fast
//! - Half-Open: testing if backend recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_count >= failure_threshold
//! Open → Half-Open: after reset_timeout, lazily on the next allow_request()
//! Half-Open → Closed: trial request succeeds
//! Half-Open → Open: trial request fails
//! ```
//!
//! # Design Decisions
//! - Per-backend circuit breaker (not global)
//! - Fail fast in Open state (no waiting for timeout)
//! - Single trial in Half-Open (prevents hammering a recovering backend)
//! - Quota-class failures only count toward trips when configured to

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::CircuitBreakerConfig;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// How a failure should be weighed by the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Connection error, timeout, or execution fault.
    Hard,
    /// Quota/rate-limit rejection. Counts toward trips only when
    /// `count_quota_failures` is set.
    Quota,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    failure_count: u32,
    opened_at: Option<Instant>,
    /// When the current Half-Open trial was admitted.
    trial_started: Option<Instant>,
}

/// Per-backend failure/recovery state machine.
///
/// All transitions for one backend are serialized behind a mutex so
/// concurrent callers cannot race a double transition.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failure_count: 0,
                opened_at: None,
                trial_started: None,
            }),
        }
    }

    fn reset_timeout(&self) -> Duration {
        Duration::from_secs(self.config.reset_timeout_secs)
    }

    /// Whether a request may pass through right now.
    ///
    /// Pure with respect to state and time, except for the lazy
    /// Open → Half-Open transition, which it performs as a side effect.
    pub fn allow_request(&self) -> bool {
        self.allow_request_at(Instant::now())
    }

    pub(crate) fn allow_request_at(&self, now: Instant) -> bool {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        match inner.state {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let opened_at = inner.opened_at.unwrap_or(now);
                if now.duration_since(opened_at) >= self.reset_timeout() {
                    inner.state = CircuitState::HalfOpen;
                    inner.trial_started = Some(now);
                    true
                } else {
                    false
                }
            }
            CircuitState::HalfOpen => {
                // One trial at a time. A trial whose caller vanished without
                // reporting back would wedge the breaker, so a new trial is
                // admitted after another full reset_timeout.
                match inner.trial_started {
                    Some(started) if now.duration_since(started) < self.reset_timeout() => false,
                    _ => {
                        inner.trial_started = Some(now);
                        true
                    }
                }
            }
        }
    }

    /// Record a successful invocation. In Half-Open this closes the circuit;
    /// in any state it resets the failure count.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.opened_at = None;
        inner.trial_started = None;
    }

    /// Record a failed invocation of the given class.
    pub fn record_failure(&self, class: FailureClass) {
        self.record_failure_at(Instant::now(), class)
    }

    pub(crate) fn record_failure_at(&self, now: Instant, class: FailureClass) {
        if class == FailureClass::Quota && !self.config.count_quota_failures {
            return;
        }

        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        match inner.state {
            CircuitState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.config.failure_threshold {
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(now);
                }
            }
            CircuitState::HalfOpen => {
                // Trial failed: back to Open with a fresh timeout.
                inner.state = CircuitState::Open;
                inner.opened_at = Some(now);
                inner.trial_started = None;
                inner.failure_count += 1;
            }
            CircuitState::Open => {
                // Failures while Open come from ungated emergency traffic;
                // they keep the circuit where it is.
                inner.failure_count += 1;
            }
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().expect("circuit breaker mutex poisoned").state
    }

    pub fn failure_count(&self) -> u32 {
        self.inner
            .lock()
            .expect("circuit breaker mutex poisoned")
            .failure_count
    }

    /// Administrative reset back to Closed. Never triggered by traffic.
    pub fn reset(&self) {
        self.record_success();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(threshold: u32, reset_secs: u64) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: threshold,
            reset_timeout_secs: reset_secs,
            count_quota_failures: false,
        })
    }

    #[test]
    fn test_closed_allows_requests() {
        let cb = breaker(3, 30);
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.allow_request());
    }

    #[test]
    fn test_opens_at_exact_threshold() {
        let cb = breaker(5, 30);
        let now = Instant::now();
        for _ in 0..4 {
            cb.record_failure_at(now, FailureClass::Hard);
            assert_eq!(cb.state(), CircuitState::Closed);
        }
        cb.record_failure_at(now, FailureClass::Hard);
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.allow_request_at(now));
    }

    #[test]
    fn test_open_blocks_until_reset_timeout() {
        let cb = breaker(1, 30);
        let now = Instant::now();
        cb.record_failure_at(now, FailureClass::Hard);
        assert!(!cb.allow_request_at(now + Duration::from_secs(29)));
        // At the boundary the lazy transition admits the trial.
        assert!(cb.allow_request_at(now + Duration::from_secs(30)));
        assert_eq!(cb.state(), CircuitState::HalfOpen);
    }

    #[test]
    fn test_half_open_admits_single_trial() {
        let cb = breaker(1, 30);
        let now = Instant::now();
        cb.record_failure_at(now, FailureClass::Hard);
        let later = now + Duration::from_secs(31);
        assert!(cb.allow_request_at(later));
        assert!(!cb.allow_request_at(later), "second caller must wait for the trial");
    }

    #[test]
    fn test_half_open_success_closes() {
        let cb = breaker(1, 30);
        let now = Instant::now();
        cb.record_failure_at(now, FailureClass::Hard);
        assert!(cb.allow_request_at(now + Duration::from_secs(30)));
        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
        assert!(cb.allow_request());
    }

    #[test]
    fn test_half_open_failure_reopens() {
        let cb = breaker(1, 30);
        let now = Instant::now();
        cb.record_failure_at(now, FailureClass::Hard);
        let trial_at = now + Duration::from_secs(30);
        assert!(cb.allow_request_at(trial_at));
        cb.record_failure_at(trial_at, FailureClass::Hard);
        assert_eq!(cb.state(), CircuitState::Open);
        // opened_at was refreshed by the failed trial.
        assert!(!cb.allow_request_at(trial_at + Duration::from_secs(29)));
        assert!(cb.allow_request_at(trial_at + Duration::from_secs(30)));
    }

    #[test]
    fn test_quota_failures_ignored_by_default() {
        let cb = breaker(1, 30);
        cb.record_failure(FailureClass::Quota);
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 0);
    }

    #[test]
    fn test_quota_failures_counted_when_configured() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold: 2,
            reset_timeout_secs: 30,
            count_quota_failures: true,
        });
        cb.record_failure(FailureClass::Quota);
        cb.record_failure(FailureClass::Quota);
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn test_success_resets_failure_count() {
        let cb = breaker(5, 30);
        cb.record_failure(FailureClass::Hard);
        cb.record_failure(FailureClass::Hard);
        cb.record_success();
        assert_eq!(cb.failure_count(), 0);
        for _ in 0..4 {
            cb.record_failure(FailureClass::Hard);
        }
        assert_eq!(cb.state(), CircuitState::Closed, "count restarted after success");
    }

    #[test]
    fn test_admin_reset() {
        let cb = breaker(1, 3000);
        cb.record_failure(FailureClass::Hard);
        assert_eq!(cb.state(), CircuitState::Open);
        cb.reset();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.allow_request());
    }
}
