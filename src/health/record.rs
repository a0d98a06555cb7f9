//! Per-backend availability state.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Cached probe result for one backend. One record per backend for the
/// process lifetime; updated by the monitor and by selector outcomes.
#[derive(Debug)]
pub struct AvailabilityRecord {
    available: AtomicBool,
    consecutive_failures: AtomicU32,
    last_checked: Mutex<Option<Instant>>,
}

impl AvailabilityRecord {
    /// New record, optimistically available until the first probe says
    /// otherwise (mirrors treating an unknown backend as eligible).
    pub fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            consecutive_failures: AtomicU32::new(0),
            last_checked: Mutex::new(None),
        }
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    /// Whether the cached value is younger than `ttl`.
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        let last = self.last_checked.lock().expect("availability mutex poisoned");
        match *last {
            Some(checked) => checked.elapsed() < ttl,
            None => false,
        }
    }

    /// Record an observation. Returns `true` when the boolean flipped.
    pub fn observe(&self, available: bool) -> bool {
        if available {
            self.consecutive_failures.store(0, Ordering::Relaxed);
        } else {
            self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
        }
        let mut last = self.last_checked.lock().expect("availability mutex poisoned");
        *last = Some(Instant::now());
        let previous = self.available.swap(available, Ordering::Relaxed);
        previous != available
    }

    /// Administrative reset to the optimistic initial state.
    pub fn reset(&self) {
        self.available.store(true, Ordering::Relaxed);
        self.consecutive_failures.store(0, Ordering::Relaxed);
        let mut last = self.last_checked.lock().expect("availability mutex poisoned");
        *last = None;
    }
}

impl Default for AvailabilityRecord {
    fn default() -> Self {
        Self::new()
    }
}
