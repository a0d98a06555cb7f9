//! Per-backend quota window accounting.
//!
//! # Responsibilities
//! - Track usage counters per (resource, window) for one backend
//! - Reset a counter exactly when its window boundary is crossed
//! - Gate requests when any configured window is out of headroom
//!
//! # Design Decisions
//! - A backend may carry several windows per resource (per-minute, per-day);
//!   `can_proceed` requires headroom in all of them
//! - Window reset is lazy, performed by `record` on the first increment past
//!   the boundary; reads never mutate
//! - Counters saturate at the limit so ungated emergency traffic cannot push
//!   them past it

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::QuotaWindowConfig;

#[derive(Debug)]
struct WindowCounter {
    count: u32,
    window_start: Instant,
}

/// One usage window: a counter that accumulates until the window elapses.
#[derive(Debug)]
struct QuotaWindow {
    limit: u32,
    window: Duration,
    counter: Mutex<WindowCounter>,
}

impl QuotaWindow {
    fn new(limit: u32, window: Duration, now: Instant) -> Self {
        Self {
            limit,
            window,
            counter: Mutex::new(WindowCounter {
                count: 0,
                window_start: now,
            }),
        }
    }

    fn has_headroom_at(&self, now: Instant) -> bool {
        let counter = self.counter.lock().expect("quota mutex poisoned");
        if now.duration_since(counter.window_start) >= self.window {
            // Elapsed window: the next record() resets it, so there is room.
            return true;
        }
        counter.count < self.limit
    }

    fn record_at(&self, now: Instant) {
        let mut counter = self.counter.lock().expect("quota mutex poisoned");
        if now.duration_since(counter.window_start) >= self.window {
            counter.count = 0;
            counter.window_start = now;
        }
        counter.count = (counter.count + 1).min(self.limit);
    }

    fn usage_at(&self, now: Instant) -> (u32, u32) {
        let counter = self.counter.lock().expect("quota mutex poisoned");
        if now.duration_since(counter.window_start) >= self.window {
            (0, self.limit)
        } else {
            (counter.count, self.limit)
        }
    }

    fn reset(&self, now: Instant) {
        let mut counter = self.counter.lock().expect("quota mutex poisoned");
        counter.count = 0;
        counter.window_start = now;
    }
}

/// All quota windows for one backend, grouped by resource class.
///
/// Resources with no configured window are unlimited.
#[derive(Debug)]
pub struct QuotaTracker {
    windows: HashMap<String, Vec<QuotaWindow>>,
}

impl QuotaTracker {
    pub fn from_configs(configs: &[QuotaWindowConfig]) -> Self {
        Self::from_configs_at(configs, Instant::now())
    }

    fn from_configs_at(configs: &[QuotaWindowConfig], now: Instant) -> Self {
        let mut windows: HashMap<String, Vec<QuotaWindow>> = HashMap::new();
        for config in configs {
            windows.entry(config.resource.clone()).or_default().push(
                QuotaWindow::new(
                    config.limit,
                    Duration::from_secs(config.window_secs),
                    now,
                ),
            );
        }
        Self { windows }
    }

    /// Whether every window configured for `resource` still has headroom.
    pub fn can_proceed(&self, resource: &str) -> bool {
        self.can_proceed_at(resource, Instant::now())
    }

    pub(crate) fn can_proceed_at(&self, resource: &str, now: Instant) -> bool {
        match self.windows.get(resource) {
            Some(windows) => windows.iter().all(|w| w.has_headroom_at(now)),
            None => true,
        }
    }

    /// Charge one unit of `resource` against every window tracking it.
    pub fn record(&self, resource: &str) {
        self.record_at(resource, Instant::now())
    }

    pub(crate) fn record_at(&self, resource: &str, now: Instant) {
        if let Some(windows) = self.windows.get(resource) {
            for window in windows {
                window.record_at(now);
            }
        }
    }

    /// (count, limit) of the tightest window for `resource`, for diagnostics.
    pub fn usage(&self, resource: &str) -> Option<(u32, u32)> {
        let now = Instant::now();
        self.windows
            .get(resource)?
            .iter()
            .map(|w| w.usage_at(now))
            .max_by_key(|&(count, limit)| {
                // Tightest = highest fill ratio.
                (count as u64) * 1_000_000 / (limit as u64).max(1)
            })
    }

    /// Administrative reset of all counters. Never triggered by traffic.
    pub fn reset(&self) {
        let now = Instant::now();
        for windows in self.windows.values() {
            for window in windows {
                window.reset(now);
            }
        }
    }
}
