//! Capability scoring matrix.
//!
//! # Responsibilities
//! - Hold (backend, capability) → score in [0, 1], seeded from config
//! - Score a backend against a weighted set of required capabilities
//! - Apply feedback adjustments after invocation outcomes
//!
//! # Design Decisions
//! - Reads are lock-free snapshots (arc-swap); momentary staleness is fine
//!   because gating re-runs on every request
//! - Feedback adjustment is the only mutation path: a small positive step on
//!   success, a larger negative step on failure, clamped to [0, 1]
//! - A missing critical capability is an explicit penalty, not a silent zero

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;

use crate::config::CapabilityConfig;

/// One required capability with its importance weight.
#[derive(Debug, Clone)]
pub struct CapabilityRequirement {
    pub name: String,
    pub weight: f64,
    /// Critical requirements penalize backends that lack the capability
    /// entirely, instead of merely contributing zero.
    pub critical: bool,
}

impl CapabilityRequirement {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            critical: false,
        }
    }

    pub fn critical(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
            critical: true,
        }
    }
}

/// Static + feedback-adjusted capability scores for all backends.
pub struct CapabilityMatrix {
    scores: DashMap<String, ArcSwap<HashMap<String, f64>>>,
    config: CapabilityConfig,
}

impl CapabilityMatrix {
    pub fn new(config: CapabilityConfig) -> Self {
        Self {
            scores: DashMap::new(),
            config,
        }
    }

    /// Seed a backend's declared capabilities. Called once per backend at
    /// startup, before any traffic.
    pub fn seed(&self, backend: &str, capabilities: &HashMap<String, f64>) {
        let clamped: HashMap<String, f64> = capabilities
            .iter()
            .map(|(name, score)| (name.clone(), score.clamp(0.0, 1.0)))
            .collect();
        self.scores
            .insert(backend.to_string(), ArcSwap::from_pointee(clamped));
    }

    /// Score for one (backend, capability) pair; 0.0 when unknown.
    pub fn score(&self, backend: &str, capability: &str) -> f64 {
        self.scores
            .get(backend)
            .map(|entry| {
                entry
                    .load()
                    .get(capability)
                    .copied()
                    .unwrap_or(0.0)
            })
            .unwrap_or(0.0)
    }

    /// Weighted capability score of `backend` against the requirements.
    ///
    /// Each requirement contributes `score * weight`; a critical requirement
    /// the backend does not declare at all contributes `-penalty * weight`.
    /// The result is normalized by total weight and clamped to [0, 1].
    pub fn score_backend(&self, backend: &str, required: &[CapabilityRequirement]) -> f64 {
        if required.is_empty() {
            return 1.0;
        }
        let Some(entry) = self.scores.get(backend) else {
            return 0.0;
        };
        let snapshot = entry.load();

        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;
        for requirement in required {
            let weight = requirement.weight.max(0.0);
            total_weight += weight;
            match snapshot.get(&requirement.name) {
                Some(score) => weighted_sum += score * weight,
                None if requirement.critical => {
                    weighted_sum -= self.config.missing_critical_penalty * weight;
                }
                None => {}
            }
        }
        if total_weight <= f64::EPSILON {
            return 0.0;
        }
        (weighted_sum / total_weight).clamp(0.0, 1.0)
    }

    /// Feedback adjustment after an invocation outcome: exponential moving
    /// update toward 1.0 on success, a larger step toward 0.0 on failure.
    pub fn adjust(&self, backend: &str, capability: &str, success: bool) {
        let Some(entry) = self.scores.get(backend) else {
            return;
        };
        let step = if success {
            self.config.success_step
        } else {
            -self.config.failure_step
        };
        entry.rcu(|current| {
            let mut next: HashMap<String, f64> = HashMap::clone(current);
            let score = next.entry(capability.to_string()).or_insert(0.0);
            *score = (*score + step).clamp(0.0, 1.0);
            next
        });
        tracing::debug!(
            backend = %backend,
            capability = %capability,
            success,
            "Capability score adjusted"
        );
    }

    /// Snapshot of a backend's current scores, for diagnostics.
    pub fn snapshot(&self, backend: &str) -> Option<HashMap<String, f64>> {
        self.scores
            .get(backend)
            .map(|entry| HashMap::clone(&entry.load()))
    }
}
