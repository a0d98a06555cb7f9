//! Immutable backend identity and declared capabilities.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::BackendConfig;
use crate::selector::scoring::ScoringWeights;

/// The deployment shape of a backend.
///
/// The kind matters for the safety valve: only an embedded-local backend can
/// be the last line of defense, since it cannot fail for network reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Metered cloud API reached over the public network.
    Cloud,
    /// Service on the local network (e.g. a GPU box on the LAN).
    NetworkedLocal,
    /// In-process library; always reachable.
    EmbeddedLocal,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Cloud => write!(f, "cloud"),
            BackendKind::NetworkedLocal => write!(f, "networked-local"),
            BackendKind::EmbeddedLocal => write!(f, "embedded-local"),
        }
    }
}

/// A single backend's static description. Immutable after startup load.
#[derive(Debug, Clone)]
pub struct BackendDescriptor {
    /// Unique backend identifier.
    pub id: String,
    /// Deployment kind.
    pub kind: BackendKind,
    /// Declared capabilities with their initial scores in [0, 1].
    pub capabilities: HashMap<String, f64>,
    /// Baseline cost per unit of work; scaled by the client's estimator.
    pub cost_per_unit: f64,
    /// Per-backend scoring weight overrides; `None` uses the global weights.
    pub weights: Option<ScoringWeights>,
    /// Execution timeout for a single invocation.
    pub timeout: Duration,
}

impl BackendDescriptor {
    /// Build a descriptor from its configuration block.
    pub fn from_config(config: &BackendConfig) -> Self {
        Self {
            id: config.name.clone(),
            kind: config.kind,
            capabilities: config.capabilities.clone(),
            cost_per_unit: config.cost_per_unit,
            weights: config.weights.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Whether this backend declares the named capability at all.
    pub fn declares(&self, capability: &str) -> bool {
        self.capabilities.contains_key(capability)
    }
}
