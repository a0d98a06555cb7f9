//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the engine.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;
use crate::selector::ScoringWeights;

/// Root configuration for the routing engine.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Backend definitions, one per pluggable backend.
    pub backends: Vec<BackendConfig>,

    /// Selection and fallback behavior.
    pub selection: SelectionConfig,

    /// Availability probing settings.
    pub health_check: HealthCheckConfig,

    /// Response cache settings.
    pub cache: CacheConfig,

    /// Capability scoring and feedback settings.
    pub capability: CapabilityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// One backend's static description.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Unique backend identifier.
    pub name: String,

    /// Deployment kind (cloud, networked-local, embedded-local).
    pub kind: BackendKind,

    /// Probe/invocation endpoint. Required for networked kinds, absent for
    /// embedded ones.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Declared capabilities with initial scores in [0, 1].
    #[serde(default)]
    pub capabilities: HashMap<String, f64>,

    /// Baseline cost per unit of work (default: 1.0).
    #[serde(default = "default_cost_per_unit")]
    pub cost_per_unit: f64,

    /// Scoring weight overrides for this backend.
    #[serde(default)]
    pub weights: Option<ScoringWeights>,

    /// Quota windows; several may track the same resource.
    #[serde(default)]
    pub quotas: Vec<QuotaWindowConfig>,

    /// Circuit breaker thresholds.
    #[serde(default)]
    pub circuit: CircuitBreakerConfig,

    /// Execution timeout for a single invocation in seconds.
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
}

fn default_cost_per_unit() -> f64 {
    1.0
}

fn default_backend_timeout() -> u64 {
    30
}

/// One quota window over one resource class.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuotaWindowConfig {
    /// Resource class the window accounts for (e.g. "requests", "tokens").
    pub resource: String,

    /// Maximum count within one window.
    pub limit: u32,

    /// Window length in seconds.
    pub window_secs: u64,
}

/// Circuit breaker thresholds for one backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,

    /// Seconds the circuit stays open before admitting a trial request.
    pub reset_timeout_secs: u64,

    /// Whether quota-class failures count toward the trip threshold.
    pub count_quota_failures: bool,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_secs: 30,
            count_quota_failures: false,
        }
    }
}

/// Selection and fallback behavior.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// Global scoring weights; per-backend overrides win.
    pub weights: ScoringWeights,

    /// Probability of substituting the runner-up while degraded.
    pub jitter_probability: f64,

    /// Number of recently-failed backends that marks the system degraded.
    pub degraded_backend_threshold: usize,

    /// Additional fallback attempts after the first invocation fails.
    pub max_fallback_attempts: u32,

    /// Ordered backends tried when the candidate set is empty, ignoring
    /// circuit and quota gating.
    pub emergency_chain: Vec<String>,

    /// Designated embedded-local backend selected unconditionally when the
    /// emergency chain is also exhausted.
    pub safety_valve: String,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            jitter_probability: 0.2,
            degraded_backend_threshold: 2,
            max_fallback_attempts: 1,
            emergency_chain: Vec::new(),
            safety_valve: String::new(),
        }
    }
}

/// Availability probing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable the periodic background probe loop.
    pub enabled: bool,

    /// Probe loop interval in seconds.
    pub interval_secs: u64,

    /// Per-probe timeout in seconds.
    pub timeout_secs: u64,

    /// Seconds a cached availability result stays fresh.
    pub ttl_secs: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 10,
            timeout_secs: 5,
            ttl_secs: 10,
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable response memoization.
    pub enabled: bool,

    /// Entry time-to-live in seconds.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 300,
        }
    }
}

/// Capability scoring and feedback configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CapabilityConfig {
    /// Upward step applied on a successful outcome.
    pub success_step: f64,

    /// Downward step applied on a failed outcome; larger than the success
    /// step so scores fall faster than they recover.
    pub failure_step: f64,

    /// Penalty weight for a missing critical capability.
    pub missing_critical_penalty: f64,
}

impl Default for CapabilityConfig {
    fn default() -> Self {
        Self {
            success_step: 0.02,
            failure_step: 0.10,
            missing_critical_penalty: 0.5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
