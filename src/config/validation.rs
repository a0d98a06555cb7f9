//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (chains reference existing backends)
//! - Validate value ranges (weights sum to 1, probabilities in [0, 1])
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: EngineConfig → Result<(), Vec<ValidationError>>
//! - Runs before the config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::backend::BackendKind;
use crate::config::schema::EngineConfig;
use crate::selector::ScoringWeights;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("no backends configured")]
    NoBackends,

    #[error("duplicate backend name '{name}'")]
    DuplicateBackend { name: String },

    #[error("backend '{backend}' of kind {kind} requires an endpoint")]
    MissingEndpoint { backend: String, kind: BackendKind },

    #[error("backend '{backend}' endpoint is invalid: {reason}")]
    InvalidEndpoint { backend: String, reason: String },

    #[error("backend '{backend}' capability '{capability}' score {score} outside [0, 1]")]
    CapabilityScoreOutOfRange {
        backend: String,
        capability: String,
        score: f64,
    },

    #[error("backend '{backend}' cost_per_unit must be non-negative")]
    NegativeCost { backend: String },

    #[error("{scope} scoring weights sum to {sum}, expected 1.0")]
    WeightSumInvalid { scope: String, sum: f64 },

    #[error("backend '{backend}' quota for '{resource}' must have limit > 0 and window_secs > 0")]
    InvalidQuotaWindow { backend: String, resource: String },

    #[error("backend '{backend}' circuit breaker must have failure_threshold > 0 and reset_timeout_secs > 0")]
    InvalidCircuitBreaker { backend: String },

    #[error("backend '{backend}' timeout_secs must be > 0")]
    ZeroTimeout { backend: String },

    #[error("jitter_probability {value} outside [0, 1]")]
    JitterProbabilityOutOfRange { value: f64 },

    #[error("emergency chain references unknown backend '{name}'")]
    UnknownEmergencyBackend { name: String },

    #[error("no safety valve backend configured")]
    SafetyValveMissing,

    #[error("safety valve references unknown backend '{name}'")]
    UnknownSafetyValve { name: String },

    #[error("safety valve backend '{name}' must be of kind embedded-local")]
    SafetyValveNotEmbedded { name: String },

    #[error("health check {field} must be > 0")]
    InvalidHealthCheck { field: &'static str },
}

fn check_weights(scope: String, weights: &ScoringWeights, errors: &mut Vec<ValidationError>) {
    let sum = weights.sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE
        || weights.capability < 0.0
        || weights.performance < 0.0
        || weights.cost < 0.0
    {
        errors.push(ValidationError::WeightSumInvalid { scope, sum });
    }
}

/// Validate an engine configuration, collecting every violation.
pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    let mut seen = std::collections::HashSet::new();
    for backend in &config.backends {
        if !seen.insert(backend.name.as_str()) {
            errors.push(ValidationError::DuplicateBackend {
                name: backend.name.clone(),
            });
        }

        match (&backend.endpoint, backend.kind) {
            (None, BackendKind::Cloud | BackendKind::NetworkedLocal) => {
                errors.push(ValidationError::MissingEndpoint {
                    backend: backend.name.clone(),
                    kind: backend.kind,
                });
            }
            (Some(endpoint), _) => {
                if let Err(e) = endpoint.parse::<Url>() {
                    errors.push(ValidationError::InvalidEndpoint {
                        backend: backend.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
            (None, BackendKind::EmbeddedLocal) => {}
        }

        for (capability, score) in &backend.capabilities {
            if !(0.0..=1.0).contains(score) {
                errors.push(ValidationError::CapabilityScoreOutOfRange {
                    backend: backend.name.clone(),
                    capability: capability.clone(),
                    score: *score,
                });
            }
        }

        if backend.cost_per_unit < 0.0 {
            errors.push(ValidationError::NegativeCost {
                backend: backend.name.clone(),
            });
        }

        if let Some(weights) = &backend.weights {
            check_weights(format!("backend '{}'", backend.name), weights, &mut errors);
        }

        for quota in &backend.quotas {
            if quota.limit == 0 || quota.window_secs == 0 {
                errors.push(ValidationError::InvalidQuotaWindow {
                    backend: backend.name.clone(),
                    resource: quota.resource.clone(),
                });
            }
        }

        if backend.circuit.failure_threshold == 0 || backend.circuit.reset_timeout_secs == 0 {
            errors.push(ValidationError::InvalidCircuitBreaker {
                backend: backend.name.clone(),
            });
        }

        if backend.timeout_secs == 0 {
            errors.push(ValidationError::ZeroTimeout {
                backend: backend.name.clone(),
            });
        }
    }

    check_weights("global".to_string(), &config.selection.weights, &mut errors);

    if !(0.0..=1.0).contains(&config.selection.jitter_probability) {
        errors.push(ValidationError::JitterProbabilityOutOfRange {
            value: config.selection.jitter_probability,
        });
    }

    for name in &config.selection.emergency_chain {
        if !config.backends.iter().any(|b| &b.name == name) {
            errors.push(ValidationError::UnknownEmergencyBackend { name: name.clone() });
        }
    }

    let valve = &config.selection.safety_valve;
    if valve.is_empty() {
        errors.push(ValidationError::SafetyValveMissing);
    } else {
        match config.backends.iter().find(|b| &b.name == valve) {
            None => errors.push(ValidationError::UnknownSafetyValve {
                name: valve.clone(),
            }),
            Some(backend) if backend.kind != BackendKind::EmbeddedLocal => {
                errors.push(ValidationError::SafetyValveNotEmbedded {
                    name: valve.clone(),
                });
            }
            Some(_) => {}
        }
    }

    if config.health_check.interval_secs == 0 {
        errors.push(ValidationError::InvalidHealthCheck {
            field: "interval_secs",
        });
    }
    if config.health_check.timeout_secs == 0 {
        errors.push(ValidationError::InvalidHealthCheck {
            field: "timeout_secs",
        });
    }
    if config.health_check.ttl_secs == 0 {
        errors.push(ValidationError::InvalidHealthCheck { field: "ttl_secs" });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{BackendConfig, QuotaWindowConfig};

    fn valid_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.backends.push(BackendConfig {
            name: "cloud-a".into(),
            kind: BackendKind::Cloud,
            endpoint: Some("https://api.example.com/v1".into()),
            capabilities: [("reasoning".to_string(), 0.9)].into(),
            cost_per_unit: 2.0,
            weights: None,
            quotas: vec![QuotaWindowConfig {
                resource: "requests".into(),
                limit: 60,
                window_secs: 60,
            }],
            circuit: Default::default(),
            timeout_secs: 30,
        });
        config.backends.push(BackendConfig {
            name: "embedded".into(),
            kind: BackendKind::EmbeddedLocal,
            endpoint: None,
            capabilities: HashMap::new(),
            cost_per_unit: 0.0,
            weights: None,
            quotas: Vec::new(),
            circuit: Default::default(),
            timeout_secs: 10,
        });
        config.selection.safety_valve = "embedded".into();
        config
    }

    use std::collections::HashMap;

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_empty_config_fails() {
        let errors = validate_config(&EngineConfig::default()).unwrap_err();
        assert!(errors.contains(&ValidationError::NoBackends));
        assert!(errors.contains(&ValidationError::SafetyValveMissing));
    }

    #[test]
    fn test_collects_multiple_errors() {
        let mut config = valid_config();
        config.backends[0].endpoint = None;
        config.backends[0].cost_per_unit = -1.0;
        config.selection.jitter_probability = 1.5;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut config = valid_config();
        let duplicate = config.backends[0].clone();
        config.backends.push(duplicate);
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::DuplicateBackend { name } if name == "cloud-a")));
    }

    #[test]
    fn test_safety_valve_must_be_embedded() {
        let mut config = valid_config();
        config.selection.safety_valve = "cloud-a".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::SafetyValveNotEmbedded {
            name: "cloud-a".into()
        }));
    }

    #[test]
    fn test_emergency_chain_must_reference_backends() {
        let mut config = valid_config();
        config.selection.emergency_chain = vec!["ghost".into()];
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::UnknownEmergencyBackend {
            name: "ghost".into()
        }));
    }

    #[test]
    fn test_weight_sum_checked() {
        let mut config = valid_config();
        config.selection.weights = ScoringWeights {
            capability: 0.9,
            performance: 0.9,
            cost: 0.9,
        };
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::WeightSumInvalid { .. })));
    }

    #[test]
    fn test_zero_quota_window_rejected() {
        let mut config = valid_config();
        config.backends[0].quotas[0].limit = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::InvalidQuotaWindow {
            backend: "cloud-a".into(),
            resource: "requests".into()
        }));
    }
}
