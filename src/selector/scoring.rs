//! Multi-factor candidate scoring.
//!
//! # Responsibilities
//! - Combine capability, performance, and cost factors into one score
//! - Normalize cost estimates across the current candidate set
//!
//! # Design Decisions
//! - Weights are configuration (and may be overridden per backend); they are
//!   validated to sum to 1.0 at load time
//! - Performance derives from the consecutive-failure streak, so a backend
//!   that just flapped scores lower without extra bookkeeping

use serde::{Deserialize, Serialize};

/// Relative importance of the three scoring factors. Must sum to 1.0.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub capability: f64,
    pub performance: f64,
    pub cost: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            capability: 0.5,
            performance: 0.3,
            cost: 0.2,
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.capability + self.performance + self.cost
    }
}

/// Performance factor from the backend's consecutive failure streak:
/// 1.0 with no recent failures, decaying toward 0 as the streak grows.
pub fn performance_score(consecutive_failures: u32) -> f64 {
    1.0 / (1.0 + consecutive_failures as f64)
}

/// Normalize raw cost estimates to [0, 1] across one candidate set, with the
/// cheapest candidate at 1.0. Zero-or-negative estimates (embedded backends
/// often report no marginal cost) score a full 1.0.
pub fn cost_scores(estimates: &[f64]) -> Vec<f64> {
    let cheapest_positive = estimates
        .iter()
        .copied()
        .filter(|cost| *cost > f64::EPSILON)
        .fold(f64::INFINITY, f64::min);

    estimates
        .iter()
        .map(|&cost| {
            if cost <= f64::EPSILON {
                1.0
            } else if cheapest_positive.is_finite() {
                (cheapest_positive / cost).clamp(0.0, 1.0)
            } else {
                1.0
            }
        })
        .collect()
}

/// Weighted composite of the three factors.
pub fn composite(weights: &ScoringWeights, capability: f64, performance: f64, cost: f64) -> f64 {
    weights.capability * capability + weights.performance * performance + weights.cost * cost
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_sum_to_one() {
        assert!((ScoringWeights::default().sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_performance_decays_with_failures() {
        assert_eq!(performance_score(0), 1.0);
        assert!(performance_score(1) < performance_score(0));
        assert!(performance_score(5) < performance_score(1));
        assert!(performance_score(1000) > 0.0);
    }

    #[test]
    fn test_cheapest_candidate_scores_one() {
        let scores = cost_scores(&[2.0, 4.0, 8.0]);
        assert_eq!(scores[0], 1.0);
        assert_eq!(scores[1], 0.5);
        assert_eq!(scores[2], 0.25);
    }

    #[test]
    fn test_free_backends_score_one() {
        let scores = cost_scores(&[0.0, 3.0]);
        assert_eq!(scores[0], 1.0);
        assert_eq!(scores[1], 1.0, "only positive estimate is also cheapest");

        let all_free = cost_scores(&[0.0, 0.0]);
        assert!(all_free.iter().all(|&s| s == 1.0));
    }

    #[test]
    fn test_composite_is_weighted_sum() {
        let weights = ScoringWeights {
            capability: 0.5,
            performance: 0.3,
            cost: 0.2,
        };
        let score = composite(&weights, 1.0, 0.5, 0.0);
        assert!((score - 0.65).abs() < 1e-9);
    }
}
