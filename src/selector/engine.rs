//! Candidate gating, scoring, and the fallback execution loop.
//!
//! # Responsibilities
//! - Build the gated candidate set and rank it
//! - Apply recovery jitter when the system is globally degraded
//! - Execute with cache consult, per-backend timeout, and bounded fallback
//! - Feed every outcome back into circuit, availability, and capability state
//!
//! # Design Decisions
//! - The fallback chain is an explicit ordered list consumed by one loop
//! - The selection step was already gated, so execute() re-checks gates only
//!   for fallback candidates reached after time has passed
//! - The safety valve path must always produce a selection; it is the
//!   system's last line of defense

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time;

use crate::backend::{
    BackendRegistry, BackendState, InferenceRequest, InvocationError, InvocationResponse,
};
use crate::cache::ResponseCache;
use crate::capability::{CapabilityMatrix, CapabilityRequirement};
use crate::config::SelectionConfig;
use crate::error::{SelectorError, SelectorResult};
use crate::health::AvailabilityMonitor;
use crate::observability::metrics;
use crate::observability::telemetry::TelemetrySink;
use crate::resilience::{CircuitState, FailureClass};
use crate::selector::scoring;

/// Injectable randomness for the degraded-mode jitter step.
pub trait JitterSource: Send + Sync {
    /// Return `true` with probability `p`.
    fn chance(&self, p: f64) -> bool;
}

/// Default jitter source.
pub struct FastrandJitter;

impl JitterSource for FastrandJitter {
    fn chance(&self, p: f64) -> bool {
        fastrand::f64() < p
    }
}

/// Outcome of the selection step.
#[derive(Debug, Clone)]
pub struct SelectionResult {
    pub backend: String,
    pub score: f64,
    /// True when the backend is not the globally top-ranked choice: an
    /// emergency/safety-valve pick or a jittered substitute.
    pub is_fallback: bool,
    pub required_capabilities: Vec<CapabilityRequirement>,
}

/// A served payload plus the metadata callers surface to users.
#[derive(Debug, Clone)]
pub struct ServedResponse {
    pub payload: Vec<u8>,
    pub backend: String,
    pub is_fallback: bool,
    pub from_cache: bool,
}

struct RankedCandidate {
    entry: Arc<BackendState>,
    score: f64,
}

/// Composes circuit, quota, availability, capability, and cache state to
/// route one request to the best backend currently able to serve it.
pub struct BackendSelector {
    registry: Arc<BackendRegistry>,
    monitor: Arc<AvailabilityMonitor>,
    matrix: Arc<CapabilityMatrix>,
    cache: Arc<ResponseCache>,
    config: SelectionConfig,
    jitter: Box<dyn JitterSource>,
    telemetry: Arc<dyn TelemetrySink>,
}

impl BackendSelector {
    pub fn new(
        registry: Arc<BackendRegistry>,
        monitor: Arc<AvailabilityMonitor>,
        matrix: Arc<CapabilityMatrix>,
        cache: Arc<ResponseCache>,
        config: SelectionConfig,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            registry,
            monitor,
            matrix,
            cache,
            config,
            jitter: Box::new(FastrandJitter),
            telemetry,
        }
    }

    /// Replace the randomness source; tests use this to force both jitter
    /// branches deterministically.
    pub fn with_jitter(mut self, jitter: Box<dyn JitterSource>) -> Self {
        self.jitter = jitter;
        self
    }

    /// Pick the backend for a request.
    ///
    /// Never fails: when every gate closes, the emergency chain and finally
    /// the designated embedded safety valve still yield a selection.
    pub async fn select(
        &self,
        required: &[CapabilityRequirement],
        request: &InferenceRequest,
    ) -> SelectionResult {
        let ranked = self.rank_candidates(required, request).await;

        if ranked.is_empty() {
            return self.select_emergency(required).await;
        }

        let mut choice = 0;
        let mut substituted = false;
        if ranked.len() > 1
            && self.degraded()
            && self.jitter.chance(self.config.jitter_probability)
        {
            // Spread recovery traffic: send a fraction of requests to the
            // runner-up instead of rushing the just-recovered top choice.
            choice = 1;
            substituted = true;
        }

        let winner = &ranked[choice];
        let backend = winner.entry.descriptor.id.clone();
        tracing::debug!(
            request_id = %request.id,
            backend = %backend,
            score = winner.score,
            substituted,
            candidates = ranked.len(),
            "Backend selected"
        );
        metrics::record_selection(&backend, substituted);
        self.telemetry.record_event(
            "backend_selected",
            &[
                ("backend", backend.clone()),
                ("substituted", substituted.to_string()),
            ],
        );

        SelectionResult {
            backend,
            score: winner.score,
            is_fallback: substituted,
            required_capabilities: required.to_vec(),
        }
    }

    /// Execute a selection, consulting the cache first and walking the
    /// fallback chain on failure.
    pub async fn execute(
        &self,
        selection: &SelectionResult,
        request: &InferenceRequest,
    ) -> SelectorResult<ServedResponse> {
        let mut chain: Vec<Arc<BackendState>> = Vec::new();
        if let Some(entry) = self.registry.get(&selection.backend) {
            chain.push(entry);
        }
        for candidate in self
            .rank_candidates(&selection.required_capabilities, request)
            .await
        {
            if candidate.entry.descriptor.id != selection.backend {
                chain.push(candidate.entry);
            }
        }
        chain.truncate(1 + self.config.max_fallback_attempts as usize);

        let mut attempts: u32 = 0;
        let mut last_error: Option<SelectorError> = None;

        for (index, entry) in chain.iter().enumerate() {
            let id = entry.descriptor.id.clone();
            let is_fallback = index > 0 || selection.is_fallback;

            // The selection itself was already gated (or deliberately
            // ungated by the emergency path). Fallback candidates are
            // re-checked here because state may have moved since ranking.
            if index > 0 {
                if !entry.circuit.allow_request() {
                    last_error = Some(SelectorError::CircuitOpen { backend: id });
                    continue;
                }
                if !entry.quota.can_proceed(&request.resource) {
                    last_error = Some(SelectorError::QuotaExceeded {
                        backend: id,
                        resource: request.resource.clone(),
                    });
                    continue;
                }
                if !self.monitor.get_status(&id).await {
                    last_error = Some(SelectorError::Availability { backend: id });
                    continue;
                }
            }

            let fingerprint = self.cache.fingerprint(request, &id);
            if let Some(payload) = self.cache.get(&fingerprint).await {
                // Cache hits have no side effects on circuit or quota state.
                return Ok(ServedResponse {
                    payload,
                    backend: id,
                    is_fallback,
                    from_cache: true,
                });
            }

            attempts += 1;
            entry.quota.record(&request.resource);

            match self.invoke_with_timeout(entry, request).await {
                Ok(response) => {
                    entry.circuit.record_success();
                    entry.availability.observe(true);
                    for requirement in &selection.required_capabilities {
                        self.matrix.adjust(&id, &requirement.name, true);
                    }
                    self.cache.put(&fingerprint, response.payload.clone()).await;
                    metrics::record_backend_outcome(&id, true);
                    metrics::record_circuit_state(&id, entry.circuit.state());
                    tracing::info!(
                        request_id = %request.id,
                        backend = %id,
                        attempt = index + 1,
                        is_fallback,
                        "Request served"
                    );
                    return Ok(ServedResponse {
                        payload: response.payload,
                        backend: id,
                        is_fallback,
                        from_cache: false,
                    });
                }
                Err(error) => {
                    let class = if error.is_quota_class() {
                        FailureClass::Quota
                    } else {
                        FailureClass::Hard
                    };
                    entry.circuit.record_failure(class);
                    if class == FailureClass::Hard {
                        // A quota rejection says nothing about reachability.
                        entry.availability.observe(false);
                    }
                    for requirement in &selection.required_capabilities {
                        self.matrix.adjust(&id, &requirement.name, false);
                    }
                    metrics::record_backend_outcome(&id, false);
                    metrics::record_circuit_state(&id, entry.circuit.state());
                    tracing::warn!(
                        request_id = %request.id,
                        backend = %id,
                        attempt = index + 1,
                        error = %error,
                        "Backend invocation failed, advancing fallback chain"
                    );
                    self.telemetry.record_event(
                        "backend_invocation_failed",
                        &[("backend", id.clone()), ("error", error.to_string())],
                    );
                    last_error = Some(SelectorError::BackendExecution {
                        backend: id,
                        source: error,
                    });
                }
            }
        }

        metrics::record_requests_exhausted();
        let last_error = last_error.unwrap_or(SelectorError::Availability {
            backend: selection.backend.clone(),
        });
        tracing::error!(
            request_id = %request.id,
            attempts,
            error = %last_error,
            "All backends exhausted"
        );
        Err(SelectorError::AllBackendsExhausted {
            attempts,
            last_error: Box::new(last_error),
        })
    }

    /// Select and execute in one step.
    pub async fn route(
        &self,
        required: &[CapabilityRequirement],
        request: &InferenceRequest,
    ) -> SelectorResult<ServedResponse> {
        let selection = self.select(required, request).await;
        self.execute(&selection, request).await
    }

    /// Gate every backend and rank survivors by composite score, best first.
    async fn rank_candidates(
        &self,
        required: &[CapabilityRequirement],
        request: &InferenceRequest,
    ) -> Vec<RankedCandidate> {
        let mut gated = Vec::new();
        for entry in self.registry.all() {
            let id = &entry.descriptor.id;
            if !entry.circuit.allow_request() {
                metrics::record_gate_skip(id, "circuit");
                continue;
            }
            if !entry.quota.can_proceed(&request.resource) {
                metrics::record_gate_skip(id, "quota");
                continue;
            }
            if !self.monitor.get_status(id).await {
                metrics::record_gate_skip(id, "availability");
                continue;
            }
            gated.push(entry);
        }
        if gated.is_empty() {
            return Vec::new();
        }

        let estimates: Vec<f64> = gated
            .iter()
            .map(|entry| entry.descriptor.cost_per_unit * entry.client.cost_estimate(request))
            .collect();
        let cost_scores = scoring::cost_scores(&estimates);

        let mut ranked: Vec<RankedCandidate> = gated
            .into_iter()
            .zip(cost_scores)
            .map(|(entry, cost)| {
                let weights = entry
                    .descriptor
                    .weights
                    .as_ref()
                    .unwrap_or(&self.config.weights);
                let capability = self.matrix.score_backend(&entry.descriptor.id, required);
                let performance =
                    scoring::performance_score(entry.availability.consecutive_failures());
                let score = scoring::composite(weights, capability, performance, cost);
                RankedCandidate { entry, score }
            })
            .collect();
        // Stable sort keeps registration order on ties.
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }

    /// Empty candidate set: walk the emergency chain ignoring circuit and
    /// quota gates, then fall through to the safety valve unconditionally.
    async fn select_emergency(&self, required: &[CapabilityRequirement]) -> SelectionResult {
        for id in &self.config.emergency_chain {
            if !self.registry.contains(id) {
                continue;
            }
            if self.monitor.get_status(id).await {
                tracing::warn!(
                    backend = %id,
                    "Emergency chain selection; circuit and quota gating bypassed"
                );
                metrics::record_selection(id, true);
                self.telemetry
                    .record_event("emergency_selection", &[("backend", id.clone())]);
                return SelectionResult {
                    backend: id.clone(),
                    score: self.matrix.score_backend(id, required),
                    is_fallback: true,
                    required_capabilities: required.to_vec(),
                };
            }
        }

        let id = self.config.safety_valve.clone();
        tracing::warn!(
            backend = %id,
            "Safety valve selection; candidate set and emergency chain exhausted"
        );
        metrics::record_selection(&id, true);
        self.telemetry
            .record_event("safety_valve_selection", &[("backend", id.clone())]);
        SelectionResult {
            backend: id.clone(),
            score: self.matrix.score_backend(&id, required),
            is_fallback: true,
            required_capabilities: required.to_vec(),
        }
    }

    /// Recently-failed backend count at or past the configured threshold
    /// marks the whole system degraded.
    fn degraded(&self) -> bool {
        let recently_failed = self
            .registry
            .all()
            .iter()
            .filter(|entry| {
                entry.circuit.state() != CircuitState::Closed
                    || entry.circuit.failure_count() > 0
                    || entry.availability.consecutive_failures() > 0
            })
            .count();
        recently_failed >= self.config.degraded_backend_threshold
    }

    /// Invoke under the per-backend timeout, clamped to the request's
    /// remaining overall deadline. An elapsed timeout cancels the in-flight
    /// call and counts as a failure for fallback purposes.
    async fn invoke_with_timeout(
        &self,
        entry: &BackendState,
        request: &InferenceRequest,
    ) -> Result<InvocationResponse, InvocationError> {
        let mut budget = entry.descriptor.timeout;
        if let Some(deadline) = request.deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(InvocationError::Timeout(Duration::ZERO));
            }
            budget = budget.min(remaining);
        }
        match time::timeout(budget, entry.client.invoke(request)).await {
            Ok(result) => result,
            Err(_) => Err(InvocationError::Timeout(budget)),
        }
    }
}
