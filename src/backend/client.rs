//! The backend invocation contract.
//!
//! # Responsibilities
//! - Define the request/response shapes the engine routes
//! - Define the collaborator trait concrete backend clients implement
//! - Classify invocation failures so the selector can react per class
//!
//! # Design Decisions
//! - The engine never speaks a wire protocol; clients do
//! - Probe errors are ordinary results, mapped to a boolean by the monitor
//! - Rate-limit rejections are a distinct error class (they may or may not
//!   count toward circuit trips, depending on configuration)

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Default quota resource class charged per invocation.
pub const RESOURCE_REQUESTS: &str = "requests";

/// A normalized inference request.
///
/// Parameters live in a `BTreeMap` so iteration order is stable, which keeps
/// the cache fingerprint stable across identical requests.
#[derive(Debug, Clone)]
pub struct InferenceRequest {
    /// Correlation id, flows through logs and telemetry.
    pub id: Uuid,
    /// The prompt or task text.
    pub prompt: String,
    /// Normalized request parameters (temperature, max_tokens, ...).
    pub params: BTreeMap<String, String>,
    /// Quota resource class this request is charged against.
    pub resource: String,
    /// Optional overall deadline; an in-flight call past it is cancelled.
    pub deadline: Option<Instant>,
}

impl InferenceRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt: prompt.into(),
            params: BTreeMap::new(),
            resource: RESOURCE_REQUESTS.to_string(),
            deadline: None,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = resource.into();
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(Instant::now() + deadline);
        self
    }
}

/// A successful backend response.
#[derive(Debug, Clone)]
pub struct InvocationResponse {
    /// Opaque payload bytes; the engine caches and returns them untouched.
    pub payload: Vec<u8>,
}

impl InvocationResponse {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

/// Classified invocation failures reported by backend clients.
#[derive(Debug, Error)]
pub enum InvocationError {
    /// The call did not complete within the per-backend timeout.
    #[error("invocation timed out after {0:?}")]
    Timeout(Duration),

    /// Transport-level failure (connect refused, reset, DNS).
    #[error("connection failed: {0}")]
    Connection(String),

    /// The backend rejected the call for quota/rate reasons.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The backend accepted the call and failed while executing it.
    #[error("backend failure: {0}")]
    Failed(String),
}

impl InvocationError {
    /// Whether this failure is a quota-class rejection rather than a hard
    /// fault. The circuit breaker treats the two classes differently.
    pub fn is_quota_class(&self) -> bool {
        matches!(self, InvocationError::RateLimited(_))
    }
}

/// Contract every concrete backend client implements.
///
/// The declared capability set and quota shapes come from configuration, not
/// from this trait; the trait covers only the behavior the engine cannot
/// know statically.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// Execute an inference request.
    async fn invoke(&self, request: &InferenceRequest) -> Result<InvocationResponse, InvocationError>;

    /// Lightweight health probe. The monitor wraps this in its own timeout
    /// and maps any error to `available = false`.
    async fn probe(&self) -> Result<(), InvocationError>;

    /// Estimated cost of executing `request` on this backend.
    fn cost_estimate(&self, request: &InferenceRequest) -> f64;
}
