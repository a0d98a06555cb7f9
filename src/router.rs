//! Engine assembly.
//!
//! # Responsibilities
//! - Validate configuration and wire every subsystem together
//! - Pair each configured backend with its client implementation
//! - Own the shutdown handle for the background probe loop
//!
//! # Design Decisions
//! - Assembly fails fast: a config error or missing client stops startup
//! - All shared state is created here once; nothing global

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::backend::{BackendClient, BackendRegistry, InferenceRequest};
use crate::cache::{CacheStore, MemoryStore, ResponseCache};
use crate::capability::{CapabilityMatrix, CapabilityRequirement};
use crate::config::{validate_config, EngineConfig, ValidationError};
use crate::error::SelectorResult;
use crate::health::AvailabilityMonitor;
use crate::lifecycle::Shutdown;
use crate::observability::telemetry::{NoopTelemetry, TelemetrySink};
use crate::selector::{BackendSelector, JitterSource, SelectionResult, ServedResponse};

/// Errors raised while assembling the engine.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("configuration invalid: {0:?}")]
    InvalidConfig(Vec<ValidationError>),

    #[error("no client registered for configured backend '{backend}'")]
    MissingClient { backend: String },
}

/// Fully wired routing engine.
///
/// Construct once at startup with one client per configured backend, then
/// share behind an `Arc` across request handlers.
pub struct InferenceRouter {
    registry: Arc<BackendRegistry>,
    monitor: Arc<AvailabilityMonitor>,
    matrix: Arc<CapabilityMatrix>,
    selector: BackendSelector,
    shutdown: Shutdown,
}

impl std::fmt::Debug for InferenceRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceRouter").finish_non_exhaustive()
    }
}

impl InferenceRouter {
    /// Assemble with the bundled in-memory cache store and no telemetry.
    pub fn new(
        config: EngineConfig,
        clients: HashMap<String, Arc<dyn BackendClient>>,
    ) -> Result<Self, BuildError> {
        Self::with_collaborators(
            config,
            clients,
            Arc::new(MemoryStore::new()),
            Arc::new(NoopTelemetry),
        )
    }

    /// Assemble with an external cache store and telemetry sink.
    pub fn with_collaborators(
        config: EngineConfig,
        clients: HashMap<String, Arc<dyn BackendClient>>,
        store: Arc<dyn CacheStore>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Result<Self, BuildError> {
        validate_config(&config).map_err(BuildError::InvalidConfig)?;

        let mut registry = BackendRegistry::new();
        for backend_config in &config.backends {
            let client =
                clients
                    .get(&backend_config.name)
                    .cloned()
                    .ok_or_else(|| BuildError::MissingClient {
                        backend: backend_config.name.clone(),
                    })?;
            registry.register(backend_config, client);
        }
        let registry = Arc::new(registry);

        let matrix = Arc::new(CapabilityMatrix::new(config.capability.clone()));
        for backend_config in &config.backends {
            matrix.seed(&backend_config.name, &backend_config.capabilities);
        }

        let monitor = Arc::new(AvailabilityMonitor::new(
            registry.clone(),
            config.health_check.clone(),
            telemetry.clone(),
        ));
        let cache = Arc::new(ResponseCache::new(store, config.cache.clone()));
        let selector = BackendSelector::new(
            registry.clone(),
            monitor.clone(),
            matrix.clone(),
            cache,
            config.selection.clone(),
            telemetry,
        );

        tracing::info!(
            backends = registry.len(),
            safety_valve = %config.selection.safety_valve,
            "Inference router assembled"
        );

        Ok(Self {
            registry,
            monitor,
            matrix,
            selector,
            shutdown: Shutdown::new(),
        })
    }

    /// Replace the jitter randomness source (deterministic tests).
    pub fn with_jitter(mut self, jitter: Box<dyn JitterSource>) -> Self {
        self.selector = self.selector.with_jitter(jitter);
        self
    }

    /// Pick a backend for a request.
    pub async fn select(
        &self,
        required: &[CapabilityRequirement],
        request: &InferenceRequest,
    ) -> SelectionResult {
        self.selector.select(required, request).await
    }

    /// Execute a prior selection.
    pub async fn execute(
        &self,
        selection: &SelectionResult,
        request: &InferenceRequest,
    ) -> SelectorResult<ServedResponse> {
        self.selector.execute(selection, request).await
    }

    /// Select and execute in one step.
    pub async fn route(
        &self,
        required: &[CapabilityRequirement],
        request: &InferenceRequest,
    ) -> SelectorResult<ServedResponse> {
        self.selector.route(required, request).await
    }

    /// Spawn the periodic availability probe loop. Stop it via `shutdown()`.
    pub fn spawn_probe_loop(&self) -> JoinHandle<()> {
        let monitor = self.monitor.clone();
        let receiver = self.shutdown.subscribe();
        tokio::spawn(async move { monitor.run(receiver).await })
    }

    /// Signal background tasks to stop.
    pub fn shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Administrative reset of one backend's circuit/quota/availability
    /// state. Returns false for unknown backends.
    pub fn reset_backend(&self, id: &str) -> bool {
        self.registry.reset(id)
    }

    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    pub fn monitor(&self) -> &Arc<AvailabilityMonitor> {
        &self.monitor
    }

    pub fn capability_matrix(&self) -> &Arc<CapabilityMatrix> {
        &self.matrix
    }
}
