//! Process-wide registry of per-backend mutable state.
//!
//! # Responsibilities
//! - Hold one entry per backend: circuit, quota windows, availability record
//! - Create all entries at startup; entries live for the process lifetime
//! - Route administrative resets to individual entries
//!
//! # Design Decisions
//! - Explicit registry passed as a dependency, never module-level globals
//! - Entries are `Arc`ed so request flows hold them across await points
//! - Iteration order is insertion order, keeping selection deterministic
//!   when scores tie

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::backend::client::BackendClient;
use crate::backend::descriptor::BackendDescriptor;
use crate::config::BackendConfig;
use crate::health::AvailabilityRecord;
use crate::quota::QuotaTracker;
use crate::resilience::CircuitBreaker;

/// All state the engine keeps for one backend.
pub struct BackendState {
    pub descriptor: BackendDescriptor,
    pub client: Arc<dyn BackendClient>,
    pub circuit: CircuitBreaker,
    pub quota: QuotaTracker,
    pub availability: AvailabilityRecord,
    /// Serializes probes so concurrent checks share one in-flight probe.
    pub probe_lock: Mutex<()>,
}

impl BackendState {
    fn new(config: &BackendConfig, client: Arc<dyn BackendClient>) -> Self {
        Self {
            descriptor: BackendDescriptor::from_config(config),
            client,
            circuit: CircuitBreaker::new(config.circuit.clone()),
            quota: QuotaTracker::from_configs(&config.quotas),
            availability: AvailabilityRecord::new(),
            probe_lock: Mutex::new(()),
        }
    }
}

/// Registry of backend entries keyed by backend id.
pub struct BackendRegistry {
    entries: DashMap<String, Arc<BackendState>>,
    order: Vec<String>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            order: Vec::new(),
        }
    }

    /// Register a backend. Called once per backend during startup assembly;
    /// registering the same id twice replaces the entry.
    pub fn register(&mut self, config: &BackendConfig, client: Arc<dyn BackendClient>) {
        let id = config.name.clone();
        if self.entries.insert(id.clone(), Arc::new(BackendState::new(config, client))).is_none() {
            self.order.push(id);
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<BackendState>> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// All entries in registration order.
    pub fn all(&self) -> Vec<Arc<BackendState>> {
        self.order.iter().filter_map(|id| self.get(id)).collect()
    }

    pub fn ids(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Administrative reset of one backend's circuit, quota, and
    /// availability state. The only sanctioned way to clear state outside
    /// normal traffic.
    pub fn reset(&self, id: &str) -> bool {
        match self.get(id) {
            Some(entry) => {
                entry.circuit.reset();
                entry.quota.reset();
                entry.availability.reset();
                tracing::info!(backend = %id, "Backend state reset by administrative action");
                true
            }
            None => false,
        }
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}
