//! Shared utilities for integration testing.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use inference_router::backend::BackendKind;
use inference_router::config::{BackendConfig, EngineConfig, QuotaWindowConfig};
use inference_router::observability::TelemetrySink;
use inference_router::selector::JitterSource;
use inference_router::{BackendClient, InferenceRequest, InvocationError, InvocationResponse};

/// Scripted outcome for one invocation.
#[allow(dead_code)]
pub enum Step {
    Ok,
    Fail,
    RateLimited,
    /// Never completes on its own; exercises the per-backend timeout.
    Hang,
}

/// Programmable mock backend client.
pub struct ScriptedBackend {
    name: String,
    cost: f64,
    available: AtomicBool,
    calls: AtomicU32,
    probes: AtomicU32,
    script: Mutex<VecDeque<Step>>,
}

#[allow(dead_code)]
impl ScriptedBackend {
    /// A backend that answers every probe and invocation successfully.
    pub fn healthy(name: &str, cost: f64) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            cost,
            available: AtomicBool::new(true),
            calls: AtomicU32::new(0),
            probes: AtomicU32::new(0),
            script: Mutex::new(VecDeque::new()),
        })
    }

    /// Queue scripted outcomes; once drained, invocations succeed again.
    pub fn push(&self, step: Step) {
        self.script.lock().unwrap().push_back(step);
    }

    pub fn fail_next(&self, n: usize) {
        for _ in 0..n {
            self.push(Step::Fail);
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> u32 {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BackendClient for ScriptedBackend {
    async fn invoke(
        &self,
        _request: &InferenceRequest,
    ) -> Result<InvocationResponse, InvocationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.script.lock().unwrap().pop_front();
        match step {
            None | Some(Step::Ok) => {
                Ok(InvocationResponse::new(format!("{} response", self.name)))
            }
            Some(Step::Fail) => Err(InvocationError::Failed("scripted failure".into())),
            Some(Step::RateLimited) => Err(InvocationError::RateLimited("scripted 429".into())),
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(InvocationError::Failed("hang elapsed".into()))
            }
        }
    }

    async fn probe(&self) -> Result<(), InvocationError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(InvocationError::Connection("probe refused".into()))
        }
    }

    fn cost_estimate(&self, _request: &InferenceRequest) -> f64 {
        self.cost
    }
}

/// Jitter source pinned to one branch.
#[allow(dead_code)]
pub struct FixedJitter(pub bool);

impl JitterSource for FixedJitter {
    fn chance(&self, _p: f64) -> bool {
        self.0
    }
}

/// Telemetry sink that records event names.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl RecordingTelemetry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(&self, name: &str) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.as_str() == name)
            .count()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn record_event(&self, name: &str, _attributes: &[(&str, String)]) {
        self.events.lock().unwrap().push(name.to_string());
    }
}

/// Backend config with the given capability scores and defaults everywhere
/// else. Networked kinds get a placeholder endpoint.
#[allow(dead_code)]
pub fn backend_config(name: &str, kind: BackendKind, capabilities: &[(&str, f64)]) -> BackendConfig {
    let endpoint = match kind {
        BackendKind::EmbeddedLocal => None,
        _ => Some(format!("http://127.0.0.1:9/{}", name)),
    };
    BackendConfig {
        name: name.to_string(),
        kind,
        endpoint,
        capabilities: capabilities
            .iter()
            .map(|(cap, score)| (cap.to_string(), *score))
            .collect(),
        cost_per_unit: 1.0,
        weights: None,
        quotas: Vec::new(),
        circuit: Default::default(),
        timeout_secs: 5,
    }
}

#[allow(dead_code)]
pub fn quota(resource: &str, limit: u32, window_secs: u64) -> QuotaWindowConfig {
    QuotaWindowConfig {
        resource: resource.to_string(),
        limit,
        window_secs,
    }
}

/// Three-backend fleet: cloud "a" (0.9), networked "b" (0.7), embedded "c"
/// (0.5, the safety valve), all declaring "reasoning".
#[allow(dead_code)]
pub fn three_backend_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.backends.push(backend_config(
        "a",
        BackendKind::Cloud,
        &[("reasoning", 0.9)],
    ));
    config.backends.push(backend_config(
        "b",
        BackendKind::NetworkedLocal,
        &[("reasoning", 0.7)],
    ));
    config.backends.push(backend_config(
        "c",
        BackendKind::EmbeddedLocal,
        &[("reasoning", 0.5)],
    ));
    config.selection.safety_valve = "c".to_string();
    config
}

/// One healthy client per backend in `config`.
#[allow(dead_code)]
pub fn healthy_clients(config: &EngineConfig) -> (HashMap<String, Arc<dyn BackendClient>>, HashMap<String, Arc<ScriptedBackend>>) {
    let mut clients: HashMap<String, Arc<dyn BackendClient>> = HashMap::new();
    let mut scripted = HashMap::new();
    for backend in &config.backends {
        let client = ScriptedBackend::healthy(&backend.name, 1.0);
        scripted.insert(backend.name.clone(), client.clone());
        clients.insert(backend.name.clone(), client);
    }
    (clients, scripted)
}
