//! Metrics collection.
//!
//! # Metrics
//! - `router_selections_total` (counter): selections by backend, substituted
//! - `router_backend_outcomes_total` (counter): invocation results by backend
//! - `router_gate_skips_total` (counter): candidates skipped by gate
//! - `router_circuit_state` (gauge): 0=closed, 1=open, 2=half-open
//! - `router_backend_available` (gauge): 1=available, 0=down
//! - `router_probe_duration_seconds` (histogram): probe latency
//! - `router_cache_lookups_total` (counter): hits and misses
//! - `router_requests_exhausted_total` (counter): terminal failures
//!
//! # Design Decisions
//! - Labels carry backend id and outcome; cardinality stays bounded by the
//!   fixed backend set
//! - Recording is unconditional; an absent recorder makes these no-ops

use std::time::Duration;

use metrics::{counter, gauge, histogram};

use crate::resilience::CircuitState;

pub fn record_selection(backend: &str, substituted: bool) {
    counter!(
        "router_selections_total",
        "backend" => backend.to_string(),
        "substituted" => substituted.to_string()
    )
    .increment(1);
}

pub fn record_backend_outcome(backend: &str, success: bool) {
    counter!(
        "router_backend_outcomes_total",
        "backend" => backend.to_string(),
        "outcome" => if success { "success" } else { "failure" }
    )
    .increment(1);
}

pub fn record_gate_skip(backend: &str, gate: &'static str) {
    counter!(
        "router_gate_skips_total",
        "backend" => backend.to_string(),
        "gate" => gate
    )
    .increment(1);
}

pub fn record_circuit_state(backend: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::Open => 1.0,
        CircuitState::HalfOpen => 2.0,
    };
    gauge!("router_circuit_state", "backend" => backend.to_string()).set(value);
}

pub fn record_backend_availability(backend: &str, available: bool) {
    gauge!("router_backend_available", "backend" => backend.to_string())
        .set(if available { 1.0 } else { 0.0 });
}

pub fn record_probe(backend: &str, available: bool, latency: Duration) {
    histogram!(
        "router_probe_duration_seconds",
        "backend" => backend.to_string(),
        "result" => if available { "up" } else { "down" }
    )
    .record(latency.as_secs_f64());
}

pub fn record_cache_lookup(hit: bool) {
    counter!(
        "router_cache_lookups_total",
        "result" => if hit { "hit" } else { "miss" }
    )
    .increment(1);
}

pub fn record_requests_exhausted() {
    counter!("router_requests_exhausted_total").increment(1);
}
