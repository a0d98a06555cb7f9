//! Backend abstractions.
//!
//! # Data Flow
//! ```text
//! config::BackendConfig ──▶ descriptor.rs (immutable identity + capability set)
//!                           client.rs     (invocation contract, implemented by callers)
//!                           registry.rs   (per-backend mutable state, process lifetime)
//! ```
//!
//! # Design Decisions
//! - One registry entry per backend, created at startup, never dropped by traffic
//! - Per-backend behavioral variation (weights, quotas, thresholds) is config data
//! - The invocation client is a trait so the engine stays free of wire protocols

pub mod client;
pub mod descriptor;
pub mod registry;

pub use client::{BackendClient, InferenceRequest, InvocationError, InvocationResponse};
pub use descriptor::{BackendDescriptor, BackendKind};
pub use registry::{BackendRegistry, BackendState};
