//! Resilient backend selection engine for heterogeneous AI-model backends.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                INFERENCE ROUTER               │
//!                        │                                               │
//!     InferenceRequest   │  ┌──────────┐   gates   ┌─────────────────┐  │
//!     ───────────────────┼─▶│ selector │◀──────────│ circuit breaker │  │
//!                        │  │  engine  │           │ quota windows   │  │
//!                        │  └────┬─────┘           │ availability    │  │
//!                        │       │ score           └─────────────────┘  │
//!                        │       ▼                                      │
//!                        │  ┌──────────┐  consult  ┌─────────────────┐  │
//!                        │  │capability│           │ response cache  │  │
//!                        │  │  matrix  │           │ (fingerprinted) │  │
//!                        │  └──────────┘           └─────────────────┘  │
//!                        │       │ invoke under timeout                 │
//!     ServedResponse     │       ▼                                      │
//!     ◀──────────────────┼── BackendClient (cloud / networked / embedded)
//!                        └──────────────────────────────────────────────┘
//! ```
//!
//! The engine is a library: the API layer in front of it and the concrete
//! backend clients behind it are collaborators supplied by the embedding
//! application. Selection composes three gates (circuit breaker, quota
//! windows, availability) with multi-factor scoring; execution walks an
//! explicit fallback chain and feeds every outcome back into the gates.

// Core subsystems
pub mod backend;
pub mod config;
pub mod router;
pub mod selector;

// Per-backend state machines
pub mod capability;
pub mod health;
pub mod quota;
pub mod resilience;

// Cross-cutting concerns
pub mod cache;
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use backend::{BackendClient, InferenceRequest, InvocationError, InvocationResponse};
pub use capability::CapabilityRequirement;
pub use config::{load_config, EngineConfig};
pub use error::{SelectorError, SelectorResult};
pub use router::{BuildError, InferenceRouter};
pub use selector::{BackendSelector, SelectionResult, ServedResponse};
