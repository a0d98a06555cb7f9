//! Backend selection engine.
//!
//! # Data Flow
//! ```text
//! select():
//!     registry → circuit/quota/availability gates → candidate set
//!     candidate set → scoring.rs (capability · performance · cost) → winner
//!     empty set → emergency chain → embedded safety valve (never fails)
//! execute():
//!     cache consult → invoke under timeout → outcome feedback
//!     failure → next candidate in the fallback chain (bounded)
//! ```

pub mod engine;
pub mod scoring;

pub use engine::{
    BackendSelector, FastrandJitter, JitterSource, SelectionResult, ServedResponse,
};
pub use scoring::ScoringWeights;
