//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → selector enforces the per-backend execution timeout
//!     → On failure: selector advances along the fallback chain
//!     → circuit_breaker.rs (track failures, open circuit at threshold)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every backend call has a deadline
//! - The fallback chain is an explicit ordered list, not nested handlers
//! - Circuit breaker prevents hammering a backend that is already down

pub mod circuit_breaker;

pub use circuit_breaker::{CircuitBreaker, CircuitState, FailureClass};
