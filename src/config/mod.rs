//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! TOML file → loader.rs (read + parse)
//!           → validation.rs (semantic checks, all errors collected)
//!           → schema.rs structs consumed by the engine at startup
//! ```
//!
//! Hot reload is deliberately out of scope; per-backend state is created
//! once from this configuration and lives for the process lifetime.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    BackendConfig, CacheConfig, CapabilityConfig, CircuitBreakerConfig, EngineConfig,
    HealthCheckConfig, ObservabilityConfig, QuotaWindowConfig, SelectionConfig,
};
pub use validation::{validate_config, ValidationError};
