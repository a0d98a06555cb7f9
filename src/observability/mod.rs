//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauges, histograms via the metrics facade)
//!     → telemetry.rs (fire-and-forget events to an injected sink)
//! ```
//!
//! # Design Decisions
//! - Metric updates are cheap and unconditional; exporters are the
//!   embedding application's concern
//! - Telemetry never blocks selection; the bundled sinks are synchronous
//!   and trivially fast

pub mod logging;
pub mod metrics;
pub mod telemetry;

pub use telemetry::{LogTelemetry, NoopTelemetry, TelemetrySink};
