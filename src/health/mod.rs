//! Backend availability tracking.
//!
//! # Data Flow
//! ```text
//! monitor.rs probes each backend (bounded by probe timeout)
//!     → AvailabilityRecord (cached boolean + consecutive failure count)
//!     → status-change events to telemetry + logs
//! Selector outcomes also feed the record, so traffic keeps it warm
//! between probe intervals.
//! ```

pub mod monitor;
mod record;

pub use monitor::AvailabilityMonitor;
pub use record::AvailabilityRecord;
