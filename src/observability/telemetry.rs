//! Fire-and-forget telemetry sink contract.

/// Receives engine events (selections, availability flips, failures).
///
/// Implementations must return quickly; the engine calls this inline on the
/// selection path and never awaits delivery.
pub trait TelemetrySink: Send + Sync {
    fn record_event(&self, name: &str, attributes: &[(&str, String)]);
}

/// Discards all events.
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn record_event(&self, _name: &str, _attributes: &[(&str, String)]) {}
}

/// Forwards events to the tracing pipeline at debug level.
pub struct LogTelemetry;

impl TelemetrySink for LogTelemetry {
    fn record_event(&self, name: &str, attributes: &[(&str, String)]) {
        tracing::debug!(event = %name, attributes = ?attributes, "Telemetry event");
    }
}
