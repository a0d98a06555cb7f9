//! Engine-level error taxonomy.
//!
//! The first four classes are consumed internally by the selector's fallback
//! loop; only `AllBackendsExhausted` ever escapes to the caller, carrying the
//! last underlying cause for diagnostics.

use thiserror::Error;

use crate::backend::InvocationError;

/// Errors raised while selecting or executing against backends.
#[derive(Debug, Error)]
pub enum SelectorError {
    /// The backend was probed or reported as down.
    #[error("backend '{backend}' is unavailable")]
    Availability { backend: String },

    /// A quota window for the backend is out of headroom.
    #[error("quota exceeded for backend '{backend}' on resource '{resource}'")]
    QuotaExceeded { backend: String, resource: String },

    /// The backend's circuit is open; the call was fast-failed without
    /// attempting invocation.
    #[error("circuit open for backend '{backend}'")]
    CircuitOpen { backend: String },

    /// The backend collaborator failed while executing the request.
    #[error("backend '{backend}' execution failed: {source}")]
    BackendExecution {
        backend: String,
        #[source]
        source: InvocationError,
    },

    /// Terminal: every candidate in the fallback chain was tried or gated.
    #[error("all backends exhausted after {attempts} attempts: {last_error}")]
    AllBackendsExhausted {
        attempts: u32,
        #[source]
        last_error: Box<SelectorError>,
    },
}

pub type SelectorResult<T> = Result<T, SelectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_error_carries_last_cause() {
        let err = SelectorError::AllBackendsExhausted {
            attempts: 2,
            last_error: Box::new(SelectorError::CircuitOpen {
                backend: "cloud-a".into(),
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("2 attempts"));
        assert!(msg.contains("cloud-a"));
    }
}
