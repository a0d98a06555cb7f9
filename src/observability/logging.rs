//! Structured logging initialization.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured level applies to this
/// crate only. Safe to call once per process; the embedding application may
/// install its own subscriber instead.
pub fn init(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("inference_router={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .ok();
}
