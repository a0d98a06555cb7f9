//! Startup/shutdown coordination for background tasks.

mod shutdown;

pub use shutdown::Shutdown;
