//! Shutdown signal for the background probe loop.

use tokio::sync::watch;

/// Coordinator for stopping background tasks.
///
/// Wraps a watch channel: subscribers observe the flag flipping to `true`
/// and exit their loops. Late subscribers see the current value immediately,
/// so a task spawned after `trigger()` still shuts down.
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Flip the signal. Idempotent.
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_observe_trigger() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        assert!(!*rx.borrow());

        shutdown.trigger();
        rx.changed().await.unwrap();
        assert!(*rx.borrow());
        assert!(shutdown.is_triggered());
    }

    #[test]
    fn test_late_subscriber_sees_current_value() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let rx = shutdown.subscribe();
        assert!(*rx.borrow());
    }
}
