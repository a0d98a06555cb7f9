//! Active availability probing.
//!
//! # Responsibilities
//! - Probe backends concurrently, bounded by the probe timeout
//! - Serve cached availability within the configured TTL
//! - Single-flight concurrent probes for the same backend
//!
//! # Design Decisions
//! - Probe failures never propagate; callers only ever see a boolean
//! - All backends are probed concurrently, so a full sweep costs as much
//!   as the slowest single probe
//! - An optional background loop keeps records warm between requests

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::watch;
use tokio::time;

use crate::backend::{BackendRegistry, BackendState};
use crate::config::HealthCheckConfig;
use crate::observability::metrics;
use crate::observability::telemetry::TelemetrySink;

pub struct AvailabilityMonitor {
    registry: Arc<BackendRegistry>,
    config: HealthCheckConfig,
    telemetry: Arc<dyn TelemetrySink>,
}

impl AvailabilityMonitor {
    pub fn new(
        registry: Arc<BackendRegistry>,
        config: HealthCheckConfig,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            registry,
            config,
            telemetry,
        }
    }

    fn ttl(&self) -> Duration {
        Duration::from_secs(self.config.ttl_secs)
    }

    /// Probe `backend` now, updating its availability record.
    pub async fn check(&self, backend: &str) -> bool {
        let Some(entry) = self.registry.get(backend) else {
            tracing::warn!(backend = %backend, "Probe requested for unknown backend");
            return false;
        };
        let _guard = entry.probe_lock.lock().await;
        self.probe_locked(&entry).await
    }

    /// Cached availability for `backend`, probing when the record is stale.
    ///
    /// Concurrent callers for the same stale backend share one probe: the
    /// first acquires the probe lock, the rest find a fresh record once the
    /// lock is released.
    pub async fn get_status(&self, backend: &str) -> bool {
        let Some(entry) = self.registry.get(backend) else {
            tracing::warn!(backend = %backend, "Status requested for unknown backend");
            return false;
        };

        if entry.availability.is_fresh(self.ttl()) {
            return entry.availability.is_available();
        }

        let _guard = entry.probe_lock.lock().await;
        if entry.availability.is_fresh(self.ttl()) {
            // Another caller probed while we waited on the lock.
            return entry.availability.is_available();
        }
        self.probe_locked(&entry).await
    }

    /// Probe every registered backend concurrently.
    pub async fn check_all(&self) {
        let entries = self.registry.all();
        join_all(entries.iter().map(|entry| async move {
            let _guard = entry.probe_lock.lock().await;
            self.probe_locked(entry).await
        }))
        .await;
    }

    /// Periodic probe loop; exits when the shutdown signal fires.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        if !self.config.enabled {
            tracing::info!("Periodic availability probing disabled");
            return;
        }

        tracing::info!(
            interval_secs = self.config.interval_secs,
            timeout_secs = self.config.timeout_secs,
            "Availability monitor starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check_all().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Availability monitor received shutdown signal, exiting loop");
                        break;
                    }
                }
            }
        }
    }

    /// Execute one probe. Caller must hold the entry's probe lock.
    async fn probe_locked(&self, entry: &BackendState) -> bool {
        let timeout = Duration::from_secs(self.config.timeout_secs);
        let started = Instant::now();

        let available = match time::timeout(timeout, entry.client.probe()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(backend = %entry.descriptor.id, error = %e, "Probe failed");
                false
            }
            Err(_) => {
                tracing::warn!(
                    backend = %entry.descriptor.id,
                    timeout_secs = self.config.timeout_secs,
                    "Probe timed out"
                );
                false
            }
        };

        metrics::record_probe(&entry.descriptor.id, available, started.elapsed());

        let flipped = entry.availability.observe(available);
        if flipped {
            tracing::info!(
                backend = %entry.descriptor.id,
                available,
                "Backend availability changed"
            );
            self.telemetry.record_event(
                "backend_availability_changed",
                &[
                    ("backend", entry.descriptor.id.clone()),
                    ("available", available.to_string()),
                ],
            );
        }
        metrics::record_backend_availability(&entry.descriptor.id, available);

        available
    }
}
