//! Response memoization.
//!
//! # Data Flow
//! ```text
//! selector → fingerprint.rs (stable hash of normalized request + backend)
//!          → store.rs (key-value store trait; bundled in-memory impl)
//! ```
//!
//! # Design Decisions
//! - The engine owns the key scheme and TTL policy, not the store
//! - Cached entries are immutable once written and simply expire
//! - A cache hit short-circuits execution with no circuit/quota side effects

mod fingerprint;
pub mod store;

pub use fingerprint::RequestFingerprint;
pub use store::{CacheStore, CachedResponse, MemoryStore};

use std::sync::Arc;
use std::time::Duration;

use crate::backend::InferenceRequest;
use crate::config::CacheConfig;
use crate::observability::metrics;

/// Fingerprinted memoization of backend outputs.
pub struct ResponseCache {
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
}

impl ResponseCache {
    pub fn new(store: Arc<dyn CacheStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    /// In-memory cache with the given config; the common default.
    pub fn in_memory(config: CacheConfig) -> Self {
        Self::new(Arc::new(MemoryStore::new()), config)
    }

    pub fn fingerprint(&self, request: &InferenceRequest, backend: &str) -> RequestFingerprint {
        RequestFingerprint::compute(request, backend)
    }

    /// Look up a cached payload. Returns `None` when caching is disabled,
    /// the key is absent, or the entry expired.
    pub async fn get(&self, fingerprint: &RequestFingerprint) -> Option<Vec<u8>> {
        if !self.config.enabled {
            return None;
        }
        let payload = self.store.get(fingerprint.as_str()).await;
        match payload {
            Some(payload) => {
                metrics::record_cache_lookup(true);
                tracing::debug!(fingerprint = %fingerprint, "Response cache hit");
                Some(payload)
            }
            None => {
                metrics::record_cache_lookup(false);
                None
            }
        }
    }

    /// Store a payload under the engine's TTL policy.
    pub async fn put(&self, fingerprint: &RequestFingerprint, payload: Vec<u8>) {
        if !self.config.enabled {
            return;
        }
        self.store
            .put(
                fingerprint.as_str(),
                payload,
                Duration::from_secs(self.config.ttl_secs),
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InferenceRequest;

    fn cache(enabled: bool, ttl_secs: u64) -> ResponseCache {
        ResponseCache::in_memory(CacheConfig { enabled, ttl_secs })
    }

    #[tokio::test]
    async fn test_round_trip() {
        let cache = cache(true, 60);
        let request = InferenceRequest::new("summarize");
        let fp = cache.fingerprint(&request, "cloud-a");

        assert!(cache.get(&fp).await.is_none());
        cache.put(&fp, b"payload".to_vec()).await;
        assert_eq!(cache.get(&fp).await, Some(b"payload".to_vec()));
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let cache = cache(true, 0);
        let request = InferenceRequest::new("summarize");
        let fp = cache.fingerprint(&request, "cloud-a");

        cache.put(&fp, b"payload".to_vec()).await;
        assert!(cache.get(&fp).await.is_none());
    }

    #[tokio::test]
    async fn test_disabled_cache_never_hits() {
        let cache = cache(false, 60);
        let request = InferenceRequest::new("summarize");
        let fp = cache.fingerprint(&request, "cloud-a");

        cache.put(&fp, b"payload".to_vec()).await;
        assert!(cache.get(&fp).await.is_none());
    }
}
