//! Key-value store contract and the bundled in-memory implementation.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// A cached payload with its expiry bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub payload: Vec<u8>,
    /// Seconds since epoch at write time.
    pub created_at: u64,
    pub ttl_secs: u64,
}

impl CachedResponse {
    pub fn new(payload: Vec<u8>, ttl: Duration) -> Self {
        Self {
            payload,
            created_at: epoch_secs(),
            ttl_secs: ttl.as_secs(),
        }
    }

    /// Check if the entry is still within its TTL.
    pub fn is_fresh(&self) -> bool {
        self.created_at + self.ttl_secs > epoch_secs()
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// External key-value store contract. The engine defines keys and TTLs; the
/// store defines persistence.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<Vec<u8>>;
    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration);
}

/// Thread-safe in-memory store with lazy expiry on read.
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, CachedResponse>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let fresh = match self.entries.get(key) {
            Some(entry) => entry.is_fresh().then(|| entry.payload.clone()),
            None => return None,
        };
        if fresh.is_none() {
            self.entries.remove(key);
        }
        fresh
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        self.entries
            .insert(key.to_string(), CachedResponse::new(value, ttl));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_round_trip() {
        let store = MemoryStore::new();
        assert!(store.get("k").await.is_none());

        store.put("k", b"v".to_vec(), Duration::from_secs(60)).await;
        assert_eq!(store.get("k").await, Some(b"v".to_vec()));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_expired_entries_are_evicted_on_read() {
        let store = MemoryStore::new();
        store.put("k", b"v".to_vec(), Duration::ZERO).await;
        assert!(store.get("k").await.is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_freshness_window() {
        let fresh = CachedResponse::new(b"v".to_vec(), Duration::from_secs(3600));
        assert!(fresh.is_fresh());

        let stale = CachedResponse {
            payload: b"v".to_vec(),
            created_at: 0,
            ttl_secs: 1,
        };
        assert!(!stale.is_fresh());
    }
}
