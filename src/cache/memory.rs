//! Process-local cache store.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use axum::http::HeaderMap;
use bytes::Bytes;

use super::{Cache, CacheEntry};

/// In-memory store guarded by a single mutex covering both paths.
///
/// Expiration is lazy: `get` treats a stale entry as absent but leaves it in
/// the map until it is overwritten or evicted by the capacity bound. There is
/// no background sweep; with `max_entries == 0` the map grows with unique
/// keys for the process lifetime.
pub struct MemoryCache {
    store: Mutex<HashMap<String, CacheEntry>>,
    /// Capacity bound enforced on insert; 0 means unbounded.
    max_entries: usize,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            store: Mutex::new(HashMap::new()),
            max_entries,
        }
    }

    /// Make room for one more entry. Expired entries go first; if the map is
    /// still full, the entry closest to expiry is dropped. Caller holds the
    /// lock.
    fn make_room(store: &mut HashMap<String, CacheEntry>, max_entries: usize, now: SystemTime) {
        if store.len() < max_entries {
            return;
        }
        store.retain(|_, entry| !entry.is_expired(now));
        while store.len() >= max_entries {
            let victim = store
                .iter()
                .min_by_key(|(_, entry)| entry.expires_at)
                .map(|(key, _)| key.clone());
            match victim {
                Some(key) => {
                    tracing::debug!(key = %key, "evicting entry over capacity bound");
                    store.remove(&key);
                }
                None => break,
            }
        }
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn set(&self, key: &str, body: Bytes, headers: HeaderMap, ttl: Duration) {
        let now = SystemTime::now();
        let entry = CacheEntry::new(body, headers, now + ttl);

        let mut store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        // Replacing an existing key never grows the map.
        if self.max_entries > 0 && !store.contains_key(key) {
            Self::make_room(&mut store, self.max_entries, now);
        }
        store.insert(key.to_string(), entry);
    }

    async fn get(&self, key: &str) -> Option<CacheEntry> {
        let store = self.store.lock().unwrap_or_else(|e| e.into_inner());
        store
            .get(key)
            .filter(|entry| !entry.is_expired(SystemTime::now()))
            .cloned()
    }
}
