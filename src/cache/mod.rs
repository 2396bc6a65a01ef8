//! Pluggable response cache.
//!
//! # Data Flow
//! ```text
//! dispatcher (GET miss)
//!     → capture.rs accumulates the streamed response
//!     → Cache::set(key, body, headers, ttl)
//!         memory.rs: insert into mutex-guarded map
//!         redis.rs:  codec.rs encode → SET with native expiry
//!
//! dispatcher (GET)
//!     → Cache::get(key)
//!         memory.rs: map lookup, lazy expiry check
//!         redis.rs:  GET → codec.rs decode
//! ```
//!
//! # Design Decisions
//! - The trait never surfaces errors: failed writes are dropped, failed or
//!   undecodable reads are misses. A broken cache degrades to an uncached
//!   proxy, never a failed request.
//! - Entries are whole responses; there is no partial population
//! - The backend is selected once at startup from config

pub mod codec;
pub mod entry;
pub mod memory;
pub mod redis;

pub use entry::CacheEntry;
pub use memory::MemoryCache;
pub use redis::RedisCache;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderMap;
use bytes::Bytes;

use crate::config::{CacheBackend, Config, ConfigError};

/// Capability set shared by the store backends.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Store a response under `key`, replacing any prior entry. The entry
    /// expires `ttl` from now.
    async fn set(&self, key: &str, body: Bytes, headers: HeaderMap, ttl: Duration);

    /// Look up a non-expired entry. Absent keys, expired entries, and every
    /// backend failure all collapse to `None`.
    async fn get(&self, key: &str) -> Option<CacheEntry>;
}

/// Build the configured cache backend.
///
/// A Redis backend that cannot be reached at startup is a fatal error; the
/// memory backend cannot fail.
pub async fn from_config(config: &Config) -> Result<Arc<dyn Cache>, ConfigError> {
    match config.cache_backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryCache::new(config.max_entries))),
        CacheBackend::Redis => {
            let cache =
                RedisCache::connect(&config.redis_url)
                    .await
                    .map_err(|source| ConfigError::Redis {
                        url: config.redis_url.clone(),
                        source,
                    })?;
            Ok(Arc::new(cache))
        }
    }
}
