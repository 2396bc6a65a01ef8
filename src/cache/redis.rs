//! Remote cache store backed by Redis.

use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use axum::http::HeaderMap;
use bytes::Bytes;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::codec;
use super::{Cache, CacheEntry};

/// Cache store delegating persistence and expiry to an external Redis server.
///
/// Entries travel as the codec's base64 text. TTL is enforced with Redis's
/// native per-key expiry, so the expiry field embedded in a stored entry is
/// ignored on read: if Redis returns a value, it is live.
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connect to the server at `url` (e.g. `redis://localhost:6379/0`).
    ///
    /// The connection manager reconnects on its own after transient failures;
    /// only the initial connection is load-bearing.
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        tracing::info!(url = %url, "Connected to redis cache backend");
        Ok(Self { conn })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn set(&self, key: &str, body: Bytes, headers: HeaderMap, ttl: Duration) {
        let entry = CacheEntry::new(body, headers, SystemTime::now() + ttl);
        let value = codec::encode(&entry);
        // Redis EX takes whole seconds; sub-second TTLs round up to one.
        let ttl_secs = ttl.as_secs().max(1);

        let mut conn = self.conn.clone();
        if let Err(e) = conn.set_ex::<_, _, ()>(key, value, ttl_secs).await {
            // The response already went to the client; a failed write only
            // costs future hit rate.
            tracing::debug!(key = %key, error = %e, "cache write dropped");
        }
    }

    async fn get(&self, key: &str) -> Option<CacheEntry> {
        let mut conn = self.conn.clone();
        let value: Option<String> = match conn.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };

        match codec::decode(value?.as_bytes()) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "stored entry undecodable, treating as miss");
                None
            }
        }
    }
}
