//! The unit of storage shared by all cache backends.

use std::time::SystemTime;

use axum::http::HeaderMap;
use bytes::Bytes;

/// A single cached response.
///
/// Immutable after creation; a write for the same key replaces the whole
/// entry. The status code is not stored: cached responses are always served
/// as 200 with the recorded headers and body.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Full response payload, never partial.
    pub body: Bytes,
    /// Headers exactly as sent to the client, repeated names preserved.
    pub headers: HeaderMap,
    /// Absolute instant after which the entry is logically absent.
    pub expires_at: SystemTime,
}

impl CacheEntry {
    pub fn new(body: Bytes, headers: HeaderMap, expires_at: SystemTime) -> Self {
        Self {
            body,
            headers,
            expires_at,
        }
    }

    /// Whether the entry is stale as of `now`.
    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expires_at <= now
    }
}
