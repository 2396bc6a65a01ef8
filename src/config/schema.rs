//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the caching proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the origin server requests are forwarded to.
    pub origin_url: String,

    /// Cache TTL in minutes.
    pub ttl_minutes: u64,

    /// Port to listen on (all interfaces).
    pub port: u16,

    /// Which cache store backs the proxy.
    pub cache_backend: CacheBackend,

    /// Connection URL for the Redis backend.
    pub redis_url: String,

    /// Capacity bound for the in-memory store; 0 means unbounded.
    pub max_entries: usize,

    /// Bind address for the Prometheus exporter; None disables metrics.
    pub metrics_address: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin_url: "https://httpbin.org".to_string(),
            ttl_minutes: 5,
            port: 8080,
            cache_backend: CacheBackend::Memory,
            redis_url: "redis://localhost:6379/0".to_string(),
            max_entries: 0,
            metrics_address: None,
        }
    }
}

impl Config {
    /// The configured TTL as a duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_minutes * 60)
    }

    /// Listener bind address.
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

/// Cache store selector. Chosen once at startup; no runtime switching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Process-local map, destroyed on exit.
    #[default]
    Memory,
    /// External Redis server, outlives the process.
    Redis,
}

impl std::fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackend::Memory => write!(f, "memory"),
            CacheBackend::Redis => write!(f, "redis"),
        }
    }
}
