//! Configuration loading from environment variables.

use std::env;

use url::Url;

use crate::config::schema::{CacheBackend, Config};

/// Recognized environment variables.
const ORIGIN_URL: &str = "ORIGIN_URL";
const TTL_MINUTES: &str = "TTL_MINUTES";
const PORT: &str = "PORT";
const CACHE_TYPE: &str = "CACHE_TYPE";
const REDIS_URL: &str = "REDIS_URL";
const MAX_ENTRIES: &str = "MAX_ENTRIES";
const METRICS_ADDRESS: &str = "METRICS_ADDRESS";

/// Error type for configuration loading. Always fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is not a valid number: '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("CACHE_TYPE must be 'memory' or 'redis', got '{0}'")]
    InvalidBackend(String),

    #[error("ORIGIN_URL is not a valid URL: {0}")]
    InvalidOrigin(url::ParseError),

    #[error("failed to connect to redis at '{url}': {source}")]
    Redis {
        url: String,
        source: redis::RedisError,
    },
}

/// Load and validate configuration from the process environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_from(|var| env::var(var).ok())
}

/// Load configuration through an arbitrary variable source.
///
/// Unset and empty variables fall back to defaults.
fn load_from(get: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
    let defaults = Config::default();
    let get = |var: &str| get(var).filter(|v| !v.is_empty());

    let origin_url = get(ORIGIN_URL).unwrap_or(defaults.origin_url);
    Url::parse(&origin_url).map_err(ConfigError::InvalidOrigin)?;

    let ttl_minutes = parse_number(TTL_MINUTES, get(TTL_MINUTES), defaults.ttl_minutes)?;
    let port = parse_number(PORT, get(PORT), defaults.port)?;
    let max_entries = parse_number(MAX_ENTRIES, get(MAX_ENTRIES), defaults.max_entries)?;

    let cache_backend = match get(CACHE_TYPE).as_deref() {
        None => defaults.cache_backend,
        Some("memory") => CacheBackend::Memory,
        Some("redis") => CacheBackend::Redis,
        Some(other) => return Err(ConfigError::InvalidBackend(other.to_string())),
    };

    Ok(Config {
        origin_url,
        ttl_minutes,
        port,
        cache_backend,
        redis_url: get(REDIS_URL).unwrap_or(defaults.redis_url),
        max_entries,
        metrics_address: get(METRICS_ADDRESS),
    })
}

fn parse_number<T: std::str::FromStr>(
    var: &'static str,
    value: Option<String>,
    fallback: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(fallback),
        Some(v) => v
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value: v }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load_with(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        load_from(|var| map.get(var).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = load_with(&[]).unwrap();
        assert_eq!(config.origin_url, "https://httpbin.org");
        assert_eq!(config.ttl_minutes, 5);
        assert_eq!(config.port, 8080);
        assert_eq!(config.cache_backend, CacheBackend::Memory);
        assert_eq!(config.redis_url, "redis://localhost:6379/0");
        assert_eq!(config.max_entries, 0);
        assert!(config.metrics_address.is_none());
    }

    #[test]
    fn variables_override_defaults() {
        let config = load_with(&[
            ("ORIGIN_URL", "http://localhost:3000"),
            ("TTL_MINUTES", "30"),
            ("PORT", "9999"),
            ("CACHE_TYPE", "redis"),
            ("REDIS_URL", "redis://cache.internal:6379/1"),
            ("MAX_ENTRIES", "1000"),
        ])
        .unwrap();
        assert_eq!(config.origin_url, "http://localhost:3000");
        assert_eq!(config.ttl(), std::time::Duration::from_secs(30 * 60));
        assert_eq!(config.port, 9999);
        assert_eq!(config.cache_backend, CacheBackend::Redis);
        assert_eq!(config.redis_url, "redis://cache.internal:6379/1");
        assert_eq!(config.max_entries, 1000);
    }

    #[test]
    fn empty_values_fall_back_to_defaults() {
        let config = load_with(&[("TTL_MINUTES", ""), ("CACHE_TYPE", "")]).unwrap();
        assert_eq!(config.ttl_minutes, 5);
        assert_eq!(config.cache_backend, CacheBackend::Memory);
    }

    #[test]
    fn non_numeric_ttl_is_fatal() {
        let err = load_with(&[("TTL_MINUTES", "soon")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                var: "TTL_MINUTES",
                ..
            }
        ));
    }

    #[test]
    fn unknown_backend_is_fatal() {
        let err = load_with(&[("CACHE_TYPE", "memcached")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBackend(ref b) if b == "memcached"));
    }

    #[test]
    fn malformed_origin_is_fatal() {
        let err = load_with(&[("ORIGIN_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOrigin(_)));
    }
}
