//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::{AppConfig, CacheBackend};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

fn missing(field: &str, hint: &str) -> ConfigError {
    ConfigError::Missing { field: field.into(), hint: hint.into() }
}

fn check_timeout_ms(field: &str, value: u64) -> Result<(), ConfigError> {
    if value < 100 {
        return Err(invalid(field, "must be at least 100ms"));
    }
    if value > 300_000 {
        return Err(invalid(field, "must not exceed 5 minutes (300000ms)"));
    }
    Ok(())
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `server.api_path` is empty, lacks a leading `/` or ends with `/`
    /// - a size, pool bound or TTL is 0
    /// - an outbound timeout is below 100ms or above 5 minutes
    /// - `http_client.user_agent` is empty
    ///
    /// Returns `ConfigError::Missing` when a database path is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let api_path = &self.server.api_path;
        if api_path.is_empty() || !api_path.starts_with('/') {
            return Err(invalid("server.api_path", "must start with '/'"));
        }
        if api_path.len() > 1 && api_path.ends_with('/') {
            return Err(invalid("server.api_path", "must not end with '/'"));
        }
        if self.server.max_body_size_mb == 0 {
            return Err(invalid("server.max_body_size_mb", "must be greater than 0"));
        }

        if self.cache.backend == CacheBackend::Sqlite && self.cache.path.as_os_str().is_empty() {
            return Err(missing("cache.path", "set CRAWLGATE_CACHE__PATH or use cache.backend = \"memory\""));
        }
        if self.cache.ttl_secs == 0 {
            return Err(invalid("cache.ttl_secs", "must be greater than 0"));
        }
        if self.cache.timeout_ms == 0 {
            return Err(invalid("cache.timeout_ms", "must be greater than 0"));
        }
        if self.cache.purge_interval_secs == 0 {
            return Err(invalid("cache.purge_interval_secs", "must be greater than 0"));
        }

        if self.database.path.as_os_str().is_empty() {
            return Err(missing("database.path", "set CRAWLGATE_DATABASE__PATH"));
        }
        if self.database.max_connections == 0 {
            return Err(invalid("database.max_connections", "must be greater than 0"));
        }
        if self.database.conn_max_lifetime_secs == 0 {
            return Err(invalid("database.conn_max_lifetime_secs", "must be greater than 0"));
        }
        check_timeout_ms("database.acquire_timeout_ms", self.database.acquire_timeout_ms)?;
        check_timeout_ms("database.query_timeout_ms", self.database.query_timeout_ms)?;

        let http = &self.http_client;
        if http.user_agent.trim().is_empty() {
            return Err(invalid("http_client.user_agent", "must not be empty"));
        }
        check_timeout_ms("http_client.request_timeout_ms", http.request_timeout_ms)?;
        check_timeout_ms("http_client.connect_timeout_ms", http.connect_timeout_ms)?;
        if http.max_connections == 0 {
            return Err(invalid("http_client.max_connections", "must be greater than 0"));
        }
        if http.max_robots_bytes == 0 {
            return Err(invalid("http_client.max_robots_bytes", "must be greater than 0"));
        }
        if http.max_robots_bytes > 50 * 1024 * 1024 {
            return Err(invalid("http_client.max_robots_bytes", "must not exceed 50MB"));
        }

        if http.connect_timeout_ms > http.request_timeout_ms {
            tracing::warn!(
                connect_timeout_ms = http.connect_timeout_ms,
                request_timeout_ms = http.request_timeout_ms,
                "connect timeout exceeds the overall request timeout; \
                 the request timeout wins"
            );
        }

        if self.auth.enabled && self.auth.api_keys.is_empty() {
            tracing::warn!("auth is enabled but no api_keys are configured; only keys already stored are accepted");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::config::{CacheConfig, DatabaseConfig, HttpClientConfig, ServerConfig};

    fn assert_invalid(config: AppConfig, expected: &str) {
        let result = config.validate();
        assert!(
            matches!(&result, Err(ConfigError::Invalid { field, .. }) if field == expected),
            "expected {expected} to be rejected, got {result:?}"
        );
    }

    #[test]
    fn test_validate_empty_paths() {
        let config = AppConfig {
            database: DatabaseConfig { path: PathBuf::new(), ..Default::default() },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Missing { field, .. }) if field == "database.path"));

        let config = AppConfig {
            cache: CacheConfig { backend: CacheBackend::Sqlite, path: PathBuf::new(), ..Default::default() },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Missing { field, .. }) if field == "cache.path"));

        let config = AppConfig {
            cache: CacheConfig { backend: CacheBackend::Memory, path: PathBuf::new(), ..Default::default() },
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_api_path() {
        for path in ["", "rule-api", "/rule-api/"] {
            let config = AppConfig {
                server: ServerConfig { api_path: path.into(), ..Default::default() },
                ..Default::default()
            };
            assert_invalid(config, "server.api_path");
        }

        let root = AppConfig { server: ServerConfig { api_path: "/".into(), ..Default::default() }, ..Default::default() };
        assert!(root.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig {
            http_client: HttpClientConfig { user_agent: "  ".into(), ..Default::default() },
            ..Default::default()
        };
        assert_invalid(config, "http_client.user_agent");
    }

    #[test]
    fn test_validate_request_timeout_bounds() {
        let too_small = AppConfig {
            http_client: HttpClientConfig { request_timeout_ms: 50, ..Default::default() },
            ..Default::default()
        };
        assert_invalid(too_small, "http_client.request_timeout_ms");

        let too_large = AppConfig {
            http_client: HttpClientConfig { request_timeout_ms: 301_000, ..Default::default() },
            ..Default::default()
        };
        assert_invalid(too_large, "http_client.request_timeout_ms");
    }

    #[test]
    fn test_validate_zero_pool_sizes() {
        let db = AppConfig {
            database: DatabaseConfig { max_connections: 0, ..Default::default() },
            ..Default::default()
        };
        assert_invalid(db, "database.max_connections");

        let http = AppConfig {
            http_client: HttpClientConfig { max_connections: 0, ..Default::default() },
            ..Default::default()
        };
        assert_invalid(http, "http_client.max_connections");
    }

    #[test]
    fn test_validate_zero_ttl() {
        let mut config = AppConfig::default();
        config.cache.ttl_secs = 0;
        assert_invalid(config, "cache.ttl_secs");
    }

    #[test]
    fn test_validate_robots_size_limit() {
        let config = AppConfig {
            http_client: HttpClientConfig { max_robots_bytes: 51 * 1024 * 1024, ..Default::default() },
            ..Default::default()
        };
        assert_invalid(config, "http_client.max_robots_bytes");
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig {
            http_client: HttpClientConfig {
                request_timeout_ms: 100,
                connect_timeout_ms: 100,
                max_robots_bytes: 1,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
