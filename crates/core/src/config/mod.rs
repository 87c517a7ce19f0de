//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (CRAWLGATE_*, nested sections split on `__`)
//! 2. TOML config file (if CRAWLGATE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "CRAWLGATE_";

/// Environment variable naming an optional TOML config file.
pub const CONFIG_FILE_ENV: &str = "CRAWLGATE_CONFIG_FILE";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (CRAWLGATE_*)
/// 2. TOML config file (if CRAWLGATE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Deployment environment name (e.g. `local`, `dev`, `prod`).
    #[serde(default = "default_env")]
    pub env: String,

    /// Service name reported in logs.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Fallback log filter when RUST_LOG is unset.
    ///
    /// Set via CRAWLGATE_LOG_LEVEL environment variable.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log output format.
    ///
    /// Set via CRAWLGATE_LOG_FORMAT environment variable (`json` or `text`).
    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub http_client: HttpClientConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

/// HTTP listener and middleware settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Prefix for the crawl-allowed and custom-rule routes.
    pub api_path: String,
    /// Largest accepted request body, in MiB.
    pub max_body_size_mb: usize,
    pub cors_max_age_hours: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            api_path: "/rule-api".into(),
            max_body_size_mb: 1,
            cors_max_age_hours: 12,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }

    pub fn cors_max_age(&self) -> Duration {
        Duration::from_secs(self.cors_max_age_hours * 60 * 60)
    }
}

/// API-key protection of the custom-rule routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub enabled: bool,
    /// Raw keys seeded (hashed) into the key table at startup.
    ///
    /// Set via CRAWLGATE_AUTH__API_KEYS environment variable.
    pub api_keys: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { enabled: true, api_keys: Vec::new() }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Sqlite,
    Memory,
}

/// robots.txt cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// SQLite file used by the `sqlite` backend.
    pub path: PathBuf,
    /// Lifetime of a cached robots.txt body.
    pub ttl_secs: u64,
    /// Bound on each cache call.
    pub timeout_ms: u64,
    /// How often expired entries are swept.
    pub purge_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::Sqlite,
            path: PathBuf::from("./crawlgate-cache.sqlite"),
            ttl_secs: 24 * 60 * 60,
            timeout_ms: 1_000,
            purge_interval_secs: 60 * 60,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }
}

/// Override rule database settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: usize,
    /// Pooled connections older than this are closed instead of reused.
    pub conn_max_lifetime_secs: u64,
    pub acquire_timeout_ms: u64,
    pub query_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./crawlgate-rules.sqlite"),
            max_connections: 8,
            conn_max_lifetime_secs: 30 * 60,
            acquire_timeout_ms: 5_000,
            query_timeout_ms: 5_000,
        }
    }
}

impl DatabaseConfig {
    pub fn conn_max_lifetime(&self) -> Duration {
        Duration::from_secs(self.conn_max_lifetime_secs)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}

/// Transport used to fetch live robots.txt files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpClientConfig {
    /// User-Agent sent when fetching robots.txt.
    pub user_agent: String,
    pub request_timeout_ms: u64,
    /// Covers the TCP connect and the TLS handshake.
    pub connect_timeout_ms: u64,
    pub idle_timeout_ms: u64,
    pub keep_alive_secs: u64,
    pub max_idle_per_host: usize,
    /// Upper bound on concurrent robots.txt fetches across all hosts.
    pub max_connections: usize,
    pub max_redirects: usize,
    pub accept_invalid_certs: bool,
    /// Bodies past this size are truncated.
    pub max_robots_bytes: usize,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_ms: 10_000,
            connect_timeout_ms: 5_000,
            idle_timeout_ms: 90_000,
            keep_alive_secs: 30,
            max_idle_per_host: 10,
            max_connections: 100,
            max_redirects: 10,
            accept_invalid_certs: false,
            max_robots_bytes: 500 * 1024,
        }
    }
}

impl HttpClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }
}

fn default_env() -> String {
    "local".into()
}

fn default_service_name() -> String {
    "crawlgate".into()
}

fn default_log_level() -> String {
    "crawlgate=info,tower_http=info".into()
}

fn default_user_agent() -> String {
    "crawlgate/0.1".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: default_env(),
            service_name: default_service_name(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            cache: CacheConfig::default(),
            database: DatabaseConfig::default(),
            http_client: HttpClientConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `CRAWLGATE_`
    /// 2. TOML file from `CRAWLGATE_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var(CONFIG_FILE_ENV) {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed(ENV_PREFIX)
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
