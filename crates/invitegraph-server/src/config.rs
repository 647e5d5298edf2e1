//! Configuration management for the invitegraph server.
//!
//! This module provides configuration loading with multiple sources:
//! 1. Default values (hardcoded)
//! 2. Configuration file (YAML)
//! 3. Environment variables (override)
//!
//! # Configuration Hierarchy
//!
//! Environment variables take precedence over config file values,
//! which take precedence over defaults.
//!
//! # Example
//!
//! ```ignore
//! use invitegraph_server::config::ServerConfig;
//!
//! // Load from file with env overrides
//! let config = ServerConfig::load("config.yaml")?;
//!
//! // Or load from environment only
//! let config = ServerConfig::from_env()?;
//! ```

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use invitegraph_domain::cache::{CacheCategory, CacheConfig};
use invitegraph_domain::network::{NetworkConfig, TraversalOrder};
use serde::{Deserialize, Serialize};

use crate::handlers::RecentSearchLimits;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "INVITEGRAPH";

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    /// Server settings
    #[serde(default)]
    pub server: ServerSettings,

    /// Upstream API settings
    #[serde(default)]
    pub upstream: UpstreamSettings,

    /// Response cache settings
    #[serde(default)]
    pub cache: CacheSettings,

    /// Network builder settings
    #[serde(default)]
    pub network: NetworkSettings,

    /// Recent search storage settings
    #[serde(default)]
    pub recent_searches: RecentSearchSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Metrics settings
    #[serde(default)]
    pub metrics: MetricsSettings,
}

/// Server network settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServerSettings {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted request body size in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Upstream API settings.
///
/// Environment overrides use the `INVITEGRAPH_UPSTREAM__` prefix, e.g.
/// `INVITEGRAPH_UPSTREAM__BACKEND=memory` to run without network access.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct UpstreamSettings {
    /// Upstream backend: "http" or "memory"
    #[serde(default = "default_upstream_backend")]
    pub backend: String,

    /// Base URL of the legacy (v1) API
    #[serde(default = "default_api_base_v1")]
    pub api_base_v1: String,

    /// Base URL of the current (v2) API
    #[serde(default = "default_api_base_v2")]
    pub api_base_v2: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Sent as the `X-Ethos-Client` header
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            backend: default_upstream_backend(),
            api_base_v1: default_api_base_v1(),
            api_base_v2: default_api_base_v2(),
            user_agent: default_user_agent(),
            client_name: default_client_name(),
            timeout_secs: default_upstream_timeout(),
        }
    }
}

fn default_upstream_backend() -> String {
    "http".to_string()
}

fn default_api_base_v1() -> String {
    "https://api.ethos.network/api/v1".to_string()
}

fn default_api_base_v2() -> String {
    "https://api.ethos.network/api/v2".to_string()
}

fn default_user_agent() -> String {
    "EthosInviteGraph/1.0".to_string()
}

fn default_client_name() -> String {
    "ethos-invite-graph@1.0.0".to_string()
}

fn default_upstream_timeout() -> u64 {
    30
}

/// Response cache settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CacheSettings {
    /// Maximum number of cached responses
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: usize,

    #[serde(default = "default_profile_ttl")]
    pub profile_ttl_secs: u64,

    #[serde(default = "default_network_ttl")]
    pub network_ttl_secs: u64,

    #[serde(default = "default_invitations_ttl")]
    pub invitations_ttl_secs: u64,

    #[serde(default = "default_search_ttl")]
    pub search_ttl_secs: u64,

    /// Interval of the background expiry sweep; 0 disables it
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_capacity: default_cache_capacity(),
            profile_ttl_secs: default_profile_ttl(),
            network_ttl_secs: default_network_ttl(),
            invitations_ttl_secs: default_invitations_ttl(),
            search_ttl_secs: default_search_ttl(),
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

fn default_cache_capacity() -> usize {
    1000
}

fn default_profile_ttl() -> u64 {
    5 * 60
}

fn default_network_ttl() -> u64 {
    10 * 60
}

fn default_invitations_ttl() -> u64 {
    3 * 60
}

fn default_search_ttl() -> u64 {
    2 * 60
}

fn default_cleanup_interval() -> u64 {
    60
}

/// Network builder settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct NetworkSettings {
    /// Depth used when a request gives none (or an unparseable one)
    #[serde(default = "default_depth")]
    pub default_depth: u32,

    /// Requested depths are clamped to this
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Activities requested per upstream page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// "depth_first" (first visit wins) or "breadth_first" (shortest levels)
    #[serde(default)]
    pub traversal: TraversalOrder,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            default_depth: default_depth(),
            max_depth: default_max_depth(),
            page_size: default_page_size(),
            traversal: TraversalOrder::default(),
        }
    }
}

fn default_depth() -> u32 {
    3
}

fn default_max_depth() -> u32 {
    6
}

fn default_page_size() -> u32 {
    100
}

/// Recent search storage settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RecentSearchSettings {
    /// Storage backend: "memory" or "file"
    #[serde(default = "default_recent_backend")]
    pub backend: String,

    /// JSON file path (required if backend is "file")
    pub path: Option<String>,

    /// Entries kept in storage
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Entries returned to clients
    #[serde(default = "default_display_count")]
    pub display_count: usize,
}

impl Default for RecentSearchSettings {
    fn default() -> Self {
        Self {
            backend: default_recent_backend(),
            path: None,
            max_entries: default_max_entries(),
            display_count: default_display_count(),
        }
    }
}

fn default_recent_backend() -> String {
    "memory".to_string()
}

fn default_max_entries() -> usize {
    10
}

fn default_display_count() -> usize {
    3
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format (true for production, false for development)
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Metrics settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MetricsSettings {
    /// Enable metrics endpoint
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Metrics endpoint path
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_metrics_path(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

fn invalid(message: impl Into<String>) -> ConfigLoadError {
    ConfigLoadError::Invalid {
        message: message.into(),
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file with environment variable overrides.
    ///
    /// Environment variables are prefixed with `INVITEGRAPH_` and use `__` as separator.
    /// For example:
    /// - `INVITEGRAPH_SERVER__PORT=9090` overrides `server.port`
    /// - `INVITEGRAPH_NETWORK__MAX_DEPTH=4` overrides `network.max_depth`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(env_source())
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;

        Ok(server_config)
    }

    /// Load configuration from environment variables only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&ServerConfig::default())?)
            .add_source(env_source())
            .build()?;

        let server_config: ServerConfig = config.try_deserialize()?;
        server_config.validate()?;

        Ok(server_config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.server.port == 0 {
            return Err(invalid("server.port must be greater than 0"));
        }

        let upstream_backends = ["http", "memory"];
        if !upstream_backends.contains(&self.upstream.backend.as_str()) {
            return Err(invalid(format!(
                "upstream.backend must be one of: {:?}, got: {}",
                upstream_backends, self.upstream.backend
            )));
        }

        if self.upstream.backend == "http" {
            for (key, url) in [
                ("upstream.api_base_v1", &self.upstream.api_base_v1),
                ("upstream.api_base_v2", &self.upstream.api_base_v2),
            ] {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(invalid(format!(
                        "{key} must be an http(s) URL, got: {url:?}"
                    )));
                }
            }
        }

        if self.upstream.timeout_secs == 0 {
            return Err(invalid("upstream.timeout_secs must be greater than 0"));
        }

        if self.cache.max_capacity == 0 {
            return Err(invalid("cache.max_capacity must be greater than 0"));
        }

        if self.network.default_depth > self.network.max_depth {
            return Err(invalid(format!(
                "network.default_depth ({}) must not exceed network.max_depth ({})",
                self.network.default_depth, self.network.max_depth
            )));
        }

        if self.network.page_size == 0 {
            return Err(invalid("network.page_size must be greater than 0"));
        }

        let recent_backends = ["memory", "file"];
        if !recent_backends.contains(&self.recent_searches.backend.as_str()) {
            return Err(invalid(format!(
                "recent_searches.backend must be one of: {:?}, got: {}",
                recent_backends, self.recent_searches.backend
            )));
        }

        if self.recent_searches.backend == "file"
            && self
                .recent_searches
                .path
                .as_deref()
                .map_or(true, |p| p.trim().is_empty())
        {
            return Err(invalid(
                "recent_searches.path is required when backend is 'file'",
            ));
        }

        if self.recent_searches.max_entries == 0 {
            return Err(invalid("recent_searches.max_entries must be greater than 0"));
        }

        if self.recent_searches.display_count > self.recent_searches.max_entries {
            return Err(invalid(
                "recent_searches.display_count must not exceed recent_searches.max_entries",
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(invalid(format!(
                "logging.level must be one of: {:?}, got: {}",
                valid_levels, self.logging.level
            )));
        }

        Ok(())
    }

    /// Builds the response cache configuration.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::default()
            .with_max_capacity(self.cache.max_capacity)
            .with_ttl(
                CacheCategory::Profile,
                Duration::from_secs(self.cache.profile_ttl_secs),
            )
            .with_ttl(
                CacheCategory::Network,
                Duration::from_secs(self.cache.network_ttl_secs),
            )
            .with_ttl(
                CacheCategory::Invitations,
                Duration::from_secs(self.cache.invitations_ttl_secs),
            )
            .with_ttl(
                CacheCategory::Search,
                Duration::from_secs(self.cache.search_ttl_secs),
            )
    }

    /// Builds the network builder configuration.
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig::default().with_traversal(self.network.traversal)
    }

    /// Size limits for the recent search store.
    pub fn recent_search_limits(&self) -> RecentSearchLimits {
        RecentSearchLimits::new(
            self.recent_searches.max_entries,
            self.recent_searches.display_count,
        )
    }

    /// Interval of the background cache sweep, `None` when disabled.
    pub fn cache_cleanup_interval(&self) -> Option<Duration> {
        match self.cache.cleanup_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Use __ as separator for nested keys: INVITEGRAPH_SERVER__PORT -> server.port
fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}
