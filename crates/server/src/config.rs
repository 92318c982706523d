use matcher::FederationConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Metrics endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    /// Public base URL of this service, as peers and the directory know it
    #[serde(default)]
    pub public_endpoint: Option<String>,

    /// JSON snapshot of the equivalence table, loaded at startup when present
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,

    /// Rewrite the snapshot after every mutation
    #[serde(default = "default_true")]
    pub persist_on_change: bool,

    /// Longest derived path the local traversal follows
    #[serde(default = "default_max_traversal_depth")]
    pub max_traversal_depth: usize,

    #[serde(default)]
    pub resolver: ResolverSettings,

    #[serde(default)]
    pub federation: FederationConfig,
}

/// How match targets are mapped to peer services
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverSettings {
    /// Service directory; when unset the static namespace map is used
    #[serde(default)]
    pub directory_url: Option<String>,

    /// Directory request timeout in milliseconds
    #[serde(default = "default_resolver_timeout_ms")]
    pub timeout_ms: u64,

    /// Directory answer cache lifetime in milliseconds (0 disables)
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    /// Namespace -> endpoint
    #[serde(default)]
    pub namespaces: HashMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
            public_endpoint: None,
            snapshot_path: None,
            persist_on_change: default_true(),
            max_traversal_depth: default_max_traversal_depth(),
            resolver: ResolverSettings::default(),
            federation: FederationConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, an optional `matcher.{toml,yaml,json}`
    /// file and `SEMANTIC_MATCHER__*` environment variables
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }

        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("matcher").required(false))
            // Override with environment variables
            .add_source(
                config::Environment::with_prefix("SEMANTIC_MATCHER")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            directory_url: None,
            timeout_ms: default_resolver_timeout_ms(),
            cache_ttl_ms: default_cache_ttl_ms(),
            namespaces: HashMap::new(),
        }
    }
}

impl ResolverSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_body_size_mb() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_traversal_depth() -> usize {
    table::DEFAULT_MAX_DEPTH
}

fn default_resolver_timeout_ms() -> u64 {
    2_000
}

fn default_cache_ttl_ms() -> u64 {
    300_000
}
