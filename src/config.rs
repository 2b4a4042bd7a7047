//! Configuration handling for the MySQL MCP Server.
//!
//! Server settings (transport, logging) come from CLI arguments and
//! environment variables via `clap`. Connection defaults are different: they
//! are looked up from the process environment on every call, so changing
//! `MYSQL_*` variables takes effect on the next tool invocation.

use crate::models::{ConnectionDescriptor, ConnectionOverrides};
use clap::{Parser, ValueEnum};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
pub const DEFAULT_HTTP_PORT: u16 = 8080;
pub const DEFAULT_MCP_ENDPOINT: &str = "/";

/// Statement execution budget.
pub const QUERY_TIMEOUT_SECS: u64 = 30;
/// Deadline for opening a connection (and for waiting on a saturated pool).
pub const CONNECT_TIMEOUT_SECS: u64 = 10;
/// Concurrent connection ceiling per pool.
pub const MAX_POOL_CONNECTIONS: u32 = 5;
/// Rows rendered in a read result; the true total is always reported.
pub const MAX_DISPLAY_ROWS: usize = 1000;
/// Per-pool grace period during teardown.
pub const POOL_CLOSE_TIMEOUT_SECS: u64 = 5;

// Hardcoded fallbacks when neither an override nor an environment default is set
pub const FALLBACK_HOST: &str = "localhost";
pub const FALLBACK_PORT: u16 = 3306;
pub const FALLBACK_USER: &str = "root";

// Environment variables supplying process-wide connection defaults
pub const ENV_HOST: &str = "MYSQL_HOST";
pub const ENV_PORT: &str = "MYSQL_PORT";
pub const ENV_USER: &str = "MYSQL_USER";
pub const ENV_PASSWORD: &str = "MYSQL_PASSWORD";
pub const ENV_DATABASE: &str = "MYSQL_DATABASE";

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TransportMode {
    /// Standard input/output (for CLI integration)
    #[default]
    Stdio,
    /// HTTP with Server-Sent Events (for web clients)
    Http,
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio => write!(f, "stdio"),
            Self::Http => write!(f, "http"),
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "mysql-mcp-server",
    about = "MCP server exposing read-only query, write, and schema tools for MySQL",
    long_about = "MCP server exposing read-only query, write, and schema tools for MySQL.\n\n\
        Default connection parameters are read from MYSQL_HOST, MYSQL_PORT, MYSQL_USER,\n\
        MYSQL_PASSWORD and MYSQL_DATABASE on every call; each tool call may override them.",
    version,
    author
)]
pub struct Config {
    /// Transport mode (stdio or http)
    #[arg(
        short,
        long,
        value_enum,
        default_value = "stdio",
        env = "MCP_TRANSPORT"
    )]
    pub transport: TransportMode,

    /// HTTP host to bind to (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_HTTP_HOST,
        env = "MCP_HTTP_HOST"
    )]
    pub http_host: String,

    /// HTTP port to bind to (only used with http transport)
    #[arg(
        long,
        default_value_t = DEFAULT_HTTP_PORT,
        env = "MCP_HTTP_PORT"
    )]
    pub http_port: u16,

    /// MCP endpoint path (only used with http transport)
    #[arg(
        long,
        default_value = DEFAULT_MCP_ENDPOINT,
        env = "MCP_ENDPOINT"
    )]
    pub mcp_endpoint: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MCP_LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "MCP_JSON_LOGS")]
    pub json_logs: bool,
}

impl Config {
    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            transport: TransportMode::Stdio,
            http_host: DEFAULT_HTTP_HOST.to_string(),
            http_port: DEFAULT_HTTP_PORT,
            mcp_endpoint: DEFAULT_MCP_ENDPOINT.to_string(),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// Get the HTTP bind address.
    pub fn http_bind_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

/// Pool construction settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub connect_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: MAX_POOL_CONNECTIONS,
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
        }
    }
}

/// Source of process-wide connection defaults.
pub trait DefaultsProvider: Send + Sync {
    /// Look up a default by variable name. Empty values are treated as unset.
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads defaults from the process environment at lookup time.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvDefaults;

impl DefaultsProvider for EnvDefaults {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

/// Fixed set of defaults, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticDefaults {
    values: HashMap<String, String>,
}

impl StaticDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl DefaultsProvider for StaticDefaults {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).filter(|v| !v.is_empty()).cloned()
    }
}

/// Merges per-call overrides with process-wide defaults.
#[derive(Clone)]
pub struct ConnectionResolver {
    defaults: Arc<dyn DefaultsProvider>,
}

impl std::fmt::Debug for ConnectionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionResolver").finish_non_exhaustive()
    }
}

impl ConnectionResolver {
    pub fn new(defaults: Arc<dyn DefaultsProvider>) -> Self {
        Self { defaults }
    }

    /// Resolver backed by the process environment.
    pub fn from_env() -> Self {
        Self::new(Arc::new(EnvDefaults))
    }

    /// Resolve a complete connection descriptor.
    ///
    /// Per field: a non-empty (non-zero for the port) override wins, then the
    /// environment default, then the hardcoded fallback. A non-numeric or zero
    /// `MYSQL_PORT` silently falls back to 3306.
    pub fn resolve(&self, overrides: &ConnectionOverrides) -> ConnectionDescriptor {
        ConnectionDescriptor {
            host: pick(&overrides.host)
                .or_else(|| self.defaults.get(ENV_HOST))
                .unwrap_or_else(|| FALLBACK_HOST.to_string()),
            port: overrides
                .port
                .filter(|p| *p > 0)
                .or_else(|| self.default_port())
                .unwrap_or(FALLBACK_PORT),
            user: pick(&overrides.user)
                .or_else(|| self.defaults.get(ENV_USER))
                .unwrap_or_else(|| FALLBACK_USER.to_string()),
            password: pick(&overrides.password)
                .or_else(|| self.defaults.get(ENV_PASSWORD))
                .unwrap_or_default(),
            database: pick(&overrides.database)
                .or_else(|| self.default_database())
                .unwrap_or_default(),
        }
    }

    /// The process-wide default database, if one is configured.
    pub fn default_database(&self) -> Option<String> {
        self.defaults.get(ENV_DATABASE)
    }

    fn default_port(&self) -> Option<u16> {
        self.defaults
            .get(ENV_PORT)
            .and_then(|v| v.trim().parse::<u16>().ok())
            .filter(|p| *p > 0)
    }
}

impl Default for ConnectionResolver {
    fn default() -> Self {
        Self::from_env()
    }
}

fn pick(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}
