//! Node configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `VAULT_HOST` - Bind address (default: 127.0.0.1)
//! - `VAULT_PORT` - Listen port (default: 5000)
//! - `VAULT_DATA_DIR` - Customer store root (default: `customer_data`)
//! - `VAULT_NODE_ROLE` - `cloud` or `local` (default: cloud)
//! - `VAULT_PEER_SYNC_URL` - Peer ingestion base URL, e.g. `http://local:5001/upload-profile`
//! - `VAULT_PEER_FETCH_URL` - Peer fetch trigger base URL, e.g. `http://local:5001/push-to-peer`
//! - `VAULT_PEER_TIMEOUT_MS` - Timeout for outbound peer calls (default: 5000)
//! - `VAULT_MAX_UPLOAD_BYTES` - Request body limit for uploads (default: 10 MiB)
//! - `VAULT_LOG_JSON` - Emit JSON logs when set
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_PEER_TIMEOUT_MS: u64 = 5000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which side of the cloud/local pair this node runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeRole {
    /// Public-facing node.
    #[default]
    Cloud,
    /// Node reachable only from the cloud node.
    Local,
}

impl NodeRole {
    /// Lowercase role name, as used in logs and Sentry tags.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cloud => "cloud",
            Self::Local => "local",
        }
    }
}

impl FromStr for NodeRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cloud" => Ok(Self::Cloud),
            "local" => Ok(Self::Local),
            other => Err(format!("expected 'cloud' or 'local', got '{other}'")),
        }
    }
}

/// Node application configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Root directory of the customer store
    pub data_dir: PathBuf,
    /// Cloud or local
    pub role: NodeRole,
    /// Peer endpoints
    pub peer: PeerConfig,
    /// Maximum accepted upload body size in bytes
    pub max_upload_bytes: usize,
    /// Emit JSON-formatted logs
    pub log_json: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Addresses of the cooperating peer node.
///
/// Either endpoint may be absent; sync is then skipped and fetch requests
/// are answered with 503.
#[derive(Debug, Clone)]
pub struct PeerConfig {
    /// Base URL the freshly stored profile is pushed to (`<base>/<raw id>`)
    pub sync_url: Option<Url>,
    /// Base URL asked to push a profile back to us (`<base>/<raw id>`)
    pub fetch_url: Option<Url>,
    /// Timeout applied to every outbound peer request
    pub timeout: Duration,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            sync_url: None,
            fetch_url: None,
            timeout: Duration::from_millis(DEFAULT_PEER_TIMEOUT_MS),
        }
    }
}

impl NodeConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default("VAULT_HOST", "127.0.0.1")?;
        let port = parse_env_or_default("VAULT_PORT", "5000")?;
        let data_dir = PathBuf::from(get_env_or_default("VAULT_DATA_DIR", "customer_data"));
        let role = parse_env_or_default("VAULT_NODE_ROLE", "cloud")?;
        let peer = PeerConfig::from_env()?;
        let max_upload_bytes =
            parse_env_or_default("VAULT_MAX_UPLOAD_BYTES", &DEFAULT_MAX_UPLOAD_BYTES.to_string())?;
        let log_json = get_optional_env("VAULT_LOG_JSON").is_some();

        Ok(Self {
            host,
            port,
            data_dir,
            role,
            peer,
            max_upload_bytes,
            log_json,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Configuration for a node serving `data_dir` on an ephemeral local port,
    /// with no peer and no Sentry.
    #[must_use]
    pub fn local_defaults(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            data_dir: data_dir.into(),
            role: NodeRole::default(),
            peer: PeerConfig::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            log_json: false,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl PeerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_ms: u64 =
            parse_env_or_default("VAULT_PEER_TIMEOUT_MS", &DEFAULT_PEER_TIMEOUT_MS.to_string())?;

        Ok(Self {
            sync_url: get_optional_peer_url("VAULT_PEER_SYNC_URL")?,
            fetch_url: get_optional_peer_url("VAULT_PEER_FETCH_URL")?,
            timeout: Duration::from_millis(timeout_ms),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Get an optional peer base URL; it must be absolute `http` or `https`.
fn get_optional_peer_url(key: &str) -> Result<Option<Url>, ConfigError> {
    get_optional_env(key)
        .map(|value| parse_peer_url(&value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e)))
        .transpose()
}

/// Parse and check a peer base URL.
fn parse_peer_url(value: &str) -> Result<Url, String> {
    let url = Url::parse(value.trim()).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme '{other}'")),
    }
    if url.host_str().is_none() {
        return Err("URL must have a host".to_string());
    }
    Ok(url)
}
