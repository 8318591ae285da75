use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use serde::Deserialize;
use thiserror::Error;

use crate::vendor::OmnidimGateway;

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub vendor: VendorConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    #[error("environment variable '{0}' is not set")]
    MissingEnvVar(String),

    #[error("unclosed variable reference '${{' (missing '}}')")]
    UnclosedVarReference,
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        let expanded = expand_env_vars(&contents)?;
        Ok(serde_saphyr::from_str(&expanded)?)
    }
}

/// Resolve a path relative to the config file directory.
///
/// Absolute paths are returned as-is; relative paths are joined with the
/// config file's parent directory, so behavior does not depend on the
/// current working directory.
pub fn resolve_path(config_path: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }

    let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    config_dir.join(path)
}

// ============================================================================
// Default Paths
// ============================================================================

/// Default data directory (relative to config file).
pub const DEFAULT_DATA_DIR: &str = ".voxtutor";
/// Default sessions directory (relative to data directory).
pub const DEFAULT_SESSIONS_DIR: &str = "sessions";
/// Default reviews directory (relative to data directory).
pub const DEFAULT_REVIEWS_DIR: &str = "reviews";

// ============================================================================
// Private Helpers (Serde Defaults)
// ============================================================================

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_request_timeout() -> u64 {
    60
}

fn default_max_connections() -> usize {
    1024
}

fn default_vendor_base_url() -> String {
    OmnidimGateway::DEFAULT_BASE_URL.to_string()
}

fn default_vendor_ws_url() -> String {
    OmnidimGateway::DEFAULT_WS_URL.to_string()
}

fn default_max_duration_hours() -> u64 {
    24
}

fn default_sweep_interval() -> u64 {
    3600
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// Supports shell-compatible syntax:
/// - `${VAR}` - Required variable, errors if not set
/// - `${VAR:-default}` - Optional variable with default value
/// - `$$` - Escaped `$` (only needed before `{` to prevent expansion)
///
/// Nested references (`${VAR:-${OTHER}}`) are not supported, and an
/// unclosed `${` is an error. A plain `$` passes through unchanged.
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + 1..];

        if let Some(tail) = rest.strip_prefix('$') {
            out.push('$');
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix('{') {
            let Some(end) = tail.find('}') else {
                return Err(ConfigError::UnclosedVarReference);
            };
            out.push_str(&resolve_var(&tail[..end])?);
            rest = &tail[end + 1..];
        } else {
            out.push('$');
        }
    }

    out.push_str(rest);
    Ok(out)
}

/// Resolve the inside of one `${...}` reference.
fn resolve_var(reference: &str) -> Result<String, ConfigError> {
    let (name, default) = match reference.split_once(":-") {
        Some((name, default)) => (name, Some(default)),
        None => (reference, None),
    };

    match std::env::var(name) {
        Ok(value) => Ok(value),
        Err(_) => match default {
            Some(default) => Ok(default.to_string()),
            None => Err(ConfigError::MissingEnvVar(name.to_string())),
        },
    }
}

// ============================================================================
// ServerConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            max_connections: default_max_connections(),
        }
    }
}

// ============================================================================
// VendorConfig
// ============================================================================

/// Connection settings for the Omnidim voice vendor.
#[derive(Debug, Deserialize)]
pub struct VendorConfig {
    #[serde(default = "default_vendor_base_url")]
    pub base_url: String,
    #[serde(default = "default_vendor_ws_url")]
    pub ws_url: String,
    /// API key; falls back to the `OMNIDIM_API_KEY` environment variable
    /// when absent.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for VendorConfig {
    fn default() -> Self {
        Self {
            base_url: default_vendor_base_url(),
            ws_url: default_vendor_ws_url(),
            api_key: None,
        }
    }
}

// ============================================================================
// StorageConfig
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    /// Root directory for persisted state. Sessions and reviews live in
    /// subdirectories under it.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

// ============================================================================
// SessionsConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SessionsConfig {
    /// Sessions older than this are force-ended by the expiry sweeper.
    #[serde(default = "default_max_duration_hours")]
    pub max_duration_hours: u64,
    /// How often the expiry sweeper runs.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            max_duration_hours: default_max_duration_hours(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
