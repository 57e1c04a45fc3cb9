//! Bootstrap configuration loading
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument / environment variable (handled by the binary)
//! 2. TOML config file
//! 3. Compiled defaults
//!
//! A missing config file is never fatal: the service logs a warning and
//! starts on defaults. A config file that exists but does not parse is an
//! error, since silently ignoring it would hide operator mistakes.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Directory name used under the platform config/data directories
const APP_DIR: &str = "identity";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Path to SQLite database file (relative or absolute)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Interface the HTTP listener binds to
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            host: default_host(),
            port: default_port(),
            logging: LoggingConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Contact store tuning
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Connection pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// SQLite busy_timeout applied to every connection
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Total time a resolution may spend retrying after write conflicts
    #[serde(default = "default_max_conflict_wait_ms")]
    pub max_conflict_wait_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            busy_timeout_ms: default_busy_timeout_ms(),
            max_conflict_wait_ms: default_max_conflict_wait_ms(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_max_conflict_wait_ms() -> u64 {
    5000
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str::<TomlConfig>(&content)?;
    Ok(config)
}

/// Load the config file if present, otherwise fall back to defaults
///
/// `explicit` is a path the operator named; when it is `None` the platform
/// default location is tried.
pub fn load_or_default(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => default_config_path(),
    };

    match path {
        Some(path) if path.exists() => {
            let config = load_toml_config(&path)?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        Some(path) => {
            warn!(
                "Config file not found at {}, using built-in defaults",
                path.display()
            );
            Ok(TomlConfig::default())
        }
        None => {
            warn!("Could not determine config directory, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Platform default config file: `<config_dir>/identity/identity.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("identity.toml"))
}

/// Platform default database file: `<data_local_dir>/identity/contacts.db`
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("./identity_data"))
        .join("contacts.db")
}

/// Validate values that serde cannot express
pub fn validate(config: &TomlConfig) -> Result<()> {
    if config.port == 0 {
        return Err(Error::Config("port must be non-zero".to_string()));
    }
    if config.store.max_connections == 0 {
        return Err(Error::Config(
            "store.max_connections must be at least 1".to_string(),
        ));
    }
    Ok(())
}
