//! Configuration resolution for identity-svc
//!
//! **Priority:** command line / environment → TOML → compiled defaults

use clap::Parser;
use identity_common::config::{self, StoreConfig, TomlConfig};
use identity_common::Result;
use std::path::PathBuf;

/// Command-line arguments for identity-svc
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "identity-svc")]
#[command(about = "Contact identity resolution service")]
#[command(version)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Interface to bind
    #[arg(long, env = "IDENTITY_HOST")]
    pub host: Option<String>,

    /// SQLite database file
    #[arg(short, long, env = "IDENTITY_DATABASE")]
    pub database: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long, env = "IDENTITY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides
    #[arg(long, env = "IDENTITY_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Fully resolved service settings
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub log_level: String,
    pub store: StoreConfig,
}

impl ServiceConfig {
    /// Load the TOML file named by `args` (or the default one) and merge
    pub fn resolve(args: &Args) -> Result<Self> {
        let toml_config = config::load_or_default(args.config.as_deref())?;
        Self::merge(args, toml_config)
    }

    /// Overlay command-line values on a loaded TOML config
    pub fn merge(args: &Args, mut toml_config: TomlConfig) -> Result<Self> {
        if let Some(port) = args.port {
            toml_config.port = port;
        }
        if let Some(host) = &args.host {
            toml_config.host = host.clone();
        }
        if let Some(level) = &args.log_level {
            toml_config.logging.level = level.clone();
        }
        config::validate(&toml_config)?;

        let database_path = args
            .database
            .clone()
            .or(toml_config.database_path)
            .unwrap_or_else(config::default_database_path);

        Ok(Self {
            host: toml_config.host,
            port: toml_config.port,
            database_path,
            log_level: toml_config.logging.level,
            store: toml_config.store,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ENV_VARS: [&str; 5] = [
        "PORT",
        "IDENTITY_HOST",
        "IDENTITY_DATABASE",
        "IDENTITY_CONFIG",
        "IDENTITY_LOG_LEVEL",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults_without_overrides() {
        let resolved = ServiceConfig::merge(&Args::default(), TomlConfig::default()).unwrap();

        assert_eq!(resolved.bind_addr(), "0.0.0.0:3000");
        assert_eq!(resolved.log_level, "info");
        assert_eq!(resolved.store.max_connections, 10);
        assert_eq!(resolved.database_path, config::default_database_path());
    }

    #[test]
    fn test_cli_overrides_toml() {
        let toml_config = TomlConfig {
            port: 4000,
            database_path: Some(PathBuf::from("/srv/identity/from-toml.db")),
            ..TomlConfig::default()
        };
        let args = Args {
            port: Some(5000),
            database: Some(PathBuf::from("/tmp/from-cli.db")),
            log_level: Some("debug".to_string()),
            ..Args::default()
        };

        let resolved = ServiceConfig::merge(&args, toml_config).unwrap();
        assert_eq!(resolved.port, 5000);
        assert_eq!(resolved.database_path, PathBuf::from("/tmp/from-cli.db"));
        assert_eq!(resolved.log_level, "debug");
    }

    #[test]
    fn test_toml_database_path_used_when_cli_silent() {
        let toml_config = TomlConfig {
            database_path: Some(PathBuf::from("/srv/identity/from-toml.db")),
            ..TomlConfig::default()
        };

        let resolved = ServiceConfig::merge(&Args::default(), toml_config).unwrap();
        assert_eq!(resolved.database_path, PathBuf::from("/srv/identity/from-toml.db"));
    }

    #[test]
    fn test_port_zero_rejected() {
        let args = Args {
            port: Some(0),
            ..Args::default()
        };
        assert!(ServiceConfig::merge(&args, TomlConfig::default()).is_err());
    }

    #[test]
    #[serial]
    fn test_port_from_environment() {
        clear_env();
        std::env::set_var("PORT", "8123");

        let args = Args::try_parse_from(["identity-svc"]).unwrap();
        clear_env();

        assert_eq!(args.port, Some(8123));
        let resolved = ServiceConfig::merge(&args, TomlConfig::default()).unwrap();
        assert_eq!(resolved.port, 8123);
    }

    #[test]
    #[serial]
    fn test_flag_beats_environment() {
        clear_env();
        std::env::set_var("PORT", "8123");

        let args = Args::try_parse_from(["identity-svc", "--port", "9000"]).unwrap();
        clear_env();

        assert_eq!(args.port, Some(9000));
    }
}
