//! Bootstrap configuration
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Configuration is read once at startup; restart to pick up changes.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

pub const ENV_BASE_URL: &str = "BASE_URL";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_BIND: &str = "CLEARANCE_BIND";
pub const ENV_STORE: &str = "CLEARANCE_STORE";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://uploads.db?mode=rwc";
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";

/// Which record store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreVariant {
    /// Header fields + row blob, addressed by record id alone
    #[default]
    Minimal,
    /// Adds five random URL segments that gate the listing and QR target
    Segmented,
}

impl StoreVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreVariant::Minimal => "minimal",
            StoreVariant::Segmented => "segmented",
        }
    }
}

impl std::fmt::Display for StoreVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreVariant {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "minimal" => Ok(StoreVariant::Minimal),
            "segmented" => Ok(StoreVariant::Segmented),
            other => Err(Error::Config(format!(
                "Unknown store variant '{}' (expected 'minimal' or 'segmented')",
                other
            ))),
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

fn default_log_level() -> String {
    "info".to_string()
}

/// Settings read from the optional TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default)]
    pub bind: Option<String>,

    #[serde(default)]
    pub store: Option<StoreVariant>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub database_url: Option<String>,
    pub bind: Option<String>,
    pub store: Option<StoreVariant>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub base_url: String,
    pub database_url: String,
    pub bind: String,
    pub store: StoreVariant,
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind: DEFAULT_BIND.to_string(),
            store: StoreVariant::default(),
            log_level: default_log_level(),
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ServiceConfig {
    /// Resolve every setting: CLI, then ENV, then TOML, then default
    pub fn resolve(cli: ConfigOverrides, toml: &TomlConfig) -> Result<Self> {
        let defaults = Self::default();

        let base_url = cli
            .base_url
            .or_else(|| env_value(ENV_BASE_URL))
            .or_else(|| toml.base_url.clone())
            .unwrap_or(defaults.base_url);

        let database_url = cli
            .database_url
            .or_else(|| env_value(ENV_DATABASE_URL))
            .or_else(|| toml.database_url.clone())
            .unwrap_or(defaults.database_url);

        let bind = cli
            .bind
            .or_else(|| env_value(ENV_BIND))
            .or_else(|| toml.bind.clone())
            .unwrap_or(defaults.bind);

        let store = match cli.store {
            Some(store) => store,
            None => match env_value(ENV_STORE) {
                Some(value) => value.parse()?,
                None => toml.store.unwrap_or(defaults.store),
            },
        };

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "base_url must be an http(s) URL, got '{}'",
                base_url
            )));
        }

        Ok(Self {
            base_url,
            database_url,
            bind,
            store,
            log_level: toml.logging.level.clone(),
        })
    }
}

/// Default config file location (`~/.config/clearance/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("clearance").join("config.toml"))
}

/// Load the TOML config file.
///
/// An explicitly named file must exist and parse. Without one, the default
/// location is tried and a missing file falls back to defaults.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                info!("No config file found, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    let config: TomlConfig = toml::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })?;

    info!("Loaded config file: {}", path.display());
    if config.database_url.is_none() {
        warn!("Config file {} sets no database_url", path.display());
    }

    Ok(config)
}
