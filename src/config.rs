//! Configuration module
//!
//! Reads TOML from `~/.config/ocpi-cpo/config.toml` (override with the
//! `OCPI_CONFIG` env var). Every section falls back to sane defaults so
//! the service starts without a config file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::PartyRole;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub party: PartyConfig,
    pub writes: WriteConfig,
    pub logging: LoggingConfig,
    pub remote: RemoteConfig,
    /// Peer access tokens accepted on inbound requests.
    pub access_tokens: Vec<AccessTokenEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// URL prefix the OCPI routes are mounted under.
    pub path_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            path_prefix: "cpo".to_string(),
        }
    }
}

/// The CPO's own OCPI identity. Collection routes serve this party's
/// entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyConfig {
    pub country_code: String,
    pub party_id: String,
}

impl Default for PartyConfig {
    fn default() -> Self {
        Self {
            country_code: "DE".to_string(),
            party_id: "GEF".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteConfig {
    /// Accept writes whose `last_updated` is older than the stored
    /// object. Individual requests can still override with
    /// `?forceDowngrade=true`.
    pub allow_downgrades: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Outbound EMSP connection: access token plus the per-module base URLs
/// obtained from version negotiation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub access_token: Option<String>,
    /// Module name (`locations`, `tokens`, ...) → receiver base URL.
    pub modules: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenEntry {
    pub token: String,
    pub name: String,
    pub role: PartyRole,
    /// Blocked entries stay listed but are refused at the gate.
    #[serde(default = "default_token_allowed")]
    pub allowed: bool,
}

fn default_token_allowed() -> bool {
    true
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

/// Default config location: `~/.config/ocpi-cpo/config.toml`.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ocpi-cpo")
        .join("config.toml")
}
