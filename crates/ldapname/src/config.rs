use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use ldapname_core::connection::{ConnectionSettings, TlsMode};
use ldapname_core::{Dn, SchemaCache};

/// A named directory server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionProfile {
    pub name: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub tls_mode: TlsMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_dn: Option<Dn>,
}

fn default_port() -> u16 {
    389
}

impl ConnectionProfile {
    pub fn to_connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            host: self.host.clone(),
            port: self.port,
            tls_mode: self.tls_mode,
            base_dn: self.base_dn.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Extra attributeTypes definitions on top of the core schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    #[serde(default)]
    pub attribute_types: Vec<String>,
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub connections: Vec<ConnectionProfile>,
    #[serde(default)]
    pub schema: SchemaConfig,
}

impl AppConfig {
    /// Default location: `<config_dir>/ldapname/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("ldapname").join("config.toml"))
    }

    /// Load the config file at `path`, or the default location when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path, true),
            None => match Self::default_path() {
                Some(config_path) => Self::load_from(&config_path, false),
                None => {
                    info!("No config directory, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Load `path`. An explicit path must exist and parse; otherwise a
    /// missing or broken file falls back to defaults.
    pub fn load_from(path: &Path, explicit: bool) -> Result<Self> {
        if !explicit && !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let loaded = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))
            .and_then(|content| {
                Self::from_toml(&content)
                    .with_context(|| format!("Failed to parse config {}", path.display()))
            });
        match loaded {
            Ok(config) => Ok(config),
            Err(e) if explicit => Err(e),
            Err(e) => {
                warn!("Ignoring config: {:#}", e);
                Ok(Self::default())
            }
        }
    }

    /// Parse config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Look up a connection profile by name (case-insensitive).
    pub fn find_connection(&self, name: &str) -> Option<&ConnectionProfile> {
        self.connections
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// The core schema extended with the configured definitions.
    pub fn schema_cache(&self) -> SchemaCache {
        let mut cache = SchemaCache::core();
        cache.load_definitions(self.schema.attribute_types.iter().map(String::as_str));
        cache
    }
}
