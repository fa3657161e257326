//! Configuration handling for schema_delta

use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{Error, Result};

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "schema_delta.toml";

/// Load configuration from a TOML file
pub fn load_from_file(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read config file {}: {}", path, e)))?;

    let config: Config = toml::from_str(&config_str)
        .map_err(|e| Error::ConfigError(format!("Failed to parse config file {}: {}", path, e)))?;

    config.validate()?;
    Ok(config)
}

/// Represents the complete schema_delta configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub schema: SchemaConfig,
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
    pub executor: Option<ExecutorConfig>,
    pub changelog: Option<ChangeLogConfig>,
    pub logging: Option<LoggingConfig>,
}

impl Config {
    /// Find a connection by its key
    pub fn connection(&self, key: &str) -> Result<&ConnectionConfig> {
        self.connections
            .iter()
            .find(|connection| connection.key == key)
            .ok_or_else(|| Error::ConnectionNotFound(key.to_string()))
    }

    /// Executor settings, falling back to defaults
    pub fn executor(&self) -> ExecutorConfig {
        self.executor.clone().unwrap_or_default()
    }

    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for connection in &self.connections {
            if !seen.insert(connection.key.as_str()) {
                return Err(Error::ConfigError(format!(
                    "Duplicate connection key: {}",
                    connection.key
                )));
            }
        }
        Ok(())
    }
}

/// Local schema snapshot location
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SchemaConfig {
    pub path: String,
}

/// A remote MySQL database
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConnectionConfig {
    pub key: String,
    pub host: String,
    pub port: Option<u16>,
    pub user: String,
    #[serde(default)]
    pub pass: String,
    pub name: String,
    pub schema: Option<String>,
}

impl ConnectionConfig {
    /// Name of the local schema this connection is compared against
    pub fn schema_name(&self) -> &str {
        self.schema.as_deref().unwrap_or(&self.name)
    }

    /// `host/name` label used in reports
    pub fn label(&self) -> String {
        format!("{}/{}", self.host, self.name)
    }
}

/// Settings for applying changes
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExecutorConfig {
    #[serde(default)]
    pub safe_mode: bool,
    pub pool_size: Option<u32>,
    pub timeout_seconds: Option<u64>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            safe_mode: false,
            pool_size: Some(1),
            timeout_seconds: Some(30),
        }
    }
}

/// Change log configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChangeLogConfig {
    pub path: String,
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_true")]
    pub stdout: bool,
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_true() -> bool {
    true
}
