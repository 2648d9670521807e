//! # Simulator Configuration
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:3000"
//!
//! [logging]
//! level = "debug"
//!
//! [[devices]]
//! address = 0x48
//! initial_temperature = 21000
//!
//! [[devices]]
//! address = 0x4f
//! initial_temperature = -5500
//! ```
//!
//! - Every section is optional. Without `[[devices]]` a single chip is
//!   attached at `0x48`.
//! - `initial_temperature` is the ambient value in milli-degrees Celsius the
//!   chip powers up with.

// src/config.rs - Single configuration file
use crate::device::{DEFAULT_AMBIENT_MILLI, Ds1621};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration struct for the web server, logging and emulated chips.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default = "default_devices")]
    pub devices: Vec<DeviceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            devices: default_devices(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.logging.max_level()?;
        let mut seen = BTreeSet::new();
        for device in &self.devices {
            if !Ds1621::is_valid_address(device.address) {
                return Err(ConfigError::Invalid(format!(
                    "device address 0x{:02x} outside 0x48..=0x4f",
                    device.address
                )));
            }
            if !seen.insert(device.address) {
                return Err(ConfigError::Invalid(format!(
                    "device address 0x{:02x} listed twice",
                    device.address
                )));
            }
        }
        Ok(())
    }
}

/// HTTP attribute interface.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl LoggingConfig {
    pub fn max_level(&self) -> Result<tracing::Level, ConfigError> {
        self.level
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("unknown log level '{}'", self.level)))
    }
}

/// One emulated DS1621.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct DeviceConfig {
    pub address: u8,
    #[serde(default = "default_initial_temperature")]
    pub initial_temperature: i32,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}
fn default_level() -> String {
    "info".to_string()
}
fn default_initial_temperature() -> i32 {
    DEFAULT_AMBIENT_MILLI
}
fn default_devices() -> Vec<DeviceConfig> {
    vec![DeviceConfig {
        address: 0x48,
        initial_temperature: DEFAULT_AMBIENT_MILLI,
    }]
}

pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        tracing::error!("Failed to read config file '{}': {}", path.display(), e);
        ConfigError::Io(e)
    })?;
    let config: Config = toml::from_str(&contents).map_err(|e| {
        tracing::error!("Failed to parse config TOML: {}", e);
        ConfigError::Toml(e)
    })?;
    config.validate()?;
    Ok(config)
}
