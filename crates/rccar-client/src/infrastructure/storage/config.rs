//! TOML-based settings persistence for the Client.
//!
//! Stored next to the Host settings, as `client.toml` in the platform config
//! directory (`~/.config/rccar/` on Linux). Besides the preferences it
//! remembers the last Host the user connected to.
//!
//! ```toml
//! [client]
//! battery_power_interval_ms = 60000
//! location_interval_ms = 1000
//! camera_enabled = true
//!
//! [last_connection]
//! host = "192.168.0.17"
//! port = 4253
//! ```

use std::path::{Path, PathBuf};

use rccar_core::domain::{ConnectionParameter, Location, DEFAULT_PORT};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::client_logic::ClientSettings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ClientConfig {
    #[serde(default)]
    pub client: GeneralConfig,
    #[serde(default)]
    pub last_connection: LastConnectionConfig,
    #[serde(default)]
    pub location: LocationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_battery_power_interval_ms")]
    pub battery_power_interval_ms: u32,
    #[serde(default = "default_location_interval_ms")]
    pub location_interval_ms: u32,
    #[serde(default = "default_true")]
    pub camera_enabled: bool,
}

/// The Host connected to last; empty until a connection is saved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LastConnectionConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// The Client's own position, used for the distance to the car.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LocationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_battery_power_interval_ms() -> u32 {
    60_000
}
fn default_location_interval_ms() -> u32 {
    1_000
}
fn default_true() -> bool {
    true
}
fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            battery_power_interval_ms: default_battery_power_interval_ms(),
            location_interval_ms: default_location_interval_ms(),
            camera_enabled: true,
        }
    }
}

impl Default for LastConnectionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            password: None,
        }
    }
}

// ── Derived views ─────────────────────────────────────────────────────────────

impl ClientConfig {
    pub fn settings(&self) -> ClientSettings {
        ClientSettings {
            battery_power_interval_ms: self.client.battery_power_interval_ms,
            location_interval_ms: self.client.location_interval_ms,
            camera_enabled: self.client.camera_enabled,
        }
    }

    /// The saved connection, if any.
    pub fn last_connection(&self) -> Option<ConnectionParameter> {
        let last = &self.last_connection;
        if last.host.is_empty() {
            return None;
        }
        Some(ConnectionParameter::new(
            last.host.clone(),
            last.port,
            last.password.clone(),
        ))
    }

    pub fn save_connection(&mut self, parameter: &ConnectionParameter) {
        self.last_connection = LastConnectionConfig {
            host: parameter.host.clone(),
            port: parameter.port,
            password: parameter.password.clone(),
        };
    }

    /// Forgets the saved connection, password included.
    pub fn reset_connection(&mut self) {
        self.last_connection = LastConnectionConfig::default();
    }

    /// Restores every setting to its default.
    pub fn reset(&mut self) {
        *self = ClientConfig::default();
    }

    /// Own position, when configured.
    pub fn location(&self) -> Option<Location> {
        self.location
            .enabled
            .then(|| Location::new(self.location.latitude, self.location.longitude))
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("client.toml"))
}

/// Loads the settings from `path`, returning defaults if the file does not
/// exist yet.
pub fn load_config_from(path: &Path) -> Result<ClientConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
pub fn save_config_to(config: &ClientConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("RCCar"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("rccar"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("RCCar")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
