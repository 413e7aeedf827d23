//! TOML-based settings persistence for the Host.
//!
//! Reads and writes [`HostConfig`] to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\RCCar\host.toml`
//! - Linux:    `~/.config/rccar/host.toml`
//! - macOS:    `~/Library/Application Support/RCCar/host.toml`
//!
//! ```toml
//! [network]
//! port = 4253
//! bind_address = "0.0.0.0"
//!
//! [security]
//! password = "3fa9c1"
//!
//! [sharing]
//! location = true
//! camera = true
//! ```
//!
//! Every field carries a serde default, so a missing file, a missing section
//! or a missing key all fall back to the values below.

use std::path::{Path, PathBuf};
use std::time::Duration;

use rccar_core::crypto::generate_default_password;
use rccar_core::domain::{Location, DEFAULT_PORT};
use rccar_core::protocol::messages::CameraConnectionParameterMessage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::host_logic::HostSettings;
use crate::application::vehicle::CarFeatures;

/// Error type for settings file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
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

/// Top-level Host settings stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct HostConfig {
    #[serde(default)]
    pub host: GeneralConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub sharing: SharingConfig,
    #[serde(default)]
    pub vehicle: VehicleConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub location: LocationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    /// `"0.0.0.0"` accepts Clients on every interface.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SecurityConfig {
    /// Generated on first start when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// What the Client may use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SharingConfig {
    #[serde(default = "default_true")]
    pub location: bool,
    #[serde(default = "default_true")]
    pub bearing: bool,
    #[serde(default = "default_true")]
    pub speed: bool,
    #[serde(default = "default_true")]
    pub camera: bool,
    #[serde(default = "default_true")]
    pub rotate_camera: bool,
}

/// Capabilities of the simulated car.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleConfig {
    #[serde(default = "default_pan_range")]
    pub camera_pan_min: f32,
    #[serde(default = "default_pan_range")]
    pub camera_pan_max: f32,
    #[serde(default = "default_tilt_range")]
    pub camera_tilt_min: f32,
    #[serde(default = "default_tilt_range")]
    pub camera_tilt_max: f32,
    #[serde(default = "default_true")]
    pub adjustable_speed: bool,
    #[serde(default = "default_true")]
    pub drive_backward: bool,
    #[serde(default = "default_true")]
    pub battery_power: bool,
    /// Charge in percent at startup.
    #[serde(default = "default_battery_level")]
    pub battery_level: f32,
    /// Percent lost per minute while the motor runs at full speed.
    #[serde(default = "default_battery_drain")]
    pub battery_drain_per_minute: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraConfig {
    #[serde(default = "default_camera_port")]
    pub port: u16,
    #[serde(default = "default_camera_protocol")]
    pub protocol: String,
    #[serde(default = "default_camera_path")]
    pub path: String,
    /// Time the stream needs before the Client is told to connect.
    #[serde(default = "default_camera_startup_delay_ms")]
    pub startup_delay_ms: u64,
    /// Program that serves the stream, e.g. a `ffmpeg` invocation. Without
    /// one the stream is assumed to be served externally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
}

/// Fixed position reported by the location service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LocationConfig {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_true() -> bool {
    true
}
fn default_pan_range() -> f32 {
    1.0
}
fn default_tilt_range() -> f32 {
    0.5
}
fn default_battery_level() -> f32 {
    100.0
}
fn default_battery_drain() -> f32 {
    1.0
}
fn default_camera_port() -> u16 {
    8080
}
fn default_camera_protocol() -> String {
    "http".to_string()
}
fn default_camera_path() -> String {
    "videofeed".to_string()
}
fn default_camera_startup_delay_ms() -> u64 {
    3000
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
        }
    }
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            location: true,
            bearing: true,
            speed: true,
            camera: true,
            rotate_camera: true,
        }
    }
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            camera_pan_min: default_pan_range(),
            camera_pan_max: default_pan_range(),
            camera_tilt_min: default_tilt_range(),
            camera_tilt_max: default_tilt_range(),
            adjustable_speed: true,
            drive_backward: true,
            battery_power: true,
            battery_level: default_battery_level(),
            battery_drain_per_minute: default_battery_drain(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            port: default_camera_port(),
            protocol: default_camera_protocol(),
            path: default_camera_path(),
            startup_delay_ms: default_camera_startup_delay_ms(),
            command: None,
        }
    }
}

// ── Derived views ─────────────────────────────────────────────────────────────

impl HostConfig {
    /// Generates a password when none is configured. Returns `true` if one
    /// was generated and the file should be saved.
    pub fn ensure_password(&mut self) -> bool {
        if self.security.password.is_some() {
            return false;
        }
        self.security.password = Some(generate_default_password());
        true
    }

    /// Restores every setting to its default.
    pub fn reset(&mut self) {
        *self = HostConfig::default();
    }

    pub fn share_any_location_feature(&self) -> bool {
        self.sharing.location || self.sharing.bearing || self.sharing.speed
    }

    pub fn can_rotate_camera(&self) -> bool {
        self.sharing.rotate_camera && self.sharing.camera
    }

    /// Settings as seen by a Host session. An unset password matches only
    /// the empty password.
    pub fn settings(&self) -> HostSettings {
        HostSettings {
            password: self.security.password.clone().unwrap_or_default(),
            share_location: self.sharing.location,
            share_bearing: self.sharing.bearing,
            share_speed: self.sharing.speed,
            share_camera: self.sharing.camera,
            rotate_camera: self.sharing.rotate_camera,
            camera_startup_delay: Duration::from_millis(self.camera.startup_delay_ms),
        }
    }

    pub fn car_features(&self) -> CarFeatures {
        let v = &self.vehicle;
        CarFeatures {
            camera_pan_min: v.camera_pan_min,
            camera_pan_max: v.camera_pan_max,
            camera_tilt_min: v.camera_tilt_min,
            camera_tilt_max: v.camera_tilt_max,
            adjustable_speed: v.adjustable_speed,
            drive_backward: v.drive_backward,
            battery_power: v.battery_power,
        }
    }

    pub fn camera_parameter(&self) -> CameraConnectionParameterMessage {
        CameraConnectionParameterMessage {
            port: self.camera.port,
            protocol: self.camera.protocol.clone(),
            path: self.camera.path.clone(),
        }
    }

    pub fn location(&self) -> Location {
        Location {
            altitude: self.location.altitude,
            ..Location::new(self.location.latitude, self.location.longitude)
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Directory holding the Host and Client settings files.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("host.toml"))
}

/// Loads the settings from the default location.
pub fn load_config() -> Result<HostConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads the settings from `path`, returning defaults if the file does not
/// exist yet.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<HostConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HostConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub fn save_config(config: &HostConfig) -> Result<(), ConfigError> {
    save_config_to(config, &config_file_path()?)
}

/// Writes `config` to `path`, creating parent directories as needed.
pub fn save_config_to(config: &HostConfig, path: &Path) -> Result<(), ConfigError> {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_shares_everything_on_default_port() {
        // Arrange / Act
        let cfg = HostConfig::default();

        // Assert
        assert_eq!(cfg.network.port, 4253);
        assert_eq!(cfg.host.log_level, "info");
        assert!(cfg.share_any_location_feature());
        assert!(cfg.can_rotate_camera());
        assert_eq!(cfg.security.password, None);
    }

    #[test]
    fn test_rotate_camera_requires_camera_sharing() {
        let mut cfg = HostConfig::default();
        cfg.sharing.camera = false;

        assert!(!cfg.can_rotate_camera());
        assert!(!cfg.settings().can_rotate_camera());
    }

    #[test]
    fn test_ensure_password_generates_once() {
        // Arrange
        let mut cfg = HostConfig::default();

        // Act
        let generated = cfg.ensure_password();
        let first = cfg.security.password.clone();
        let again = cfg.ensure_password();

        // Assert
        assert!(generated);
        assert!(!again);
        assert_eq!(first.as_deref().map(str::len), Some(6));
        assert_eq!(cfg.security.password, first);
    }

    #[test]
    fn test_deserialize_partial_toml_keeps_other_defaults() {
        // Arrange
        let toml_str = r#"
[network]
port = 5000

[sharing]
camera = false
"#;

        // Act
        let cfg: HostConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.network.port, 5000);
        assert_eq!(cfg.network.bind_address, "0.0.0.0");
        assert!(!cfg.sharing.camera);
        assert!(cfg.sharing.location);
        assert_eq!(cfg.camera.startup_delay_ms, 3000);
    }

    #[test]
    fn test_settings_carry_password_and_delay() {
        let mut cfg = HostConfig::default();
        cfg.security.password = Some("FooBar".to_string());
        cfg.camera.startup_delay_ms = 250;

        let settings = cfg.settings();

        assert_eq!(settings.password, "FooBar");
        assert_eq!(settings.camera_startup_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut cfg = HostConfig::default();
        cfg.network.port = 1;
        cfg.security.password = Some("secret".to_string());

        cfg.reset();

        assert_eq!(cfg, HostConfig::default());
    }

    #[test]
    fn test_load_config_from_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();

        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(cfg, HostConfig::default());
    }

    #[test]
    fn test_save_then_load_preserves_settings() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("host.toml");
        let mut cfg = HostConfig::default();
        cfg.security.password = Some("FooBar".to_string());
        cfg.vehicle.drive_backward = false;
        cfg.camera.command = Some(vec!["streamer".to_string(), "--port".to_string()]);

        // Act
        save_config_to(&cfg, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();

        // Assert
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn test_malformed_file_returns_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.toml");
        std::fs::write(&path, "[[[ not valid toml").unwrap();

        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_config_file_path_ends_with_host_toml() {
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with("host.toml"), "got {path:?}");
        }
    }
}
