//! Configuration file handling for ~/.towerlink/config.ini.
//!
//! Loads and saves user configuration with sensible defaults. Settings
//! structs live in [`super::settings`]; this module maps INI keys onto them
//! and back.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::settings::ConfigFile;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.towerlink/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        let path = config_file_path();
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }

    /// Save configuration to the default path (~/.towerlink/config.ini).
    pub fn save(&self) -> Result<(), ConfigFileError> {
        let path = config_file_path();
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Create the default config file if it doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            let config = Self::default();
            config.save_to(&path)?;
        }
        Ok(path)
    }
}

/// Get the path to the config directory (~/.towerlink).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".towerlink")
}

/// Get the path to the config file (~/.towerlink/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in
/// the INI.
fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [engine] section
    if let Some(section) = ini.section(Some("engine")) {
        if let Some(v) = section.get("backend") {
            config.engine.backend = v.parse().map_err(|_| ConfigFileError::InvalidValue {
                section: "engine".to_string(),
                key: "backend".to_string(),
                value: v.to_string(),
                reason: "must be 'remote' or 'local'".to_string(),
            })?;
        }
        if let Some(v) = section.get("host") {
            let v = v.trim();
            if !v.is_empty() {
                config.engine.host = v.to_string();
            }
        }
        if let Some(v) = section.get("event_port") {
            config.engine.event_port =
                v.parse().map_err(|_| ConfigFileError::InvalidValue {
                    section: "engine".to_string(),
                    key: "event_port".to_string(),
                    value: v.to_string(),
                    reason: "must be a port number (1-65535)".to_string(),
                })?;
        }
        if let Some(v) = section.get("stream_port") {
            config.engine.stream_port =
                v.parse().map_err(|_| ConfigFileError::InvalidValue {
                    section: "engine".to_string(),
                    key: "stream_port".to_string(),
                    value: v.to_string(),
                    reason: "must be a port number (1-65535)".to_string(),
                })?;
        }
        if let Some(v) = section.get("connect_timeout_secs") {
            config.engine.connect_timeout_secs =
                v.parse().map_err(|_| ConfigFileError::InvalidValue {
                    section: "engine".to_string(),
                    key: "connect_timeout_secs".to_string(),
                    value: v.to_string(),
                    reason: "must be a positive integer (seconds)".to_string(),
                })?;
        }
        if let Some(v) = section.get("command_timeout_secs") {
            config.engine.command_timeout_secs =
                v.parse().map_err(|_| ConfigFileError::InvalidValue {
                    section: "engine".to_string(),
                    key: "command_timeout_secs".to_string(),
                    value: v.to_string(),
                    reason: "must be a positive integer (seconds)".to_string(),
                })?;
        }
        if let Some(v) = section.get("staleness_threshold_secs") {
            config.engine.staleness_threshold_secs =
                v.parse().map_err(|_| ConfigFileError::InvalidValue {
                    section: "engine".to_string(),
                    key: "staleness_threshold_secs".to_string(),
                    value: v.to_string(),
                    reason: "must be a positive integer (seconds)".to_string(),
                })?;
        }
    }

    // [proxy] section
    if let Some(section) = ini.section(Some("proxy")) {
        if let Some(v) = section.get("create_poll_attempts") {
            config.proxy.create_poll_attempts =
                v.parse().map_err(|_| ConfigFileError::InvalidValue {
                    section: "proxy".to_string(),
                    key: "create_poll_attempts".to_string(),
                    value: v.to_string(),
                    reason: "must be a positive integer".to_string(),
                })?;
        }
        if let Some(v) = section.get("create_poll_interval_ms") {
            config.proxy.create_poll_interval_ms =
                v.parse().map_err(|_| ConfigFileError::InvalidValue {
                    section: "proxy".to_string(),
                    key: "create_poll_interval_ms".to_string(),
                    value: v.to_string(),
                    reason: "must be a positive integer (milliseconds)".to_string(),
                })?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

/// Convert a `ConfigFile` to a commented INI string for saving.
fn to_config_string(config: &ConfigFile) -> String {
    format!(
        r#"[engine]
; Backend: remote (TCP link to a running engine) or local (in-process engine)
backend = {}
; Engine host name or address
host = {}
; Event channel port (commands out, events in)
event_port = {}
; Stream channel port (periodic state broadcasts in)
stream_port = {}
; Bound in seconds on each TCP connect and the first-broadcast wait (default: 5)
connect_timeout_secs = {}
; Bound in seconds on command confirmation waits (default: 5)
command_timeout_secs = {}
; Broadcast silence in seconds before the connection is declared lost (default: 3)
staleness_threshold_secs = {}

[proxy]
; Table re-fetches to try before declaring a created aircraft not visible (default: 10)
create_poll_attempts = {}
; Interval in milliseconds between re-fetches (default: 100)
create_poll_interval_ms = {}

[logging]
; Log file path
file = {}
"#,
        config.engine.backend,
        config.engine.host,
        config.engine.event_port,
        config.engine.stream_port,
        config.engine.connect_timeout_secs,
        config.engine.command_timeout_secs,
        config.engine.staleness_threshold_secs,
        config.proxy.create_poll_attempts,
        config.proxy.create_poll_interval_ms,
        config.logging.file.display(),
    )
}

/// Expand ~ to home directory in paths.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
