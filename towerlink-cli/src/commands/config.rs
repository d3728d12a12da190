//! Configuration management CLI commands.
//!
//! Provides `config get`, `config set`, `config list`, `config path`, and
//! `config init` commands for viewing and modifying configuration settings
//! from the command line.

use std::path::PathBuf;

use clap::Subcommand;

use towerlink::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// All known configuration keys in section.key form, in display order.
const ALL_KEYS: &[&str] = &[
    "engine.backend",
    "engine.host",
    "engine.event_port",
    "engine.stream_port",
    "engine.connect_timeout_secs",
    "engine.command_timeout_secs",
    "engine.staleness_threshold_secs",
    "proxy.create_poll_attempts",
    "proxy.create_poll_interval_ms",
    "logging.file",
];

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., engine.host)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., engine.host)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,

    /// Create the config file with defaults if it does not exist
    Init,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => run_get(&key),
        ConfigCommands::Set { key, value } => run_set(&key, &value),
        ConfigCommands::List => run_list(),
        ConfigCommands::Path => run_path(),
        ConfigCommands::Init => run_init(),
    }
}

/// Get a configuration value.
fn run_get(key: &str) -> Result<(), CliError> {
    let config = ConfigFile::load().unwrap_or_default();
    let value = get_key(&config, key).ok_or_else(|| unknown_key(key))?;
    println!("{}", value);
    Ok(())
}

/// Set a configuration value.
fn run_set(key: &str, value: &str) -> Result<(), CliError> {
    let mut config = ConfigFile::load().unwrap_or_default();
    set_key(&mut config, key, value)?;
    config
        .save()
        .map_err(|e| CliError::Config(e.to_string()))?;

    println!("Set {} = {}", key, value);
    Ok(())
}

/// List all configuration settings.
fn run_list() -> Result<(), CliError> {
    let config = ConfigFile::load().unwrap_or_default();

    println!("Configuration Settings");
    println!("======================");
    println!();

    let mut current_section = "";

    for key in ALL_KEYS {
        let section = key.split('.').next().unwrap_or("");

        // Print section header when section changes
        if section != current_section {
            if !current_section.is_empty() {
                println!();
            }
            println!("[{}]", section);
            current_section = section;
        }

        let value = get_key(&config, key).unwrap_or_default();
        let key_name = key.split('.').nth(1).unwrap_or(key);
        println!("  {} = {}", key_name, value);
    }

    Ok(())
}

/// Show the configuration file path.
fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}

/// Create the config file with defaults if missing.
fn run_init() -> Result<(), CliError> {
    let path = ConfigFile::ensure_exists().map_err(|e| CliError::Config(e.to_string()))?;
    println!("Configuration file: {}", path.display());
    Ok(())
}

/// Read a configuration value by section.key name.
fn get_key(config: &ConfigFile, key: &str) -> Option<String> {
    let value = match key {
        "engine.backend" => config.engine.backend.to_string(),
        "engine.host" => config.engine.host.clone(),
        "engine.event_port" => config.engine.event_port.to_string(),
        "engine.stream_port" => config.engine.stream_port.to_string(),
        "engine.connect_timeout_secs" => config.engine.connect_timeout_secs.to_string(),
        "engine.command_timeout_secs" => config.engine.command_timeout_secs.to_string(),
        "engine.staleness_threshold_secs" => config.engine.staleness_threshold_secs.to_string(),
        "proxy.create_poll_attempts" => config.proxy.create_poll_attempts.to_string(),
        "proxy.create_poll_interval_ms" => config.proxy.create_poll_interval_ms.to_string(),
        "logging.file" => config.logging.file.display().to_string(),
        _ => return None,
    };
    Some(value)
}

/// Write a configuration value by section.key name.
fn set_key(config: &mut ConfigFile, key: &str, value: &str) -> Result<(), CliError> {
    match key {
        "engine.backend" => {
            config.engine.backend = value
                .parse()
                .map_err(|_| invalid_value(key, value, "must be 'remote' or 'local'"))?;
        }
        "engine.host" => config.engine.host = value.to_string(),
        "engine.event_port" => {
            config.engine.event_port = parse_number(key, value, "port number (1-65535)")?;
        }
        "engine.stream_port" => {
            config.engine.stream_port = parse_number(key, value, "port number (1-65535)")?;
        }
        "engine.connect_timeout_secs" => {
            config.engine.connect_timeout_secs = parse_number(key, value, "number of seconds")?;
        }
        "engine.command_timeout_secs" => {
            config.engine.command_timeout_secs = parse_number(key, value, "number of seconds")?;
        }
        "engine.staleness_threshold_secs" => {
            config.engine.staleness_threshold_secs = parse_number(key, value, "number of seconds")?;
        }
        "proxy.create_poll_attempts" => {
            config.proxy.create_poll_attempts = parse_number(key, value, "positive integer")?;
        }
        "proxy.create_poll_interval_ms" => {
            config.proxy.create_poll_interval_ms =
                parse_number(key, value, "number of milliseconds")?;
        }
        "logging.file" => config.logging.file = PathBuf::from(value),
        _ => return Err(unknown_key(key)),
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(
    key: &str,
    value: &str,
    expected: &str,
) -> Result<T, CliError> {
    value
        .parse()
        .map_err(|_| invalid_value(key, value, &format!("must be a {}", expected)))
}

fn invalid_value(key: &str, value: &str, reason: &str) -> CliError {
    CliError::Config(format!("Invalid value for {}: '{}' - {}", key, value, reason))
}

fn unknown_key(key: &str) -> CliError {
    CliError::Config(format!(
        "Unknown configuration key '{}'. Use 'towerlink config list' to see available keys.",
        key
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use towerlink::control::BackendKind;

    #[test]
    fn test_every_listed_key_resolves() {
        let config = ConfigFile::default();
        for key in ALL_KEYS {
            assert!(get_key(&config, key).is_some(), "key {} did not resolve", key);
        }
    }

    #[test]
    fn test_set_and_get_roundtrip() {
        let mut config = ConfigFile::default();

        set_key(&mut config, "engine.backend", "local").unwrap();
        set_key(&mut config, "engine.host", "10.0.0.7").unwrap();
        set_key(&mut config, "proxy.create_poll_attempts", "25").unwrap();

        assert_eq!(config.engine.backend, BackendKind::Local);
        assert_eq!(get_key(&config, "engine.host").unwrap(), "10.0.0.7");
        assert_eq!(get_key(&config, "proxy.create_poll_attempts").unwrap(), "25");
    }

    #[test]
    fn test_unknown_and_invalid_values_error() {
        let mut config = ConfigFile::default();

        assert!(set_key(&mut config, "engine.nope", "x").is_err());
        assert!(set_key(&mut config, "engine.event_port", "not-a-port").is_err());
        assert!(set_key(&mut config, "engine.backend", "simulated").is_err());
    }
}
