//! Persistent configuration: `~/.towerlink/config.ini`.
//!
//! The in-memory configuration structs ([`GatewayConfig`], [`EngineConfig`],
//! [`ProxyConfig`]) live with the modules they configure. This module covers
//! the on-disk side: settings structs mirroring the INI sections, typed
//! load/save, and conversion into a [`GatewayConfig`] for
//! [`Gateway::connect`].
//!
//! [`GatewayConfig`]: crate::gateway::GatewayConfig
//! [`EngineConfig`]: crate::engine::EngineConfig
//! [`ProxyConfig`]: crate::proxy::ProxyConfig
//! [`Gateway::connect`]: crate::gateway::Gateway::connect

mod file;
mod settings;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{ConfigFile, EngineSettings, LoggingSettings, ProxySettings};
