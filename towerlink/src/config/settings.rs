//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types; parsing and serialization live in
//! [`super::file`].

use std::path::PathBuf;
use std::time::Duration;

use crate::control::BackendKind;
use crate::engine::EngineConfig;
use crate::gateway::GatewayConfig;
use crate::proxy::ProxyConfig;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    /// Engine link settings
    pub engine: EngineSettings,
    /// Proxy cache settings
    pub proxy: ProxySettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Engine link configuration.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Backend selection: "remote" or "local"
    pub backend: BackendKind,
    /// Engine host name or address
    pub host: String,
    /// Event channel port (commands out, events in)
    pub event_port: u16,
    /// Stream channel port (broadcasts in)
    pub stream_port: u16,
    /// Bound in seconds on each TCP connect and the first-broadcast wait
    pub connect_timeout_secs: u64,
    /// Bound in seconds on command confirmation waits
    pub command_timeout_secs: u64,
    /// Broadcast silence in seconds before the connection is declared lost
    pub staleness_threshold_secs: u64,
}

/// Proxy cache configuration.
#[derive(Debug, Clone)]
pub struct ProxySettings {
    /// Table re-fetches to try before declaring a created aircraft not visible
    pub create_poll_attempts: u32,
    /// Interval between re-fetches in milliseconds
    pub create_poll_interval_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}

// Section defaults are derived from the library config structs so the
// canonical values live in one place.

impl Default for EngineSettings {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            backend: BackendKind::default(),
            host: engine.host,
            event_port: engine.event_port,
            stream_port: engine.stream_port,
            connect_timeout_secs: engine.connect_timeout.as_secs(),
            command_timeout_secs: engine.command_timeout.as_secs(),
            staleness_threshold_secs: engine.staleness_threshold.as_secs(),
        }
    }
}

impl Default for ProxySettings {
    fn default() -> Self {
        let proxy = ProxyConfig::default();
        Self {
            create_poll_attempts: proxy.create_poll_attempts,
            create_poll_interval_ms: proxy.create_poll_interval.as_millis() as u64,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: super::file::config_directory().join("towerlink.log"),
        }
    }
}

impl ConfigFile {
    /// Build the [`GatewayConfig`] these settings describe.
    pub fn gateway_config(&self) -> GatewayConfig {
        let engine = EngineConfig::default()
            .with_host(self.engine.host.clone())
            .with_ports(self.engine.event_port, self.engine.stream_port)
            .with_connect_timeout(Duration::from_secs(self.engine.connect_timeout_secs))
            .with_command_timeout(Duration::from_secs(self.engine.command_timeout_secs))
            .with_staleness_threshold(Duration::from_secs(self.engine.staleness_threshold_secs));

        let proxy = ProxyConfig::default()
            .with_create_poll_attempts(self.proxy.create_poll_attempts)
            .with_create_poll_interval(Duration::from_millis(self.proxy.create_poll_interval_ms));

        GatewayConfig::default()
            .with_backend(self.engine.backend)
            .with_engine(engine)
            .with_proxy(proxy)
    }
}
