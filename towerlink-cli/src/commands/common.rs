//! Common types and utilities shared across CLI commands.

use towerlink::config::ConfigFile;
use towerlink::control::BackendKind;
use towerlink::gateway::{Gateway, GatewayConfig};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Connection options shared by every gateway-backed command.
pub struct ConnectArgs {
    /// Force the in-process local engine.
    pub local: bool,
    /// Engine host override.
    pub host: Option<String>,
    /// Debug-level logging.
    pub debug: bool,
}

/// Resolve the gateway configuration from CLI flags and config.ini.
///
/// CLI takes precedence, then config.
pub fn resolve_gateway_config(args: &ConnectArgs, config: &ConfigFile) -> GatewayConfig {
    let mut gateway_config = config.gateway_config();

    if args.local {
        gateway_config = gateway_config.with_backend(BackendKind::Local);
    }
    if let Some(host) = &args.host {
        gateway_config.engine.host = host.clone();
    }

    gateway_config
}

/// Initialize the runner and connect the gateway for a command.
///
/// The returned runner must stay alive for the duration of the command;
/// dropping it stops file logging.
pub async fn connect_gateway(
    args: &ConnectArgs,
    command: &str,
) -> Result<(CliRunner, Gateway), CliError> {
    let runner = CliRunner::with_debug(args.debug)?;
    runner.log_startup(command);

    let gateway_config = resolve_gateway_config(args, runner.config());
    let gateway = Gateway::connect(gateway_config)
        .await
        .map_err(CliError::Connect)?;

    Ok((runner, gateway))
}

/// Format an optional flight level for display.
pub fn format_optional_fl(flight_level: Option<u32>) -> String {
    match flight_level {
        Some(fl) => towerlink::protocol::units::format_flight_level(fl),
        None => "-".to_string(),
    }
}
