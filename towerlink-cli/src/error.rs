//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use towerlink::coordinator::ModeError;
use towerlink::gateway::GatewayError;
use towerlink::proxy::ProxyError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to connect to the engine
    Connect(GatewayError),
    /// A gateway operation failed
    Gateway(GatewayError),
    /// A proxy operation was rejected or failed
    Proxy(ProxyError),
    /// An operating-mode operation was rejected
    Mode(ModeError),
    /// Failed to read an input file
    FileRead { path: String, error: std::io::Error },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        if let CliError::Connect(_) = self {
            eprintln!();
            eprintln!("Check that:");
            eprintln!("  1. The engine is running and reachable at the configured host");
            eprintln!("  2. engine.event_port and engine.stream_port match the engine's ports");
            eprintln!("  3. Or pass --local to run against the in-process engine");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Connect(e) => write!(f, "Failed to connect to engine: {}", e),
            CliError::Gateway(e) => write!(f, "{}", e),
            CliError::Proxy(e) => write!(f, "{}", e),
            CliError::Mode(e) => write!(f, "{}", e),
            CliError::FileRead { path, error } => {
                write!(f, "Failed to read file '{}': {}", path, error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Connect(e) => Some(e),
            CliError::Gateway(e) => Some(e),
            CliError::Proxy(e) => Some(e),
            CliError::Mode(e) => Some(e),
            CliError::FileRead { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<GatewayError> for CliError {
    fn from(e: GatewayError) -> Self {
        CliError::Gateway(e)
    }
}

impl From<ProxyError> for CliError {
    fn from(e: ProxyError) -> Self {
        CliError::Proxy(e)
    }
}

impl From<ModeError> for CliError {
    fn from(e: ModeError) -> Self {
        CliError::Mode(e)
    }
}
