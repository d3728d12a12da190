//! TowerLink CLI - command-line control for the simulation gateway.
//!
//! This binary provides a command-line interface to the TowerLink library.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::common::ConnectArgs;
use commands::config::ConfigCommands;
use commands::create::CreateArgs;
use commands::scenario::ScenarioAction;

#[derive(Parser)]
#[command(name = "towerlink")]
#[command(version = towerlink::VERSION)]
#[command(about = "Control gateway for remote flight-simulation engines", long_about = None)]
struct Cli {
    /// Use the in-process local engine instead of a remote link
    #[arg(long, global = true)]
    local: bool,

    /// Engine host, overriding config.ini
    #[arg(long, global = true)]
    host: Option<String>,

    /// Enable debug logging regardless of RUST_LOG
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show engine link and simulation status
    Status,

    /// Create an aircraft
    Create(CreateArgs),

    /// Advance the simulation in stepped mode
    Step {
        /// Number of steps to advance
        #[arg(long, default_value_t = 1)]
        count: u32,
    },

    /// Follow live simulation state until Ctrl+C
    Watch {
        /// Seconds between state printouts
        #[arg(long, default_value_t = 2)]
        interval: u64,
    },

    /// Load scenario and sector documents
    Scenario {
        #[command(subcommand)]
        action: ScenarioAction,
    },

    /// Reset the simulation to its initial state
    Reset,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let connect = ConnectArgs {
        local: cli.local,
        host: cli.host,
        debug: cli.debug,
    };

    let result = match cli.command {
        Commands::Status => commands::status::run(&connect).await,
        Commands::Create(args) => commands::create::run(args, &connect).await,
        Commands::Step { count } => commands::step::run(count, &connect).await,
        Commands::Watch { interval } => commands::watch::run(interval, &connect).await,
        Commands::Scenario { action } => commands::scenario::run(action, &connect).await,
        Commands::Reset => commands::reset::run(&connect).await,
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        e.exit();
    }
}
