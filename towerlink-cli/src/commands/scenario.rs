//! Scenario commands - load scenario and sector documents.

use std::path::{Path, PathBuf};

use clap::Subcommand;

use towerlink::catalog::{scenario_from_json, sector_from_json};

use super::common::{self, ConnectArgs};
use crate::error::CliError;

/// Scenario subcommands.
#[derive(Debug, Subcommand)]
pub enum ScenarioAction {
    /// Load a scenario, replacing current traffic
    Load {
        /// Scenario name (catalog entry, or the name to store --file content under)
        name: String,

        /// Read the scenario document from a JSON file instead of the catalog
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Load a sector document (waypoints and routes) without touching traffic
    Sector {
        /// Sector name (catalog entry, or the name to store --file content under)
        name: String,

        /// Read the sector document from a JSON file instead of the catalog
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

/// Run a scenario subcommand.
pub async fn run(action: ScenarioAction, connect: &ConnectArgs) -> Result<(), CliError> {
    match action {
        ScenarioAction::Load { name, file } => run_load(&name, file, connect).await,
        ScenarioAction::Sector { name, file } => run_sector(&name, file, connect).await,
    }
}

/// Load a scenario into the engine.
async fn run_load(
    name: &str,
    file: Option<PathBuf>,
    connect: &ConnectArgs,
) -> Result<(), CliError> {
    let content = match file {
        Some(path) => {
            let json = read_document(&path)?;
            let definition =
                scenario_from_json(&json).map_err(|e| CliError::Config(e.to_string()))?;
            Some(definition)
        }
        None => None,
    };

    let (_runner, gateway) = common::connect_gateway(connect, "scenario load").await?;
    let definition = gateway.load_scenario(name, content).await?;

    println!(
        "Loaded scenario '{}': {} aircraft",
        definition.name,
        definition.spawns.len()
    );
    if let Some(sector) = &definition.sector {
        println!("  sector {}", sector);
    }
    if let Some(seed) = definition.seed {
        println!("  seed {}", seed);
    }

    Ok(())
}

/// Install a sector standalone.
async fn run_sector(
    name: &str,
    file: Option<PathBuf>,
    connect: &ConnectArgs,
) -> Result<(), CliError> {
    let content = match file {
        Some(path) => {
            let json = read_document(&path)?;
            let definition =
                sector_from_json(&json).map_err(|e| CliError::Config(e.to_string()))?;
            Some(definition)
        }
        None => None,
    };

    let (_runner, gateway) = common::connect_gateway(connect, "scenario sector").await?;
    gateway.load_sector(name, content).await?;

    let waypoints = gateway.waypoints().all();
    println!("Loaded sector '{}': {} waypoints", name, waypoints.len());

    Ok(())
}

fn read_document(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|error| CliError::FileRead {
        path: path.display().to_string(),
        error,
    })
}
