//! Reset command - return the simulation to its initial state.

use super::common::{self, ConnectArgs};
use crate::error::CliError;

/// Run the reset command.
pub async fn run(connect: &ConnectArgs) -> Result<(), CliError> {
    let (_runner, gateway) = common::connect_gateway(connect, "reset").await?;

    gateway.reset().await?;

    println!("Simulation reset. Aircraft, routes, and tracked state cleared.");
    Ok(())
}
