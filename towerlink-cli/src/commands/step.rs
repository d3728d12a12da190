//! Step command - advance the simulation in stepped mode.

use towerlink::coordinator::OperatingMode;

use super::common::{self, ConnectArgs};
use crate::error::CliError;

/// Run the step command.
///
/// Switches the gateway to stepped mode first; the engine holds between
/// steps from then on.
pub async fn run(count: u32, connect: &ConnectArgs) -> Result<(), CliError> {
    let (_runner, gateway) = common::connect_gateway(connect, "step").await?;

    gateway
        .coordinator()
        .set_mode(OperatingMode::Stepped)
        .await?;

    for _ in 0..count {
        gateway.coordinator().step().await?;
    }

    let simulation = gateway.simulation().properties().await?;
    println!(
        "Advanced {} step(s): elapsed {:.1} s, UTC {}",
        count, simulation.elapsed_sec, simulation.utc
    );

    Ok(())
}
