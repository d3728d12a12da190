//! Status command - show engine link and simulation state.

use super::common::{self, ConnectArgs};
use crate::error::CliError;

/// Run the status command.
pub async fn run(connect: &ConnectArgs) -> Result<(), CliError> {
    let (_runner, gateway) = common::connect_gateway(connect, "status").await?;

    let simulation = gateway.simulation().properties().await?;
    let mut aircraft: Vec<_> = gateway
        .aircraft()
        .all_properties()
        .await?
        .into_iter()
        .collect();
    let mode = gateway.coordinator().mode().await;
    let nodes = gateway.nodes();

    println!("TowerLink v{}", towerlink::VERSION);
    println!("{}", "=".repeat(40));
    println!();
    println!("Link:      {}", if gateway.is_connected() { "up" } else { "lost" });
    if !nodes.is_empty() {
        println!("Nodes:     {}", nodes.join(", "));
    }
    println!("State:     {}", simulation.state);
    println!("Mode:      {}", mode);
    println!("UTC:       {}", simulation.utc);
    println!("Elapsed:   {:.1} s", simulation.elapsed_sec);
    println!("Step size: {:.2} s", simulation.step_size_sec);
    println!("Speed:     {:.1}x", simulation.speed_multiplier);
    if let Some(scenario) = &simulation.scenario_name {
        println!("Scenario:  {}", scenario);
    }
    if let Some(sector) = &simulation.sector_name {
        println!("Sector:    {}", sector);
    }
    if let Some(seed) = simulation.seed {
        println!("Seed:      {}", seed);
    }
    println!();

    if aircraft.is_empty() {
        println!("No aircraft.");
        return Ok(());
    }

    println!("Aircraft ({}):", aircraft.len());
    aircraft.sort_by(|a, b| a.0.cmp(&b.0));
    for (callsign, properties) in aircraft {
        println!(
            "  {:<8} {:>9.4} {:>10.4}  {:>6.0} ft  hdg {:>3.0}  {:>3.0} kt  cleared {:<6} requested {:<6} route {}",
            callsign,
            properties.position.latitude_deg,
            properties.position.longitude_deg,
            properties.altitude_ft,
            properties.heading_deg,
            properties.ground_speed_kt,
            common::format_optional_fl(properties.cleared_flight_level),
            common::format_optional_fl(properties.requested_flight_level),
            properties.route_name.as_deref().unwrap_or("-"),
        );
    }

    Ok(())
}
