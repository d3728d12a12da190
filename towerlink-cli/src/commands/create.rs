//! Create command - spawn an aircraft and wait for it to become visible.

use clap::Args;

use towerlink::model::{AircraftSpawn, Position};

use super::common::{self, ConnectArgs};
use crate::error::CliError;

/// Arguments for the create command.
#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Callsign for the new aircraft (case-insensitive)
    pub callsign: String,

    /// Aircraft type designator
    #[arg(long = "type", default_value = "B738")]
    pub aircraft_type: String,

    /// Initial latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Initial longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// Initial heading in degrees
    #[arg(long, default_value_t = 360.0)]
    pub heading: f64,

    /// Initial altitude in feet
    #[arg(long)]
    pub altitude: f64,

    /// Initial ground speed in knots
    #[arg(long)]
    pub speed: f64,

    /// Route assigned at creation (must exist in the loaded sector)
    #[arg(long)]
    pub route: Option<String>,

    /// Cleared flight level, e.g. 120 for FL120
    #[arg(long)]
    pub cleared_fl: Option<u32>,

    /// Requested flight level
    #[arg(long)]
    pub requested_fl: Option<u32>,
}

/// Run the create command.
pub async fn run(args: CreateArgs, connect: &ConnectArgs) -> Result<(), CliError> {
    let (_runner, gateway) = common::connect_gateway(connect, "create").await?;

    let mut spawn = AircraftSpawn::new(
        args.callsign.as_str(),
        args.aircraft_type,
        Position::new(args.lat, args.lon),
        args.heading,
        args.altitude,
        args.speed,
    )
    .with_flight_levels(args.cleared_fl, args.requested_fl);
    if let Some(route) = args.route {
        spawn = spawn.with_route(route);
    }

    let callsign = spawn.callsign.clone();
    gateway.aircraft().create(&spawn).await?;

    let properties = gateway.aircraft().properties(&callsign).await?;
    println!(
        "Created {} ({}) at {:.4}, {:.4}",
        callsign,
        properties.aircraft_type,
        properties.position.latitude_deg,
        properties.position.longitude_deg,
    );
    println!(
        "  altitude {:.0} ft, heading {:.0}, {:.0} kt",
        properties.altitude_ft, properties.heading_deg, properties.ground_speed_kt
    );
    if let Some(route) = &properties.route_name {
        println!("  route {}", route);
    }

    Ok(())
}
