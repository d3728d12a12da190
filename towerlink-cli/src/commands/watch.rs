//! Watch command - follow live simulation state until Ctrl+C.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use towerlink::gateway::Gateway;

use super::common::{self, ConnectArgs};
use crate::error::CliError;

/// Run the watch command.
pub async fn run(interval_secs: u64, connect: &ConnectArgs) -> Result<(), CliError> {
    let (_runner, gateway) = common::connect_gateway(connect, "watch").await?;

    // Set up signal handler for a clean stop
    let stop = Arc::new(AtomicBool::new(false));
    let stop_clone = stop.clone();

    ctrlc::set_handler(move || {
        stop_clone.store(true, Ordering::SeqCst);
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    println!("Watching simulation state. Press Ctrl+C to stop.");
    println!();

    let interval = Duration::from_secs(interval_secs.max(1));
    let mut next_print = Instant::now();

    while !stop.load(Ordering::SeqCst) {
        if Instant::now() >= next_print {
            print_snapshot(&gateway).await?;
            next_print = Instant::now() + interval;
        }
        // Short sleep so Ctrl+C is honored promptly
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    println!();
    println!("Stopped.");
    Ok(())
}

/// Print one state line plus a line per aircraft.
async fn print_snapshot(gateway: &Gateway) -> Result<(), CliError> {
    // Drop the cached snapshots so each tick reflects the latest broadcast
    gateway.simulation().invalidate();
    gateway.aircraft().invalidate();

    let simulation = gateway.simulation().properties().await?;
    let mut aircraft: Vec<_> = gateway
        .aircraft()
        .all_properties()
        .await?
        .into_iter()
        .collect();
    aircraft.sort_by(|a, b| a.0.cmp(&b.0));

    println!(
        "[{}] {} | elapsed {:.1} s | {} aircraft",
        simulation.utc,
        simulation.state,
        simulation.elapsed_sec,
        aircraft.len()
    );
    for (callsign, properties) in aircraft {
        println!(
            "  {:<8} {:>9.4} {:>10.4}  {:>6.0} ft  hdg {:>3.0}  {:>3.0} kt",
            callsign,
            properties.position.latitude_deg,
            properties.position.longitude_deg,
            properties.altitude_ft,
            properties.heading_deg,
            properties.ground_speed_kt,
        );
    }

    Ok(())
}
