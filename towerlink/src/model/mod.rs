//! Core domain types shared across the gateway.
//!
//! These are plain data types with no protocol or concurrency concerns:
//! aircraft identity and properties, routes and waypoints, and simulation
//! state. The split between engine-reported and proxy-tracked fields is
//! documented on each type; the [`crate::proxy`] layer enforces it.

mod aircraft;
mod route;
mod simulation;

pub use aircraft::{AircraftProperties, AircraftSpawn, Callsign, Position};
pub use route::{Route, RouteLeg, Waypoint};
pub use simulation::{RunState, SimulationProperties};
