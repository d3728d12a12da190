//! Capability controllers: the typed command surface over an engine.
//!
//! Three traits split the engine's command set by concern: aircraft,
//! simulation, and waypoints. The remote implementations ([`remote`]) build wire
//! command text and run the bounded confirmation waits over an
//! [`EngineHandle`](crate::engine::EngineHandle); the in-process
//! [`LocalEngine`](crate::engine::LocalEngine) implements the same traits
//! directly. [`backend`] wraps both in closed enums so the variant is a
//! configuration choice, not a type parameter leaking to callers.

pub mod backend;
pub mod remote;

pub use backend::{
    AircraftBackend, BackendKind, SimulationBackend, UnknownBackend, WaypointBackend,
};
pub use remote::{RemoteAircraft, RemoteSimulation, RemoteWaypoints};

use std::collections::HashMap;
use std::future::Future;

use crate::engine::{EngineError, RawSimulation};
use crate::model::{AircraftSpawn, Callsign, RouteLeg, Waypoint};
use crate::protocol::RawAircraft;

/// Aircraft lifecycle and clearance commands.
pub trait AircraftCommands: Send + Sync {
    fn create(&self, spawn: &AircraftSpawn)
        -> impl Future<Output = Result<(), EngineError>> + Send;

    fn delete(&self, callsign: &Callsign)
        -> impl Future<Output = Result<(), EngineError>> + Send;

    /// Clear the aircraft to an altitude, expressed in feet.
    fn set_cleared_flight_level(
        &self,
        callsign: &Callsign,
        altitude_ft: f64,
    ) -> impl Future<Output = Result<(), EngineError>> + Send;

    fn set_heading(
        &self,
        callsign: &Callsign,
        heading_deg: f64,
    ) -> impl Future<Output = Result<(), EngineError>> + Send;

    fn set_ground_speed(
        &self,
        callsign: &Callsign,
        speed_kt: f64,
    ) -> impl Future<Output = Result<(), EngineError>> + Send;

    fn set_vertical_speed(
        &self,
        callsign: &Callsign,
        rate_fpm: f64,
    ) -> impl Future<Output = Result<(), EngineError>> + Send;

    fn direct_to(
        &self,
        callsign: &Callsign,
        waypoint: &str,
    ) -> impl Future<Output = Result<(), EngineError>> + Send;

    fn add_route_leg(
        &self,
        callsign: &Callsign,
        leg: &RouteLeg,
    ) -> impl Future<Output = Result<(), EngineError>> + Send;

    /// Route listing as reported by the engine, one line per leg.
    fn list_route(
        &self,
        callsign: &Callsign,
    ) -> impl Future<Output = Result<Vec<String>, EngineError>> + Send;

    /// Last-reported raw aircraft table, keyed by callsign.
    fn raw_table(
        &self,
    ) -> impl Future<Output = Result<HashMap<Callsign, RawAircraft>, EngineError>> + Send;
}

/// Simulation lifecycle and clock commands.
pub trait SimulationCommands: Send + Sync {
    /// Last-reported raw simulation state.
    fn raw_properties(&self) -> impl Future<Output = Result<RawSimulation, EngineError>> + Send;

    /// Advance one step, confirmed by elapsed-time advancement, never by
    /// the command's echo.
    fn step(&self) -> impl Future<Output = Result<(), EngineError>> + Send;

    /// Reset the simulation and consume the engine's confirmation.
    fn reset(&self) -> impl Future<Output = Result<(), EngineError>> + Send;

    /// Initialize a scenario the engine already holds.
    fn load_scenario(&self, name: &str) -> impl Future<Output = Result<(), EngineError>> + Send;

    /// Push scenario content to the engine's store.
    fn upload_scenario(
        &self,
        name: &str,
        content_json: &str,
    ) -> impl Future<Output = Result<(), EngineError>> + Send;

    fn pause(&self) -> impl Future<Output = Result<(), EngineError>> + Send;

    fn resume(&self) -> impl Future<Output = Result<(), EngineError>> + Send;

    fn set_step_size(&self, seconds: f64)
        -> impl Future<Output = Result<(), EngineError>> + Send;

    fn set_speed_multiplier(
        &self,
        factor: f64,
    ) -> impl Future<Output = Result<(), EngineError>> + Send;

    fn set_seed(&self, seed: u64) -> impl Future<Output = Result<(), EngineError>> + Send;

    /// Ask the engine to exit. Tolerates an engine that dies before
    /// confirming.
    fn shutdown(&self) -> impl Future<Output = Result<(), EngineError>> + Send;
}

/// Waypoint definition commands.
pub trait WaypointCommands: Send + Sync {
    fn define(&self, waypoint: &Waypoint)
        -> impl Future<Output = Result<(), EngineError>> + Send;
}
