//! Closed set of selectable engine backends.
//!
//! The gateway is built against these enums rather than generics so that a
//! configuration file can choose the backend at runtime. Every variant
//! delegates to a concrete controller; adding a backend means adding a
//! variant here and nowhere else.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::engine::{EngineError, LocalEngine, RawSimulation};
use crate::model::{AircraftSpawn, Callsign, RouteLeg, Waypoint};
use crate::protocol::RawAircraft;

use super::remote::{RemoteAircraft, RemoteSimulation, RemoteWaypoints};
use super::{AircraftCommands, SimulationCommands, WaypointCommands};

/// Which engine a gateway drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Networked engine reached over the event and stream channels.
    #[default]
    Remote,
    /// Deterministic in-process engine.
    Local,
}

/// Unrecognized backend name.
#[derive(Debug, Error)]
#[error("unknown backend '{0}', expected 'remote' or 'local'")]
pub struct UnknownBackend(String);

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "remote" => Ok(Self::Remote),
            "local" => Ok(Self::Local),
            _ => Err(UnknownBackend(s.to_string())),
        }
    }
}

/// Aircraft controller for the selected backend.
#[derive(Debug, Clone)]
pub enum AircraftBackend {
    Remote(RemoteAircraft),
    Local(LocalEngine),
}

impl AircraftCommands for AircraftBackend {
    async fn create(&self, spawn: &AircraftSpawn) -> Result<(), EngineError> {
        match self {
            Self::Remote(remote) => remote.create(spawn).await,
            Self::Local(local) => local.create(spawn).await,
        }
    }

    async fn delete(&self, callsign: &Callsign) -> Result<(), EngineError> {
        match self {
            Self::Remote(remote) => remote.delete(callsign).await,
            Self::Local(local) => local.delete(callsign).await,
        }
    }

    async fn set_cleared_flight_level(
        &self,
        callsign: &Callsign,
        altitude_ft: f64,
    ) -> Result<(), EngineError> {
        match self {
            Self::Remote(remote) => remote.set_cleared_flight_level(callsign, altitude_ft).await,
            Self::Local(local) => local.set_cleared_flight_level(callsign, altitude_ft).await,
        }
    }

    async fn set_heading(&self, callsign: &Callsign, heading_deg: f64) -> Result<(), EngineError> {
        match self {
            Self::Remote(remote) => remote.set_heading(callsign, heading_deg).await,
            Self::Local(local) => local.set_heading(callsign, heading_deg).await,
        }
    }

    async fn set_ground_speed(&self, callsign: &Callsign, speed_kt: f64) -> Result<(), EngineError> {
        match self {
            Self::Remote(remote) => remote.set_ground_speed(callsign, speed_kt).await,
            Self::Local(local) => local.set_ground_speed(callsign, speed_kt).await,
        }
    }

    async fn set_vertical_speed(
        &self,
        callsign: &Callsign,
        rate_fpm: f64,
    ) -> Result<(), EngineError> {
        match self {
            Self::Remote(remote) => remote.set_vertical_speed(callsign, rate_fpm).await,
            Self::Local(local) => local.set_vertical_speed(callsign, rate_fpm).await,
        }
    }

    async fn direct_to(&self, callsign: &Callsign, waypoint: &str) -> Result<(), EngineError> {
        match self {
            Self::Remote(remote) => remote.direct_to(callsign, waypoint).await,
            Self::Local(local) => local.direct_to(callsign, waypoint).await,
        }
    }

    async fn add_route_leg(&self, callsign: &Callsign, leg: &RouteLeg) -> Result<(), EngineError> {
        match self {
            Self::Remote(remote) => remote.add_route_leg(callsign, leg).await,
            Self::Local(local) => local.add_route_leg(callsign, leg).await,
        }
    }

    async fn list_route(&self, callsign: &Callsign) -> Result<Vec<String>, EngineError> {
        match self {
            Self::Remote(remote) => remote.list_route(callsign).await,
            Self::Local(local) => local.list_route(callsign).await,
        }
    }

    async fn raw_table(&self) -> Result<HashMap<Callsign, RawAircraft>, EngineError> {
        match self {
            Self::Remote(remote) => remote.raw_table().await,
            Self::Local(local) => local.raw_table().await,
        }
    }
}

/// Simulation controller for the selected backend.
#[derive(Debug, Clone)]
pub enum SimulationBackend {
    Remote(RemoteSimulation),
    Local(LocalEngine),
}

impl SimulationCommands for SimulationBackend {
    async fn raw_properties(&self) -> Result<RawSimulation, EngineError> {
        match self {
            Self::Remote(remote) => remote.raw_properties().await,
            Self::Local(local) => local.raw_properties().await,
        }
    }

    async fn step(&self) -> Result<(), EngineError> {
        match self {
            Self::Remote(remote) => remote.step().await,
            Self::Local(local) => local.step().await,
        }
    }

    async fn reset(&self) -> Result<(), EngineError> {
        match self {
            Self::Remote(remote) => remote.reset().await,
            Self::Local(local) => local.reset().await,
        }
    }

    async fn load_scenario(&self, name: &str) -> Result<(), EngineError> {
        match self {
            Self::Remote(remote) => remote.load_scenario(name).await,
            Self::Local(local) => local.load_scenario(name).await,
        }
    }

    async fn upload_scenario(&self, name: &str, content_json: &str) -> Result<(), EngineError> {
        match self {
            Self::Remote(remote) => remote.upload_scenario(name, content_json).await,
            Self::Local(local) => local.upload_scenario(name, content_json).await,
        }
    }

    async fn pause(&self) -> Result<(), EngineError> {
        match self {
            Self::Remote(remote) => remote.pause().await,
            Self::Local(local) => local.pause().await,
        }
    }

    async fn resume(&self) -> Result<(), EngineError> {
        match self {
            Self::Remote(remote) => remote.resume().await,
            Self::Local(local) => local.resume().await,
        }
    }

    async fn set_step_size(&self, seconds: f64) -> Result<(), EngineError> {
        match self {
            Self::Remote(remote) => remote.set_step_size(seconds).await,
            Self::Local(local) => local.set_step_size(seconds).await,
        }
    }

    async fn set_speed_multiplier(&self, factor: f64) -> Result<(), EngineError> {
        match self {
            Self::Remote(remote) => remote.set_speed_multiplier(factor).await,
            Self::Local(local) => local.set_speed_multiplier(factor).await,
        }
    }

    async fn set_seed(&self, seed: u64) -> Result<(), EngineError> {
        match self {
            Self::Remote(remote) => remote.set_seed(seed).await,
            Self::Local(local) => local.set_seed(seed).await,
        }
    }

    async fn shutdown(&self) -> Result<(), EngineError> {
        match self {
            Self::Remote(remote) => remote.shutdown().await,
            Self::Local(local) => local.shutdown().await,
        }
    }
}

/// Waypoint controller for the selected backend.
#[derive(Debug, Clone)]
pub enum WaypointBackend {
    Remote(RemoteWaypoints),
    Local(LocalEngine),
}

impl WaypointCommands for WaypointBackend {
    async fn define(&self, waypoint: &Waypoint) -> Result<(), EngineError> {
        match self {
            Self::Remote(remote) => remote.define(waypoint).await,
            Self::Local(local) => local.define(waypoint).await,
        }
    }
}
