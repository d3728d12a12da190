//! Capability implementations backed by a live engine link.
//!
//! Each controller is a thin veneer over [`EngineHandle`]: it renders the
//! typed request into a command line, picks the right acknowledgement
//! discipline (silence, reply lines, or a confirmation flag), and maps the
//! outcome back into a `Result`. No state lives here; everything observable
//! comes from the link's broadcast mirror.

use std::collections::HashMap;

use crate::engine::{EngineError, EngineHandle, RawSimulation};
use crate::model::{AircraftSpawn, Callsign, RouteLeg, Waypoint};
use crate::protocol::{command, RawAircraft};

use super::{AircraftCommands, SimulationCommands, WaypointCommands};

/// Aircraft commands over the engine link.
#[derive(Debug, Clone)]
pub struct RemoteAircraft {
    handle: EngineHandle,
}

impl RemoteAircraft {
    pub fn new(handle: EngineHandle) -> Self {
        Self { handle }
    }
}

impl AircraftCommands for RemoteAircraft {
    async fn create(&self, spawn: &AircraftSpawn) -> Result<(), EngineError> {
        self.handle.send_expect_silence(command::create(spawn)).await
    }

    async fn delete(&self, callsign: &Callsign) -> Result<(), EngineError> {
        self.handle
            .send_expect_silence(command::delete(callsign))
            .await
    }

    async fn set_cleared_flight_level(
        &self,
        callsign: &Callsign,
        altitude_ft: f64,
    ) -> Result<(), EngineError> {
        self.handle
            .send_expect_silence(command::cleared_flight_level(callsign, altitude_ft))
            .await
    }

    async fn set_heading(&self, callsign: &Callsign, heading_deg: f64) -> Result<(), EngineError> {
        self.handle
            .send_expect_silence(command::heading(callsign, heading_deg))
            .await
    }

    async fn set_ground_speed(&self, callsign: &Callsign, speed_kt: f64) -> Result<(), EngineError> {
        self.handle
            .send_expect_silence(command::ground_speed(callsign, speed_kt))
            .await
    }

    async fn set_vertical_speed(
        &self,
        callsign: &Callsign,
        rate_fpm: f64,
    ) -> Result<(), EngineError> {
        self.handle
            .send_expect_silence(command::vertical_speed(callsign, rate_fpm))
            .await
    }

    async fn direct_to(&self, callsign: &Callsign, waypoint: &str) -> Result<(), EngineError> {
        self.handle
            .send_expect_silence(command::direct_to(callsign, waypoint))
            .await
    }

    async fn add_route_leg(&self, callsign: &Callsign, leg: &RouteLeg) -> Result<(), EngineError> {
        self.handle
            .send_expect_silence(command::add_route_leg(callsign, leg))
            .await
    }

    async fn list_route(&self, callsign: &Callsign) -> Result<Vec<String>, EngineError> {
        self.handle
            .send_expect_reply(command::list_route(callsign))
            .await
    }

    async fn raw_table(&self) -> Result<HashMap<Callsign, RawAircraft>, EngineError> {
        self.handle.aircraft_table()
    }
}

/// Simulation commands over the engine link.
#[derive(Debug, Clone)]
pub struct RemoteSimulation {
    handle: EngineHandle,
}

impl RemoteSimulation {
    pub fn new(handle: EngineHandle) -> Self {
        Self { handle }
    }
}

impl SimulationCommands for RemoteSimulation {
    async fn raw_properties(&self) -> Result<RawSimulation, EngineError> {
        self.handle.simulation()
    }

    /// Steps the simulation and waits for the clock to move.
    ///
    /// The engine acknowledges STEP before it finishes computing the frame,
    /// so completion is judged by the broadcast elapsed time advancing past
    /// its pre-step value, not by the command echo.
    async fn step(&self) -> Result<(), EngineError> {
        let before = self.handle.simulation()?.elapsed_sec;
        self.handle.send_expect_silence(command::step()).await?;
        self.handle.wait_elapsed_beyond(before).await
    }

    async fn reset(&self) -> Result<(), EngineError> {
        self.handle.clear_reset_confirmed();
        self.handle.send_expect_silence(command::reset()).await?;
        self.handle.wait_reset_confirmed().await
    }

    /// Loads a stored scenario. The engine confirms with the same signal it
    /// uses for reset, since loading replaces the whole world.
    async fn load_scenario(&self, name: &str) -> Result<(), EngineError> {
        self.handle.clear_reset_confirmed();
        self.handle
            .send_expect_silence(command::load_scenario(name))
            .await?;
        self.handle.wait_reset_confirmed().await
    }

    async fn upload_scenario(&self, name: &str, content_json: &str) -> Result<(), EngineError> {
        self.handle.clear_scenario_stored();
        self.handle
            .send_expect_silence(command::upload_scenario(name, content_json))
            .await?;
        let stored = self.handle.wait_scenario_stored().await?;
        if stored.accepted {
            Ok(())
        } else {
            Err(EngineError::Rejected(stored.detail))
        }
    }

    async fn pause(&self) -> Result<(), EngineError> {
        self.handle.send_expect_silence(command::hold()).await
    }

    async fn resume(&self) -> Result<(), EngineError> {
        self.handle.send_expect_silence(command::resume()).await
    }

    async fn set_step_size(&self, seconds: f64) -> Result<(), EngineError> {
        self.handle
            .send_expect_silence(command::step_size(seconds))
            .await
    }

    async fn set_speed_multiplier(&self, factor: f64) -> Result<(), EngineError> {
        self.handle
            .send_expect_silence(command::speed_multiplier(factor))
            .await
    }

    async fn set_seed(&self, seed: u64) -> Result<(), EngineError> {
        self.handle.send_expect_silence(command::seed(seed)).await
    }

    /// Asks the engine to quit. An engine that dies before confirming has
    /// still shut down, so a closed link or a silent exit both count as
    /// success here.
    async fn shutdown(&self) -> Result<(), EngineError> {
        self.handle.clear_shutdown_confirmed();
        match self.handle.send_expect_silence(command::quit()).await {
            Ok(()) | Err(EngineError::LinkClosed) => {}
            Err(error) => return Err(error),
        }
        match self.handle.wait_shutdown_confirmed().await {
            Ok(()) => Ok(()),
            Err(EngineError::LinkClosed) | Err(EngineError::CommandTimeout(_)) => {
                tracing::debug!("engine exited without shutdown confirmation");
                Ok(())
            }
            Err(error) => Err(error),
        }
    }
}

/// Waypoint commands over the engine link.
#[derive(Debug, Clone)]
pub struct RemoteWaypoints {
    handle: EngineHandle,
}

impl RemoteWaypoints {
    pub fn new(handle: EngineHandle) -> Self {
        Self { handle }
    }
}

impl WaypointCommands for RemoteWaypoints {
    async fn define(&self, waypoint: &Waypoint) -> Result<(), EngineError> {
        self.handle
            .send_expect_silence(command::define_waypoint(waypoint))
            .await
    }
}
