//! Deterministic in-process engine.
//!
//! The second member of the closed backend set. It keeps the same observable
//! surface as the remote engine (a raw aircraft table, a simulation tuple,
//! a scenario store) but runs synchronously under one lock: `step()`
//! dead-reckons every aircraft along its heading and returns. Used for
//! offline operation and as the backend in proxy and coordinator tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::catalog::{self, ScenarioDefinition};
use crate::control::{AircraftCommands, SimulationCommands, WaypointCommands};
use crate::model::{AircraftSpawn, Callsign, RouteLeg, RunState, Waypoint};
use crate::protocol::{units, RawAircraft};

use super::client::RawSimulation;
use super::EngineError;

#[derive(Debug, Default)]
struct LocalState {
    aircraft: HashMap<Callsign, RawAircraft>,
    simulation: RawSimulation,
    /// Defined waypoints, keyed by uppercase name.
    waypoints: HashMap<String, Waypoint>,
    route_legs: HashMap<Callsign, Vec<RouteLeg>>,
    /// Uploaded scenario documents. Survive a reset, like the remote
    /// engine's scenario store.
    scenarios: HashMap<String, ScenarioDefinition>,
    seed: Option<u64>,
}

/// In-process engine behind the capability traits.
#[derive(Debug, Clone, Default)]
pub struct LocalEngine {
    state: Arc<Mutex<LocalState>>,
}

impl LocalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn spawn_into_raw(spawn: &AircraftSpawn) -> RawAircraft {
        RawAircraft {
            callsign: spawn.callsign.to_string(),
            position: spawn.position,
            altitude_ft: spawn.altitude_ft,
            ground_speed_kt: spawn.ground_speed_kt,
            heading_deg: units::normalize_heading(spawn.heading_deg),
            vertical_speed_fpm: 0.0,
            aircraft_type: spawn.aircraft_type.clone(),
        }
    }

    fn advance(state: &mut LocalState) {
        let dt = state.simulation.step_size_sec;
        state.simulation.elapsed_sec += dt;
        state.simulation.utc = format_utc(state.simulation.elapsed_sec);

        for aircraft in state.aircraft.values_mut() {
            let distance_nm = aircraft.ground_speed_kt * dt / 3600.0;
            let heading = aircraft.heading_deg.to_radians();
            let lat = aircraft.position.latitude_deg.to_radians();
            // One nautical mile is one minute of latitude.
            aircraft.position.latitude_deg += distance_nm * heading.cos() / 60.0;
            aircraft.position.longitude_deg += distance_nm * heading.sin() / (60.0 * lat.cos());
            aircraft.altitude_ft += aircraft.vertical_speed_fpm * dt / 60.0;
        }

        state.simulation.aircraft_count = state.aircraft.len() as u32;
    }
}

fn format_utc(elapsed_sec: f64) -> String {
    let seconds = (elapsed_sec.max(0.0) as u32) % 86_400;
    match chrono::NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0) {
        Some(time) => time.format("%H:%M:%S").to_string(),
        None => "00:00:00".to_string(),
    }
}

fn unknown_callsign(callsign: &Callsign) -> EngineError {
    EngineError::Rejected(format!("unknown callsign {callsign}"))
}

impl AircraftCommands for LocalEngine {
    async fn create(&self, spawn: &AircraftSpawn) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        if state.aircraft.contains_key(&spawn.callsign) {
            return Err(EngineError::Rejected(format!(
                "callsign {} already in use",
                spawn.callsign
            )));
        }
        state
            .aircraft
            .insert(spawn.callsign.clone(), Self::spawn_into_raw(spawn));
        state.simulation.aircraft_count = state.aircraft.len() as u32;
        Ok(())
    }

    async fn delete(&self, callsign: &Callsign) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        if state.aircraft.remove(callsign).is_none() {
            return Err(unknown_callsign(callsign));
        }
        state.route_legs.remove(callsign);
        state.simulation.aircraft_count = state.aircraft.len() as u32;
        Ok(())
    }

    async fn set_cleared_flight_level(
        &self,
        callsign: &Callsign,
        _altitude_ft: f64,
    ) -> Result<(), EngineError> {
        // The broadcastable state carries no clearance; altitude changes
        // come from vertical speed.
        let state = self.state.lock().unwrap();
        if !state.aircraft.contains_key(callsign) {
            return Err(unknown_callsign(callsign));
        }
        Ok(())
    }

    async fn set_heading(&self, callsign: &Callsign, heading_deg: f64) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        let aircraft = state
            .aircraft
            .get_mut(callsign)
            .ok_or_else(|| unknown_callsign(callsign))?;
        aircraft.heading_deg = units::normalize_heading(heading_deg);
        Ok(())
    }

    async fn set_ground_speed(&self, callsign: &Callsign, speed_kt: f64) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        let aircraft = state
            .aircraft
            .get_mut(callsign)
            .ok_or_else(|| unknown_callsign(callsign))?;
        aircraft.ground_speed_kt = speed_kt;
        Ok(())
    }

    async fn set_vertical_speed(
        &self,
        callsign: &Callsign,
        rate_fpm: f64,
    ) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        let aircraft = state
            .aircraft
            .get_mut(callsign)
            .ok_or_else(|| unknown_callsign(callsign))?;
        aircraft.vertical_speed_fpm = rate_fpm;
        Ok(())
    }

    async fn direct_to(&self, callsign: &Callsign, waypoint: &str) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        let target = state
            .waypoints
            .get(&waypoint.to_ascii_uppercase())
            .map(|wp| wp.position)
            .ok_or_else(|| EngineError::Rejected(format!("unknown waypoint {waypoint}")))?;
        let aircraft = state
            .aircraft
            .get_mut(callsign)
            .ok_or_else(|| unknown_callsign(callsign))?;
        aircraft.heading_deg = aircraft.position.bearing_deg_to(&target);
        Ok(())
    }

    async fn add_route_leg(&self, callsign: &Callsign, leg: &RouteLeg) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        if !state.aircraft.contains_key(callsign) {
            return Err(unknown_callsign(callsign));
        }
        state
            .route_legs
            .entry(callsign.clone())
            .or_default()
            .push(leg.clone());
        Ok(())
    }

    async fn list_route(&self, callsign: &Callsign) -> Result<Vec<String>, EngineError> {
        let state = self.state.lock().unwrap();
        if !state.aircraft.contains_key(callsign) {
            return Err(unknown_callsign(callsign));
        }
        let legs = state.route_legs.get(callsign).map(Vec::as_slice).unwrap_or_default();
        Ok(legs
            .iter()
            .enumerate()
            .map(|(index, leg)| format!("LEG {}: {}", index + 1, leg.waypoint.to_ascii_uppercase()))
            .collect())
    }

    async fn raw_table(&self) -> Result<HashMap<Callsign, RawAircraft>, EngineError> {
        Ok(self.state.lock().unwrap().aircraft.clone())
    }
}

impl SimulationCommands for LocalEngine {
    async fn raw_properties(&self) -> Result<RawSimulation, EngineError> {
        Ok(self.state.lock().unwrap().simulation.clone())
    }

    async fn step(&self) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        Self::advance(&mut state);
        Ok(())
    }

    async fn reset(&self) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        let scenarios = std::mem::take(&mut state.scenarios);
        *state = LocalState {
            scenarios,
            ..LocalState::default()
        };
        Ok(())
    }

    async fn load_scenario(&self, name: &str) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        let definition = state
            .scenarios
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::Rejected(format!("unknown scenario {name}")))?;

        state.aircraft.clear();
        state.route_legs.clear();
        for spawn in &definition.spawns {
            state
                .aircraft
                .insert(spawn.callsign.clone(), Self::spawn_into_raw(spawn));
        }
        state.simulation = RawSimulation {
            state: RunState::Running,
            scenario_name: name.to_string(),
            aircraft_count: state.aircraft.len() as u32,
            step_size_sec: state.simulation.step_size_sec,
            speed_multiplier: state.simulation.speed_multiplier,
            ..RawSimulation::default()
        };
        state.seed = definition.seed;
        Ok(())
    }

    async fn upload_scenario(&self, name: &str, content_json: &str) -> Result<(), EngineError> {
        let definition = catalog::scenario_from_json(content_json)
            .map_err(|error| EngineError::Rejected(format!("scenario not stored: {error}")))?;
        self.state
            .lock()
            .unwrap()
            .scenarios
            .insert(name.to_string(), definition);
        Ok(())
    }

    async fn pause(&self) -> Result<(), EngineError> {
        self.state.lock().unwrap().simulation.state = RunState::Hold;
        Ok(())
    }

    async fn resume(&self) -> Result<(), EngineError> {
        self.state.lock().unwrap().simulation.state = RunState::Running;
        Ok(())
    }

    async fn set_step_size(&self, seconds: f64) -> Result<(), EngineError> {
        if seconds <= 0.0 {
            return Err(EngineError::Rejected("step size must be positive".to_string()));
        }
        self.state.lock().unwrap().simulation.step_size_sec = seconds;
        Ok(())
    }

    async fn set_speed_multiplier(&self, factor: f64) -> Result<(), EngineError> {
        if factor <= 0.0 {
            return Err(EngineError::Rejected(
                "speed multiplier must be positive".to_string(),
            ));
        }
        self.state.lock().unwrap().simulation.speed_multiplier = factor;
        Ok(())
    }

    async fn set_seed(&self, seed: u64) -> Result<(), EngineError> {
        self.state.lock().unwrap().seed = Some(seed);
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), EngineError> {
        self.state.lock().unwrap().simulation.state = RunState::Ended;
        Ok(())
    }
}

impl WaypointCommands for LocalEngine {
    async fn define(&self, waypoint: &Waypoint) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        let key = waypoint.name.to_ascii_uppercase();
        if state.waypoints.contains_key(&key) {
            return Err(EngineError::Rejected(format!(
                "waypoint {} already defined",
                waypoint.name
            )));
        }
        state.waypoints.insert(key, waypoint.clone());
        Ok(())
    }
}
