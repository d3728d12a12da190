//! Broadcast payload types and the binary codec.
//!
//! The stream channel carries two periodic payloads. Aircraft state arrives
//! as parallel arrays: one array per property, index `i` of every array
//! describing the same aircraft. Simulation state arrives as a
//! fixed-position tuple. Both are encoded with bincode's standard
//! configuration through serde.

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::model::{Position, RunState};

use super::ProtocolError;

/// Encode a payload value with the standard bincode configuration.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(bincode::serde::encode_to_vec(
        value,
        bincode::config::standard(),
    )?)
}

/// Decode a payload value. Trailing bytes are ignored.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    let (value, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
    Ok(value)
}

/// Aggregate aircraft state broadcast: parallel arrays keyed by property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AircraftBroadcast {
    pub callsigns: Vec<String>,
    pub latitudes_deg: Vec<f64>,
    pub longitudes_deg: Vec<f64>,
    pub altitudes_ft: Vec<f64>,
    pub ground_speeds_kt: Vec<f64>,
    pub headings_deg: Vec<f64>,
    pub vertical_speeds_fpm: Vec<f64>,
    pub aircraft_types: Vec<String>,
}

/// One aircraft's engine-reported state, assembled from the parallel arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAircraft {
    pub callsign: String,
    pub position: Position,
    pub altitude_ft: f64,
    pub ground_speed_kt: f64,
    pub heading_deg: f64,
    pub vertical_speed_fpm: f64,
    pub aircraft_type: String,
}

impl AircraftBroadcast {
    /// Validate the parallel arrays and assemble per-aircraft rows.
    pub fn rows(&self) -> Result<Vec<RawAircraft>, ProtocolError> {
        let expected = self.callsigns.len();
        let check = |field: &'static str, actual: usize| {
            if actual == expected {
                Ok(())
            } else {
                Err(ProtocolError::LengthMismatch {
                    field,
                    expected,
                    actual,
                })
            }
        };
        check("latitudes_deg", self.latitudes_deg.len())?;
        check("longitudes_deg", self.longitudes_deg.len())?;
        check("altitudes_ft", self.altitudes_ft.len())?;
        check("ground_speeds_kt", self.ground_speeds_kt.len())?;
        check("headings_deg", self.headings_deg.len())?;
        check("vertical_speeds_fpm", self.vertical_speeds_fpm.len())?;
        check("aircraft_types", self.aircraft_types.len())?;

        Ok((0..expected)
            .map(|i| RawAircraft {
                callsign: self.callsigns[i].clone(),
                position: Position::new(self.latitudes_deg[i], self.longitudes_deg[i]),
                altitude_ft: self.altitudes_ft[i],
                ground_speed_kt: self.ground_speeds_kt[i],
                heading_deg: self.headings_deg[i],
                vertical_speed_fpm: self.vertical_speeds_fpm[i],
                aircraft_type: self.aircraft_types[i].clone(),
            })
            .collect())
    }

    /// Assemble a broadcast from per-aircraft rows. Used by harnesses that
    /// play the engine side of the protocol.
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a RawAircraft>) -> Self {
        let mut broadcast = Self::default();
        for row in rows {
            broadcast.callsigns.push(row.callsign.clone());
            broadcast.latitudes_deg.push(row.position.latitude_deg);
            broadcast.longitudes_deg.push(row.position.longitude_deg);
            broadcast.altitudes_ft.push(row.altitude_ft);
            broadcast.ground_speeds_kt.push(row.ground_speed_kt);
            broadcast.headings_deg.push(row.heading_deg);
            broadcast.vertical_speeds_fpm.push(row.vertical_speed_fpm);
            broadcast.aircraft_types.push(row.aircraft_type.clone());
        }
        broadcast
    }
}

/// Aggregate simulation state broadcast, fixed field positions:
/// speed multiplier, step size (sec), elapsed scenario time (sec), UTC
/// string, aircraft count, run-state code, scenario name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationBroadcast(pub f64, pub f64, pub f64, pub String, pub u32, pub u8, pub String);

impl SimulationBroadcast {
    pub fn new(
        speed_multiplier: f64,
        step_size_sec: f64,
        elapsed_sec: f64,
        utc: String,
        aircraft_count: u32,
        state: RunState,
        scenario_name: String,
    ) -> Self {
        Self(
            speed_multiplier,
            step_size_sec,
            elapsed_sec,
            utc,
            aircraft_count,
            state.code(),
            scenario_name,
        )
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.0
    }

    pub fn step_size_sec(&self) -> f64 {
        self.1
    }

    pub fn elapsed_sec(&self) -> f64 {
        self.2
    }

    pub fn utc(&self) -> &str {
        &self.3
    }

    pub fn aircraft_count(&self) -> u32 {
        self.4
    }

    pub fn run_state(&self) -> Result<RunState, ProtocolError> {
        RunState::from_code(self.5).ok_or(ProtocolError::BadRunState(self.5))
    }

    /// Scenario name as broadcast; empty means the engine has none loaded.
    pub fn scenario_name(&self) -> &str {
        &self.6
    }
}

/// Result of a scenario upload, carried by the scenario-stored event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioStored {
    pub accepted: bool,
    pub detail: String,
}
