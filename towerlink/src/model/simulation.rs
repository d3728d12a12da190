//! Simulation run state and reconciled simulation properties.

use std::fmt;

use chrono::NaiveTime;

/// Engine run state, decoded from the broadcast's numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Engine started, no scenario initialized yet.
    Init,
    /// Scenario loaded, clock paused.
    Hold,
    /// Clock advancing.
    Running,
    /// Scenario finished or engine shut down.
    Ended,
}

impl RunState {
    /// Decode the wire code. Unknown codes return `None`; the caller drops
    /// the broadcast rather than guessing.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(RunState::Init),
            1 => Some(RunState::Hold),
            2 => Some(RunState::Running),
            3 => Some(RunState::Ended),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            RunState::Init => 0,
            RunState::Hold => 1,
            RunState::Running => 2,
            RunState::Ended => 3,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Init => "init",
            RunState::Hold => "hold",
            RunState::Running => "running",
            RunState::Ended => "ended",
        };
        f.write_str(name)
    }
}

/// Reconciled simulation snapshot.
///
/// Engine-reported: `state`, `elapsed_sec`, `utc`, `step_size_sec`,
/// `speed_multiplier`, `aircraft_count`. Proxy-tracked and layered on top:
/// `scenario_name` (the broadcast's scenario field is only a fallback),
/// `sector_name`, and `seed` (the engine never reports the seed back).
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationProperties {
    pub state: RunState,
    pub elapsed_sec: f64,
    /// Scenario UTC as broadcast, `HH:MM:SS`.
    pub utc: String,
    pub step_size_sec: f64,
    pub speed_multiplier: f64,
    pub aircraft_count: u32,
    pub scenario_name: Option<String>,
    pub sector_name: Option<String>,
    pub seed: Option<u64>,
}

impl SimulationProperties {
    /// Parse the broadcast UTC string, if well-formed.
    pub fn utc_time(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(&self.utc, "%H:%M:%S").ok()
    }
}
