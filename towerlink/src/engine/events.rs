//! Typed events decoded from engine frames.
//!
//! Both channels carry topic-tagged frames. Decoding turns them into two
//! enums, [`EngineEvent`] for the event channel and [`StreamEvent`] for the
//! stream channel, so the client task dispatches each frame through a
//! single `match`. Unknown topics are not errors: engines grow new topics,
//! and an old client must keep working past them.

use crate::protocol::payload::{self, AircraftBroadcast, ScenarioStored, SimulationBroadcast};
use crate::protocol::{Frame, ProtocolError};

/// Topic tag for outgoing command frames.
pub const TOPIC_COMMAND: &str = "CMD";
/// Compute-node discovery list.
pub const TOPIC_NODES: &str = "NODES";
/// Free-text echo in response to a command.
pub const TOPIC_ECHO: &str = "ECHO";
/// Reset (or scenario initialization) confirmation.
pub const TOPIC_RESET_CONFIRMED: &str = "RESETOK";
/// Scenario upload result.
pub const TOPIC_SCENARIO_STORED: &str = "SCENOK";
/// Engine shutdown confirmation.
pub const TOPIC_SHUTDOWN_CONFIRMED: &str = "QUITOK";
/// Periodic aircraft state broadcast.
pub const TOPIC_AIRCRAFT_DATA: &str = "ACDATA";
/// Periodic simulation state broadcast.
pub const TOPIC_SIMULATION_DATA: &str = "SIMDATA";

/// An event-channel frame, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Available compute nodes reported by the engine.
    Nodes(Vec<String>),
    /// Echo lines emitted in response to a command.
    Echo(Vec<String>),
    ResetConfirmed,
    ScenarioStored(ScenarioStored),
    ShutdownConfirmed,
    /// Topic this client does not know. Logged and ignored.
    Unrecognized(String),
}

impl EngineEvent {
    pub fn decode(frame: &Frame) -> Result<Self, ProtocolError> {
        let topic = String::from_utf8_lossy(frame.topic());
        let body = frame.payload().unwrap_or_default();
        match topic.as_ref() {
            TOPIC_NODES => Ok(Self::Nodes(payload::decode(body)?)),
            TOPIC_ECHO => {
                let text = String::from_utf8_lossy(body);
                Ok(Self::Echo(text.lines().map(str::to_string).collect()))
            }
            TOPIC_RESET_CONFIRMED => Ok(Self::ResetConfirmed),
            TOPIC_SCENARIO_STORED => Ok(Self::ScenarioStored(payload::decode(body)?)),
            TOPIC_SHUTDOWN_CONFIRMED => Ok(Self::ShutdownConfirmed),
            other => Ok(Self::Unrecognized(other.to_string())),
        }
    }
}

/// A stream-channel frame, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Aircraft(AircraftBroadcast),
    Simulation(SimulationBroadcast),
    Unrecognized(String),
}

impl StreamEvent {
    pub fn decode(frame: &Frame) -> Result<Self, ProtocolError> {
        let topic = String::from_utf8_lossy(frame.topic());
        let body = frame.payload().unwrap_or_default();
        match topic.as_ref() {
            TOPIC_AIRCRAFT_DATA => Ok(Self::Aircraft(payload::decode(body)?)),
            TOPIC_SIMULATION_DATA => Ok(Self::Simulation(payload::decode(body)?)),
            other => Ok(Self::Unrecognized(other.to_string())),
        }
    }
}

/// Whether an echo line is engine chatter rather than a complaint.
///
/// The engine acknowledges some commands with informational lines even on
/// success. A silence-expected command only fails on lines outside this set.
pub fn is_benign_echo(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed == "OK" || trimmed.starts_with("OK ") || trimmed.starts_with("INFO:")
}
