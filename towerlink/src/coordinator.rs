//! Operating-mode gate over the simulation proxy.
//!
//! The gateway runs either continuously (engine clock free-running) or
//! stepped (clock frozen, advanced one deterministic step at a time).
//! Stepping while the clock free-runs would give meaningless results, so
//! the coordinator owns the mode and refuses `step()` outside stepped
//! mode. A single async lock serializes mode changes against in-flight
//! steps.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::catalog::DefinitionStore;
use crate::control::{AircraftCommands, SimulationCommands};
use crate::proxy::{AircraftProxy, ProxyError, SimulationProxy};

/// How the engine clock is driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    /// Engine clock free-running.
    Continuous,
    /// Engine clock frozen between explicit steps.
    Stepped,
}

impl OperatingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Stepped => "stepped",
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from mode-gated operations.
#[derive(Debug, Error)]
pub enum ModeError {
    #[error("{operation} requires stepped mode, current mode is {mode}")]
    WrongMode {
        operation: &'static str,
        mode: OperatingMode,
    },

    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

/// Serializes mode changes and steps over the shared proxies.
#[derive(Debug)]
pub struct ModeCoordinator<A, C, S> {
    simulation: Arc<SimulationProxy<C, S>>,
    aircraft: Arc<AircraftProxy<A>>,
    mode: Mutex<OperatingMode>,
}

impl<A, C, S> ModeCoordinator<A, C, S>
where
    A: AircraftCommands,
    C: SimulationCommands,
    S: DefinitionStore,
{
    /// Starts in continuous mode, matching a freshly started engine.
    pub fn new(simulation: Arc<SimulationProxy<C, S>>, aircraft: Arc<AircraftProxy<A>>) -> Self {
        Self {
            simulation,
            aircraft,
            mode: Mutex::new(OperatingMode::Continuous),
        }
    }

    pub async fn mode(&self) -> OperatingMode {
        *self.mode.lock().await
    }

    /// Switches mode, pausing or resuming the engine clock. Switching to
    /// the current mode does nothing.
    pub async fn set_mode(&self, target: OperatingMode) -> Result<(), ModeError> {
        let mut mode = self.mode.lock().await;
        if *mode == target {
            return Ok(());
        }
        match target {
            OperatingMode::Stepped => self.simulation.pause().await?,
            OperatingMode::Continuous => self.simulation.resume().await?,
        }
        tracing::debug!(mode = %target, "operating mode changed");
        *mode = target;
        Ok(())
    }

    /// Advances the simulation one step and invalidates the aircraft
    /// cache (positions have moved). Only legal in stepped mode.
    pub async fn step(&self) -> Result<(), ModeError> {
        let mode = self.mode.lock().await;
        if *mode != OperatingMode::Stepped {
            return Err(ModeError::WrongMode {
                operation: "step",
                mode: *mode,
            });
        }
        self.simulation.step().await?;
        self.aircraft.invalidate();
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
