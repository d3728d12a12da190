//! Top-level facade: one connected gateway over a chosen backend.
//!
//! `Gateway::connect` builds the whole stack (engine link or local
//! engine, the three proxies over a shared route table and catalog, and
//! the mode coordinator) and hands back a single object the embedding
//! layer talks to. Operations that span proxies (scenario load, reset,
//! shutdown) live here so callers cannot get the sequencing wrong.

use std::sync::Arc;

use thiserror::Error;

use crate::catalog::{MemoryStore, ScenarioDefinition, SectorDefinition};
use crate::control::{
    AircraftBackend, BackendKind, RemoteAircraft, RemoteSimulation, RemoteWaypoints,
    SimulationBackend, SimulationCommands, WaypointBackend, WaypointCommands,
};
use crate::coordinator::ModeCoordinator;
use crate::engine::{
    EngineClient, EngineConfig, EngineError, EngineHandle, EngineLink, LocalEngine,
};
use crate::proxy::{
    AircraftProxy, ProxyConfig, ProxyError, RouteTable, SharedRoutes, SimulationProxy,
    WaypointProxy,
};

/// Errors from gateway construction and cross-proxy operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Proxy(#[from] ProxyError),
}

/// Everything needed to build a gateway.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub backend: BackendKind,
    pub engine: EngineConfig,
    pub proxy: ProxyConfig,
}

impl GatewayConfig {
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = proxy;
        self
    }
}

/// A connected gateway.
#[derive(Debug)]
pub struct Gateway {
    aircraft: Arc<AircraftProxy<AircraftBackend>>,
    simulation: Arc<SimulationProxy<SimulationBackend, MemoryStore>>,
    waypoints: Arc<WaypointProxy<WaypointBackend>>,
    coordinator: ModeCoordinator<AircraftBackend, SimulationBackend, MemoryStore>,
    routes: SharedRoutes,
    /// Direct backend access for operations the proxies deliberately do
    /// not expose: engine shutdown and sector waypoint definition.
    simulation_control: SimulationBackend,
    waypoint_control: WaypointBackend,
    handle: Option<EngineHandle>,
    link: Option<EngineLink>,
}

impl Gateway {
    /// Builds the stack for the configured backend. For a remote backend
    /// this blocks until the engine link is live (first broadcast seen).
    pub async fn connect(config: GatewayConfig) -> Result<Gateway, GatewayError> {
        let backend = config.backend;
        let routes: SharedRoutes = Arc::new(RouteTable::new());
        let store = Arc::new(MemoryStore::new());

        let (aircraft_backend, simulation_backend, waypoint_backend, handle, link) = match backend
        {
            BackendKind::Remote => {
                let link = EngineClient::connect(config.engine).await?;
                let handle = link.handle();
                (
                    AircraftBackend::Remote(RemoteAircraft::new(handle.clone())),
                    SimulationBackend::Remote(RemoteSimulation::new(handle.clone())),
                    WaypointBackend::Remote(RemoteWaypoints::new(handle.clone())),
                    Some(handle),
                    Some(link),
                )
            }
            BackendKind::Local => {
                let engine = LocalEngine::new();
                (
                    AircraftBackend::Local(engine.clone()),
                    SimulationBackend::Local(engine.clone()),
                    WaypointBackend::Local(engine),
                    None,
                    None,
                )
            }
        };

        let simulation_control = simulation_backend.clone();
        let waypoint_control = waypoint_backend.clone();

        let aircraft = Arc::new(AircraftProxy::new(
            aircraft_backend,
            config.proxy,
            Arc::clone(&routes),
        ));
        let simulation = Arc::new(SimulationProxy::new(
            simulation_backend,
            store,
            Arc::clone(&routes),
        ));
        let waypoints = Arc::new(WaypointProxy::new(waypoint_backend, Arc::clone(&routes)));
        let coordinator = ModeCoordinator::new(Arc::clone(&simulation), Arc::clone(&aircraft));

        tracing::info!(backend = %backend, "gateway connected");
        Ok(Gateway {
            aircraft,
            simulation,
            waypoints,
            coordinator,
            routes,
            simulation_control,
            waypoint_control,
            handle,
            link,
        })
    }

    pub fn aircraft(&self) -> &AircraftProxy<AircraftBackend> {
        &self.aircraft
    }

    pub fn simulation(&self) -> &SimulationProxy<SimulationBackend, MemoryStore> {
        &self.simulation
    }

    pub fn waypoints(&self) -> &WaypointProxy<WaypointBackend> {
        &self.waypoints
    }

    pub fn coordinator(
        &self,
    ) -> &ModeCoordinator<AircraftBackend, SimulationBackend, MemoryStore> {
        &self.coordinator
    }

    /// Engine nodes discovered at connect time. Empty for a local backend.
    pub fn nodes(&self) -> Vec<String> {
        self.handle
            .as_ref()
            .map(EngineHandle::nodes)
            .unwrap_or_default()
    }

    /// Whether the engine link is still alive. A local backend is always
    /// connected.
    pub fn is_connected(&self) -> bool {
        self.handle.as_ref().map_or(true, EngineHandle::is_live)
    }

    /// Loads a scenario and primes the aircraft proxy from its spawn
    /// list. Sector waypoints are also pushed to the engine so direct-to
    /// targets resolve on both sides.
    pub async fn load_scenario(
        &self,
        name: &str,
        content: Option<ScenarioDefinition>,
    ) -> Result<ScenarioDefinition, GatewayError> {
        let definition = self.simulation.load_scenario(name, content).await?;
        if definition.sector.is_some() {
            self.define_sector_waypoints().await?;
        }
        self.aircraft.prime_from_scenario(&definition).await?;
        Ok(definition)
    }

    /// Installs a sector standalone and defines its waypoints on the
    /// engine.
    pub async fn load_sector(
        &self,
        name: &str,
        content: Option<SectorDefinition>,
    ) -> Result<(), GatewayError> {
        self.simulation.load_sector(name, content).await?;
        self.define_sector_waypoints().await?;
        Ok(())
    }

    /// Pushes every table waypoint to the engine. An engine that already
    /// knows a name (from its own scenario data) rejects the duplicate;
    /// that rejection is expected and skipped.
    async fn define_sector_waypoints(&self) -> Result<(), GatewayError> {
        for waypoint in self.routes.waypoints().into_values() {
            match self.waypoint_control.define(&waypoint).await {
                Ok(()) => {}
                Err(EngineError::Rejected(detail)) => {
                    tracing::debug!(waypoint = %waypoint.name, %detail, "waypoint already known to engine");
                }
                Err(error) => return Err(error.into()),
            }
        }
        Ok(())
    }

    /// Resets the engine and drops all reconciled state.
    pub async fn reset(&self) -> Result<(), GatewayError> {
        self.simulation.reset().await?;
        self.aircraft.clear().await;
        Ok(())
    }

    /// Shuts the engine down and tears the link down. Errors from an
    /// engine that is already gone are expected and logged, not returned.
    pub async fn shutdown(mut self) -> Result<(), GatewayError> {
        if let Err(error) = self.simulation_control.shutdown().await {
            tracing::warn!(%error, "engine shutdown command failed");
        }
        if let Some(link) = self.link.take() {
            if let Err(error) = link.shutdown().await {
                tracing::debug!(%error, "engine link closed during shutdown");
            }
        }
        tracing::info!("gateway shut down");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
