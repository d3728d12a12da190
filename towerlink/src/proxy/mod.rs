//! Reconciled state caching over a backend controller.
//!
//! The proxies sit between callers and a [`crate::control`] backend. Each
//! keeps a snapshot cache guarded by a validity flag: reads are served from
//! the cache while it is valid, and at most one refresh runs per
//! invalidation window (a `tokio::sync::Mutex` gate serializes fetchers;
//! late arrivals find the cache already valid and return without touching
//! the backend). Refreshes merge rather than replace, so fields the engine
//! never reports (assigned route, cleared and requested flight levels,
//! loaded sector, seed) survive every update.
//!
//! Validation that can be answered locally is answered locally: duplicate
//! creation, unknown callsigns, direct-to targets that are off the assigned
//! route. Those paths return a [`ProxyError`] without a round trip.

use std::time::Duration;

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::engine::EngineError;
use crate::model::Callsign;

pub mod aircraft;
pub mod routes;
pub mod simulation;
pub mod waypoints;

pub use aircraft::AircraftProxy;
pub use routes::{RouteTable, SharedRoutes};
pub use simulation::SimulationProxy;
pub use waypoints::WaypointProxy;

/// Errors surfaced by the proxy layer.
///
/// Locally-generated validation failures and pass-through controller
/// failures share one enum so callers match on a single type.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("aircraft {0} already exists")]
    AlreadyExists(Callsign),

    #[error("no aircraft {0}")]
    UnknownCallsign(Callsign),

    #[error("aircraft {0} has no route assigned")]
    NoRouteAssigned(Callsign),

    #[error("waypoint {waypoint} is not on route {route} (route contains: {})", .members.join(", "))]
    NotOnRoute {
        waypoint: String,
        route: String,
        members: Vec<String>,
    },

    #[error("no route named {0}")]
    UnknownRoute(String),

    #[error("waypoint {0} already defined")]
    DuplicateWaypoint(String),

    #[error("aircraft {callsign} not visible after {waited:?}")]
    CreationNotVisible { callsign: Callsign, waited: Duration },

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Tunables for proxy-side polling.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// How many table fetches to try before declaring a created aircraft
    /// not visible.
    pub create_poll_attempts: u32,
    /// Pause between creation-visibility fetches.
    pub create_poll_interval: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            create_poll_attempts: 10,
            create_poll_interval: Duration::from_millis(100),
        }
    }
}

impl ProxyConfig {
    pub fn with_create_poll_attempts(mut self, attempts: u32) -> Self {
        self.create_poll_attempts = attempts;
        self
    }

    pub fn with_create_poll_interval(mut self, interval: Duration) -> Self {
        self.create_poll_interval = interval;
        self
    }
}
