//! Waypoint definition with table write-through.

use std::collections::HashMap;

use crate::control::WaypointCommands;
use crate::model::Waypoint;

use super::routes::SharedRoutes;
use super::ProxyError;

/// Defines waypoints on the engine and mirrors them into the shared
/// route table, where direct-to validation reads them.
#[derive(Debug)]
pub struct WaypointProxy<C> {
    controller: C,
    routes: SharedRoutes,
}

impl<C: WaypointCommands> WaypointProxy<C> {
    pub fn new(controller: C, routes: SharedRoutes) -> Self {
        Self { controller, routes }
    }

    /// Defines a new waypoint. Duplicate names are rejected locally; the
    /// engine is only told about genuinely new ones.
    pub async fn define(&self, waypoint: &Waypoint) -> Result<(), ProxyError> {
        if self.routes.contains_waypoint(&waypoint.name) {
            return Err(ProxyError::DuplicateWaypoint(waypoint.name.clone()));
        }
        self.controller.define(waypoint).await?;
        self.routes.store_waypoint(waypoint.clone());
        Ok(())
    }

    pub fn find(&self, name: &str) -> Option<Waypoint> {
        self.routes.waypoint(name)
    }

    /// Every known waypoint, keyed by uppercase name.
    pub fn all(&self) -> HashMap<String, Waypoint> {
        self.routes.waypoints()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::WaypointCommands as _;
    use crate::engine::LocalEngine;
    use crate::model::Position;
    use crate::proxy::RouteTable;
    use std::sync::Arc;

    fn proxy_over() -> (WaypointProxy<LocalEngine>, LocalEngine, SharedRoutes) {
        let engine = LocalEngine::new();
        let routes: SharedRoutes = Arc::new(RouteTable::new());
        let proxy = WaypointProxy::new(engine.clone(), Arc::clone(&routes));
        (proxy, engine, routes)
    }

    #[tokio::test]
    async fn test_define_reaches_engine_and_table() {
        let (proxy, _engine, routes) = proxy_over();

        proxy
            .define(&Waypoint::new("SUGOL", Position::new(52.5, 4.0)))
            .await
            .unwrap();

        assert!(routes.contains_waypoint("sugol"));
        assert!(proxy.find("SUGOL").is_some());
        assert_eq!(proxy.all().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_rejected_locally() {
        let (proxy, _engine, _routes) = proxy_over();
        proxy
            .define(&Waypoint::new("SUGOL", Position::new(52.5, 4.0)))
            .await
            .unwrap();

        let result = proxy
            .define(&Waypoint::new("sugol", Position::new(0.0, 0.0)))
            .await;

        assert!(matches!(result, Err(ProxyError::DuplicateWaypoint(_))));
    }

    #[tokio::test]
    async fn test_engine_rejection_leaves_table_unchanged() {
        let (proxy, engine, routes) = proxy_over();
        // The engine already knows the name but the table does not, so
        // the local check passes and the rejection comes from the engine.
        engine
            .define(&Waypoint::new("RIVER", Position::new(52.0, 4.5)))
            .await
            .unwrap();

        let result = proxy
            .define(&Waypoint::new("RIVER", Position::new(52.0, 4.5)))
            .await;

        assert!(matches!(result, Err(ProxyError::Engine(_))));
        assert!(!routes.contains_waypoint("RIVER"));
    }
}
