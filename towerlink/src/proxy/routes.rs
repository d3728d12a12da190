//! Sector-derived route and waypoint lookup.
//!
//! The engine never reports routes, so this table is the authority for
//! route membership checks. It is rebuilt whenever a sector is installed
//! and emptied on reset. Names are matched case-insensitively; the table
//! stores uppercase keys.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::catalog::SectorDefinition;
use crate::model::{Route, Waypoint};

/// Route table handle shared between the proxies.
pub type SharedRoutes = Arc<RouteTable>;

#[derive(Debug, Default)]
struct Tables {
    routes: HashMap<String, Route>,
    waypoints: HashMap<String, Waypoint>,
}

/// Named routes and waypoints known to the gateway.
#[derive(Debug, Default)]
pub struct RouteTable {
    inner: RwLock<Tables>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the table contents with a sector's definitions.
    pub fn install_sector(&self, sector: &SectorDefinition) {
        let mut tables = Tables::default();
        for waypoint in &sector.waypoints {
            tables
                .waypoints
                .insert(waypoint.name.to_ascii_uppercase(), waypoint.clone());
        }
        for route in &sector.routes {
            tables
                .routes
                .insert(route.name.to_ascii_uppercase(), route.clone());
        }
        *self.inner.write().unwrap() = tables;
    }

    /// Inserts or replaces a single waypoint.
    pub fn store_waypoint(&self, waypoint: Waypoint) {
        self.inner
            .write()
            .unwrap()
            .waypoints
            .insert(waypoint.name.to_ascii_uppercase(), waypoint);
    }

    pub fn contains_waypoint(&self, name: &str) -> bool {
        self.inner
            .read()
            .unwrap()
            .waypoints
            .contains_key(&name.to_ascii_uppercase())
    }

    pub fn waypoint(&self, name: &str) -> Option<Waypoint> {
        self.inner
            .read()
            .unwrap()
            .waypoints
            .get(&name.to_ascii_uppercase())
            .cloned()
    }

    /// All known waypoints, keyed by uppercase name.
    pub fn waypoints(&self) -> HashMap<String, Waypoint> {
        self.inner.read().unwrap().waypoints.clone()
    }

    pub fn route(&self, name: &str) -> Option<Route> {
        self.inner
            .read()
            .unwrap()
            .routes
            .get(&name.to_ascii_uppercase())
            .cloned()
    }

    pub fn route_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .inner
            .read()
            .unwrap()
            .routes
            .values()
            .map(|route| route.name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap() = Tables::default();
    }
}
