//! Cached, validated aircraft state over a backend controller.

use std::collections::HashMap;
use std::sync::RwLock;

use tokio::sync::Mutex;

use crate::catalog::ScenarioDefinition;
use crate::control::AircraftCommands;
use crate::model::{AircraftProperties, AircraftSpawn, Callsign};
use crate::protocol::{units, RawAircraft};

use super::routes::SharedRoutes;
use super::{ProxyConfig, ProxyError};

#[derive(Debug, Default)]
struct AircraftCache {
    entries: HashMap<Callsign, AircraftProperties>,
    valid: bool,
}

/// Aircraft state proxy.
///
/// Serves reads from a merged snapshot and answers validation locally
/// where it can. The engine-sourced fields of every entry are refreshed
/// from the controller's raw table; the proxy-tracked fields (route,
/// cleared and requested flight levels) belong to this cache alone and
/// survive refreshes.
#[derive(Debug)]
pub struct AircraftProxy<C> {
    controller: C,
    config: ProxyConfig,
    routes: SharedRoutes,
    cache: RwLock<AircraftCache>,
    /// Single-flight gate: one refresh per invalidation window, and
    /// write-through updates cannot interleave with a merge.
    refresh_gate: Mutex<()>,
}

fn first_seen(raw: &RawAircraft) -> AircraftProperties {
    AircraftProperties {
        position: raw.position,
        altitude_ft: raw.altitude_ft,
        ground_speed_kt: raw.ground_speed_kt,
        heading_deg: raw.heading_deg,
        vertical_speed_fpm: raw.vertical_speed_fpm,
        aircraft_type: raw.aircraft_type.clone(),
        cleared_flight_level: None,
        requested_flight_level: None,
        route_name: None,
    }
}

fn refreshed(known: &AircraftProperties, raw: &RawAircraft) -> AircraftProperties {
    AircraftProperties {
        position: raw.position,
        altitude_ft: raw.altitude_ft,
        ground_speed_kt: raw.ground_speed_kt,
        heading_deg: raw.heading_deg,
        vertical_speed_fpm: raw.vertical_speed_fpm,
        aircraft_type: raw.aircraft_type.clone(),
        cleared_flight_level: known.cleared_flight_level,
        requested_flight_level: known.requested_flight_level,
        route_name: known.route_name.clone(),
    }
}

impl<C: AircraftCommands> AircraftProxy<C> {
    pub fn new(controller: C, config: ProxyConfig, routes: SharedRoutes) -> Self {
        Self {
            controller,
            config,
            routes,
            cache: RwLock::new(AircraftCache::default()),
            refresh_gate: Mutex::new(()),
        }
    }

    /// Snapshot of every known aircraft, refreshing the cache if needed.
    pub async fn all_properties(
        &self,
    ) -> Result<HashMap<Callsign, AircraftProperties>, ProxyError> {
        {
            let cache = self.cache.read().unwrap();
            if cache.valid {
                return Ok(cache.entries.clone());
            }
        }

        let _refresh = self.refresh_gate.lock().await;
        {
            let cache = self.cache.read().unwrap();
            if cache.valid {
                // A concurrent caller refreshed while we waited on the gate.
                return Ok(cache.entries.clone());
            }
        }

        let raw = self.controller.raw_table().await?;

        let merged = {
            let cache = self.cache.read().unwrap();
            let mut merged = HashMap::with_capacity(raw.len());
            for (callsign, row) in raw {
                let entry = match cache.entries.get(&callsign) {
                    Some(known) => refreshed(known, &row),
                    None => first_seen(&row),
                };
                merged.insert(callsign, entry);
            }
            merged
        };

        let mut cache = self.cache.write().unwrap();
        cache.entries = merged.clone();
        cache.valid = true;
        Ok(merged)
    }

    pub async fn properties(&self, callsign: &Callsign) -> Result<AircraftProperties, ProxyError> {
        let mut table = self.all_properties().await?;
        table
            .remove(callsign)
            .ok_or_else(|| ProxyError::UnknownCallsign(callsign.clone()))
    }

    pub async fn exists(&self, callsign: &Callsign) -> Result<bool, ProxyError> {
        Ok(self.all_properties().await?.contains_key(callsign))
    }

    async fn ensure_known(&self, callsign: &Callsign) -> Result<(), ProxyError> {
        if self.all_properties().await?.contains_key(callsign) {
            Ok(())
        } else {
            Err(ProxyError::UnknownCallsign(callsign.clone()))
        }
    }

    /// Creates an aircraft and waits for it to become visible.
    ///
    /// The engine acknowledges creation before the aircraft reaches the
    /// broadcast table, so success is judged by polling the table, not by
    /// the acknowledgement. Proxy-tracked fields from the spawn request
    /// are seeded once the aircraft shows up.
    pub async fn create(&self, spawn: &AircraftSpawn) -> Result<(), ProxyError> {
        if self.all_properties().await?.contains_key(&spawn.callsign) {
            return Err(ProxyError::AlreadyExists(spawn.callsign.clone()));
        }

        self.controller.create(spawn).await?;

        for attempt in 0..self.config.create_poll_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.config.create_poll_interval).await;
            }
            self.invalidate();
            if self.all_properties().await?.contains_key(&spawn.callsign) {
                self.seed_spawn_fields(spawn).await;
                return Ok(());
            }
        }

        Err(ProxyError::CreationNotVisible {
            callsign: spawn.callsign.clone(),
            waited: self.config.create_poll_interval * self.config.create_poll_attempts,
        })
    }

    async fn seed_spawn_fields(&self, spawn: &AircraftSpawn) {
        let _refresh = self.refresh_gate.lock().await;
        let mut cache = self.cache.write().unwrap();
        if let Some(entry) = cache.entries.get_mut(&spawn.callsign) {
            entry.cleared_flight_level = spawn.cleared_flight_level;
            entry.requested_flight_level = spawn.requested_flight_level;
            entry.route_name = spawn.route_name.clone();
        }
    }

    pub async fn delete(&self, callsign: &Callsign) -> Result<(), ProxyError> {
        let _refresh = self.refresh_gate.lock().await;
        self.controller.delete(callsign).await?;
        let mut cache = self.cache.write().unwrap();
        cache.entries.remove(callsign);
        cache.valid = false;
        Ok(())
    }

    /// Sets the cleared flight level and records it locally.
    ///
    /// The engine treats this as a plain altitude command and forgets it;
    /// the cached entry is written through so the cache stays valid.
    pub async fn set_cleared_flight_level(
        &self,
        callsign: &Callsign,
        altitude_ft: f64,
    ) -> Result<(), ProxyError> {
        self.ensure_known(callsign).await?;
        let _refresh = self.refresh_gate.lock().await;
        self.controller
            .set_cleared_flight_level(callsign, altitude_ft)
            .await?;
        let mut cache = self.cache.write().unwrap();
        if let Some(entry) = cache.entries.get_mut(callsign) {
            entry.cleared_flight_level = Some(units::altitude_to_flight_level(altitude_ft));
        }
        Ok(())
    }

    /// Records the requested flight level. Proxy-only: the engine has no
    /// notion of a request, so no command is sent.
    pub async fn set_requested_flight_level(
        &self,
        callsign: &Callsign,
        altitude_ft: f64,
    ) -> Result<(), ProxyError> {
        self.ensure_known(callsign).await?;
        let _refresh = self.refresh_gate.lock().await;
        let mut cache = self.cache.write().unwrap();
        match cache.entries.get_mut(callsign) {
            Some(entry) => {
                entry.requested_flight_level = Some(units::altitude_to_flight_level(altitude_ft));
                Ok(())
            }
            None => Err(ProxyError::UnknownCallsign(callsign.clone())),
        }
    }

    pub async fn set_heading(&self, callsign: &Callsign, heading_deg: f64) -> Result<(), ProxyError> {
        self.controller.set_heading(callsign, heading_deg).await?;
        self.invalidate();
        Ok(())
    }

    pub async fn set_ground_speed(
        &self,
        callsign: &Callsign,
        speed_kt: f64,
    ) -> Result<(), ProxyError> {
        self.controller.set_ground_speed(callsign, speed_kt).await?;
        self.invalidate();
        Ok(())
    }

    pub async fn set_vertical_speed(
        &self,
        callsign: &Callsign,
        rate_fpm: f64,
    ) -> Result<(), ProxyError> {
        self.controller.set_vertical_speed(callsign, rate_fpm).await?;
        self.invalidate();
        Ok(())
    }

    /// Sends the aircraft direct to a waypoint on its assigned route.
    ///
    /// Membership is validated against the route table before anything is
    /// sent; a miss carries the route's waypoints back to the caller.
    pub async fn direct_to(&self, callsign: &Callsign, waypoint: &str) -> Result<(), ProxyError> {
        let entry = self.properties(callsign).await?;
        let route_name = entry
            .route_name
            .ok_or_else(|| ProxyError::NoRouteAssigned(callsign.clone()))?;
        let route = self
            .routes
            .route(&route_name)
            .ok_or_else(|| ProxyError::UnknownRoute(route_name.clone()))?;
        if !route.contains(waypoint) {
            return Err(ProxyError::NotOnRoute {
                waypoint: waypoint.to_ascii_uppercase(),
                route: route.name.clone(),
                members: route.waypoint_names(),
            });
        }

        self.controller.direct_to(callsign, waypoint).await?;
        self.invalidate();
        Ok(())
    }

    /// Assigns a known route: one add-leg command per leg, then the route
    /// name is written through to the cached entry.
    pub async fn assign_route(&self, callsign: &Callsign, route_name: &str) -> Result<(), ProxyError> {
        let route = self
            .routes
            .route(route_name)
            .ok_or_else(|| ProxyError::UnknownRoute(route_name.to_string()))?;
        self.ensure_known(callsign).await?;

        for leg in route.legs() {
            self.controller.add_route_leg(callsign, leg).await?;
        }

        let _refresh = self.refresh_gate.lock().await;
        let mut cache = self.cache.write().unwrap();
        if let Some(entry) = cache.entries.get_mut(callsign) {
            entry.route_name = Some(route.name.clone());
        }
        Ok(())
    }

    /// The engine's own view of the aircraft's route.
    pub async fn route_listing(&self, callsign: &Callsign) -> Result<Vec<String>, ProxyError> {
        Ok(self.controller.list_route(callsign).await?)
    }

    /// Seeds proxy-tracked fields for a freshly loaded scenario.
    ///
    /// Waits (bounded, same policy as creation) for the scenario's
    /// aircraft to reach the table, then stamps each entry with the
    /// spawn's flight levels and route. Aircraft still missing after the
    /// wait keep unset fields until commanded directly.
    pub async fn prime_from_scenario(
        &self,
        definition: &ScenarioDefinition,
    ) -> Result<(), ProxyError> {
        for attempt in 0..self.config.create_poll_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.config.create_poll_interval).await;
            }
            self.invalidate();
            let table = self.all_properties().await?;
            if definition
                .spawns
                .iter()
                .all(|spawn| table.contains_key(&spawn.callsign))
            {
                break;
            }
        }

        let _refresh = self.refresh_gate.lock().await;
        let mut cache = self.cache.write().unwrap();
        for spawn in &definition.spawns {
            match cache.entries.get_mut(&spawn.callsign) {
                Some(entry) => {
                    entry.cleared_flight_level = spawn.cleared_flight_level;
                    entry.requested_flight_level = spawn.requested_flight_level;
                    entry.route_name = spawn.route_name.clone();
                }
                None => {
                    tracing::debug!(callsign = %spawn.callsign, "scenario aircraft not yet visible");
                }
            }
        }
        Ok(())
    }

    /// Marks the cache stale; the next read refetches.
    pub fn invalidate(&self) {
        self.cache.write().unwrap().valid = false;
    }

    /// Drops every entry, proxy-tracked fields included.
    pub async fn clear(&self) {
        let _refresh = self.refresh_gate.lock().await;
        let mut cache = self.cache.write().unwrap();
        cache.entries.clear();
        cache.valid = false;
    }
}

// ============================================================================
// Tests
// ============================================================================
