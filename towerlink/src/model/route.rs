//! Routes and waypoints.
//!
//! The remote engine accepts route legs as commands but never reports a
//! route back, so the gateway keeps its own route table (built from sector
//! definitions at scenario load) and its own waypoint cache. Waypoint
//! definitions are treated as immutable once created.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::Position;

/// Named fix with a position and an optional crossing altitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub position: Position,
    #[serde(default)]
    pub altitude_ft: Option<f64>,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
            altitude_ft: None,
        }
    }

    pub fn with_altitude(mut self, altitude_ft: f64) -> Self {
        self.altitude_ft = Some(altitude_ft);
        self
    }
}

/// One leg of a route: the target waypoint plus optional constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub waypoint: String,
    #[serde(default)]
    pub target_altitude_ft: Option<f64>,
    #[serde(default)]
    pub target_speed_kt: Option<f64>,
}

impl RouteLeg {
    pub fn new(waypoint: impl Into<String>) -> Self {
        Self {
            waypoint: waypoint.into(),
            target_altitude_ft: None,
            target_speed_kt: None,
        }
    }
}

/// Ordered sequence of route legs with a current-segment index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub name: String,
    legs: Vec<RouteLeg>,
    #[serde(skip)]
    current_leg: usize,
}

/// An aircraft within this distance of a leg's waypoint is considered to
/// have reached it; the next unvisited waypoint is then the following leg.
const WAYPOINT_REACHED_NM: f64 = 1.0;

impl Route {
    pub fn new(name: impl Into<String>, legs: Vec<RouteLeg>) -> Self {
        Self {
            name: name.into(),
            legs,
            current_leg: 0,
        }
    }

    pub fn legs(&self) -> &[RouteLeg] {
        &self.legs
    }

    pub fn current_leg(&self) -> usize {
        self.current_leg
    }

    /// Move the current-segment index. Indices past the end are clamped.
    pub fn set_current_leg(&mut self, index: usize) {
        self.current_leg = index.min(self.legs.len());
    }

    /// Names of every waypoint on the route, in order.
    pub fn waypoint_names(&self) -> Vec<String> {
        self.legs.iter().map(|leg| leg.waypoint.clone()).collect()
    }

    /// Whether the route contains the named waypoint (case-insensitive).
    pub fn contains(&self, waypoint: &str) -> bool {
        self.legs
            .iter()
            .any(|leg| leg.waypoint.eq_ignore_ascii_case(waypoint))
    }

    /// Next unvisited leg for an aircraft at `position`.
    ///
    /// Searches from the current segment onward for the nearest waypoint
    /// with a known position; if the aircraft is already within
    /// [`WAYPOINT_REACHED_NM`] of it, the following leg is returned instead.
    /// Returns `None` when the route is exhausted or no remaining waypoint
    /// has a known position.
    pub fn next_unvisited(
        &self,
        position: Position,
        waypoints: &HashMap<String, Waypoint>,
    ) -> Option<&RouteLeg> {
        let remaining = self.legs.get(self.current_leg..)?;

        let mut nearest: Option<(usize, f64)> = None;
        for (offset, leg) in remaining.iter().enumerate() {
            let Some(wp) = waypoints.get(&leg.waypoint.to_ascii_uppercase()) else {
                continue;
            };
            let d = position.distance_nm(&wp.position);
            if nearest.map_or(true, |(_, best)| d < best) {
                nearest = Some((offset, d));
            }
        }

        let (offset, distance) = nearest?;
        let index = if distance <= WAYPOINT_REACHED_NM {
            self.current_leg + offset + 1
        } else {
            self.current_leg + offset
        };
        self.legs.get(index)
    }
}
