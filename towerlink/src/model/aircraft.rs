//! Aircraft identity and per-aircraft state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique aircraft identifier, normalized to uppercase.
///
/// All aircraft maps in the gateway are keyed by callsign, so two spellings
/// of the same identifier ("ba123", "BA123") must compare equal. Normalizing
/// at construction keeps every downstream lookup a plain hash lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct Callsign(String);

impl Callsign {
    /// Create a callsign, trimming whitespace and uppercasing.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Callsign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Callsign {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for Callsign {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

impl Position {
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
        }
    }

    /// Great-circle distance to another position in nautical miles.
    pub fn distance_nm(&self, other: &Position) -> f64 {
        const EARTH_RADIUS_NM: f64 = 3440.065;

        let lat1 = self.latitude_deg.to_radians();
        let lat2 = other.latitude_deg.to_radians();
        let dlat = (other.latitude_deg - self.latitude_deg).to_radians();
        let dlon = (other.longitude_deg - self.longitude_deg).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_NM * c
    }

    /// Initial great-circle bearing toward another position, degrees in [0, 360).
    pub fn bearing_deg_to(&self, other: &Position) -> f64 {
        let lat1 = self.latitude_deg.to_radians();
        let lat2 = other.latitude_deg.to_radians();
        let dlon = (other.longitude_deg - self.longitude_deg).to_radians();

        let y = dlon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

        (y.atan2(x).to_degrees() + 360.0) % 360.0
    }
}

/// Reconciled per-aircraft snapshot.
///
/// Fields split by origin:
/// - engine-reported (refreshed from every state broadcast): `position`,
///   `altitude_ft`, `ground_speed_kt`, `heading_deg`, `vertical_speed_fpm`,
///   `aircraft_type`;
/// - proxy-tracked (the engine does not persist these, the gateway is their
///   sole source of truth): `cleared_flight_level`, `requested_flight_level`,
///   `route_name`.
///
/// A cache refresh must never discard the proxy-tracked fields of an
/// already-known aircraft; they start unset only at first sighting.
#[derive(Debug, Clone, PartialEq)]
pub struct AircraftProperties {
    pub position: Position,
    pub altitude_ft: f64,
    pub ground_speed_kt: f64,
    pub heading_deg: f64,
    pub vertical_speed_fpm: f64,
    pub aircraft_type: String,
    pub cleared_flight_level: Option<u32>,
    pub requested_flight_level: Option<u32>,
    pub route_name: Option<String>,
}

/// Typed create-aircraft request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AircraftSpawn {
    pub callsign: Callsign,
    pub aircraft_type: String,
    pub position: Position,
    pub heading_deg: f64,
    pub altitude_ft: f64,
    pub ground_speed_kt: f64,
    /// Initial cleared flight level tracked by the proxy after creation.
    #[serde(default)]
    pub cleared_flight_level: Option<u32>,
    /// Initial requested flight level tracked by the proxy after creation.
    #[serde(default)]
    pub requested_flight_level: Option<u32>,
    /// Route assigned at creation, if any. Must name a route known to the
    /// proxy's route table to be usable by direct-to validation.
    #[serde(default)]
    pub route_name: Option<String>,
}

impl AircraftSpawn {
    /// Minimal spawn with the mandatory engine-side fields.
    pub fn new(
        callsign: impl Into<Callsign>,
        aircraft_type: impl Into<String>,
        position: Position,
        heading_deg: f64,
        altitude_ft: f64,
        ground_speed_kt: f64,
    ) -> Self {
        Self {
            callsign: callsign.into(),
            aircraft_type: aircraft_type.into(),
            position,
            heading_deg,
            altitude_ft,
            ground_speed_kt,
            cleared_flight_level: None,
            requested_flight_level: None,
            route_name: None,
        }
    }

    pub fn with_route(mut self, route_name: impl Into<String>) -> Self {
        self.route_name = Some(route_name.into());
        self
    }

    pub fn with_flight_levels(mut self, cleared: Option<u32>, requested: Option<u32>) -> Self {
        self.cleared_flight_level = cleared;
        self.requested_flight_level = requested;
        self
    }
}
