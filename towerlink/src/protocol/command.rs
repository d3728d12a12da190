//! Command text builders.
//!
//! The engine accepts plain-text commands of the form `VERB ARG1 ARG2 …`.
//! Builders apply unit conversions (altitude feet to flight level) so the
//! rest of the crate works in the units callers use.

use crate::model::{AircraftSpawn, Callsign, RouteLeg, Waypoint};

use super::units;

/// Format a numeric argument without trailing zeros.
fn fmt_num(value: f64) -> String {
    if value == value.trunc() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let mut text = format!("{:.6}", value);
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
        text
    }
}

pub fn create(spawn: &AircraftSpawn) -> String {
    format!(
        "CRE {} {} {} {} {} {} {}",
        spawn.callsign,
        spawn.aircraft_type,
        fmt_num(spawn.position.latitude_deg),
        fmt_num(spawn.position.longitude_deg),
        fmt_num(units::normalize_heading(spawn.heading_deg)),
        units::format_flight_level(units::altitude_to_flight_level(spawn.altitude_ft)),
        fmt_num(spawn.ground_speed_kt),
    )
}

pub fn delete(callsign: &Callsign) -> String {
    format!("DEL {}", callsign)
}

pub fn cleared_flight_level(callsign: &Callsign, altitude_ft: f64) -> String {
    format!(
        "ALT {} {}",
        callsign,
        units::format_flight_level(units::altitude_to_flight_level(altitude_ft)),
    )
}

pub fn heading(callsign: &Callsign, degrees: f64) -> String {
    format!("HDG {} {}", callsign, fmt_num(units::normalize_heading(degrees)))
}

pub fn ground_speed(callsign: &Callsign, knots: f64) -> String {
    format!("SPD {} {}", callsign, fmt_num(knots))
}

pub fn vertical_speed(callsign: &Callsign, feet_per_minute: f64) -> String {
    format!("VS {} {}", callsign, fmt_num(feet_per_minute))
}

pub fn direct_to(callsign: &Callsign, waypoint: &str) -> String {
    format!("DCT {} {}", callsign, waypoint.to_ascii_uppercase())
}

pub fn add_route_leg(callsign: &Callsign, leg: &RouteLeg) -> String {
    let mut text = format!("ADDWPT {} {}", callsign, leg.waypoint.to_ascii_uppercase());
    if let Some(altitude_ft) = leg.target_altitude_ft {
        text.push(' ');
        text.push_str(&units::format_flight_level(units::altitude_to_flight_level(
            altitude_ft,
        )));
    }
    if let Some(speed_kt) = leg.target_speed_kt {
        text.push(' ');
        text.push_str(&fmt_num(speed_kt));
    }
    text
}

pub fn list_route(callsign: &Callsign) -> String {
    format!("LISTRTE {}", callsign)
}

pub fn define_waypoint(waypoint: &Waypoint) -> String {
    let mut text = format!(
        "DEFWPT {} {} {}",
        waypoint.name.to_ascii_uppercase(),
        fmt_num(waypoint.position.latitude_deg),
        fmt_num(waypoint.position.longitude_deg),
    );
    if let Some(altitude_ft) = waypoint.altitude_ft {
        text.push(' ');
        text.push_str(&fmt_num(altitude_ft));
    }
    text
}

pub fn step_size(seconds: f64) -> String {
    format!("DT {}", fmt_num(seconds))
}

pub fn speed_multiplier(factor: f64) -> String {
    format!("DTMULT {}", fmt_num(factor))
}

pub fn seed(value: u64) -> String {
    format!("SEED {}", value)
}

pub fn hold() -> String {
    "HOLD".to_string()
}

pub fn resume() -> String {
    "OP".to_string()
}

pub fn step() -> String {
    "STEP".to_string()
}

pub fn reset() -> String {
    "RESET".to_string()
}

pub fn load_scenario(name: &str) -> String {
    format!("IC {}", name)
}

pub fn upload_scenario(name: &str, content_json: &str) -> String {
    format!("SCEN {} {}", name, content_json)
}

pub fn quit() -> String {
    "QUIT".to_string()
}
