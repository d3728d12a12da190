//! Aviation unit conversions.
//!
//! Callers work in the units the capability interfaces expose (feet, knots,
//! degrees, feet-per-minute); the engine's commands address altitude as
//! flight levels. All conversions happen at command-build time so nothing
//! downstream has to remember which unit a wire field is in.

/// Meters per second to knots.
pub const MS_TO_KNOTS: f64 = 1.94384;

/// Meters to feet.
pub const METERS_TO_FEET: f64 = 3.28084;

/// Feet of altitude per flight level (FL1 = 100 ft).
pub const FEET_PER_FLIGHT_LEVEL: f64 = 100.0;

pub fn mps_to_knots(mps: f64) -> f64 {
    mps * MS_TO_KNOTS
}

pub fn knots_to_mps(knots: f64) -> f64 {
    knots / MS_TO_KNOTS
}

pub fn meters_to_feet(meters: f64) -> f64 {
    meters * METERS_TO_FEET
}

pub fn feet_to_meters(feet: f64) -> f64 {
    feet / METERS_TO_FEET
}

/// Altitude in feet to the nearest flight level.
pub fn altitude_to_flight_level(altitude_ft: f64) -> u32 {
    (altitude_ft / FEET_PER_FLIGHT_LEVEL).round().max(0.0) as u32
}

pub fn flight_level_to_feet(flight_level: u32) -> f64 {
    f64::from(flight_level) * FEET_PER_FLIGHT_LEVEL
}

/// Wire spelling of a flight level, e.g. `FL120`.
pub fn format_flight_level(flight_level: u32) -> String {
    format!("FL{:03}", flight_level)
}

/// Normalize a heading into [0, 360).
pub fn normalize_heading(heading_deg: f64) -> f64 {
    let h = heading_deg % 360.0;
    if h < 0.0 {
        h + 360.0
    } else {
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_conversion_roundtrip() {
        let knots = mps_to_knots(100.0);
        assert!((knots - 194.384).abs() < 1e-9);
        assert!((knots_to_mps(knots) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_altitude_conversion_roundtrip() {
        let feet = meters_to_feet(1000.0);
        assert!((feet - 3280.84).abs() < 1e-9);
        assert!((feet_to_meters(feet) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_flight_level_rounding() {
        assert_eq!(altitude_to_flight_level(12_000.0), 120);
        assert_eq!(altitude_to_flight_level(12_049.0), 120);
        assert_eq!(altitude_to_flight_level(12_050.0), 121);
        assert_eq!(altitude_to_flight_level(-500.0), 0);
    }

    #[test]
    fn test_flight_level_formatting() {
        assert_eq!(format_flight_level(80), "FL080");
        assert_eq!(format_flight_level(120), "FL120");
        assert_eq!(format_flight_level(5), "FL005");
    }

    #[test]
    fn test_normalize_heading() {
        assert_eq!(normalize_heading(0.0), 0.0);
        assert_eq!(normalize_heading(360.0), 0.0);
        assert_eq!(normalize_heading(450.0), 90.0);
        assert_eq!(normalize_heading(-90.0), 270.0);
    }
}
