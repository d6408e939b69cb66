//! Unit systems, physical unit conversion and compass directions.
//!
//! Upstream models report in whatever system they were built with (the marine
//! model and yr.no are metric, NOAA tides are requested in feet). Everything
//! shown to clients is imperial: feet, miles per hour, degrees Fahrenheit.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Feet per metre.
const FEET_PER_METER: f64 = 3.28084;

/// Miles per hour per metre per second.
const MPH_PER_METER_PER_SECOND: f64 = 2.23694;

/// Unit system a value (or a whole sample) is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    Metric,
    Imperial,
}

/// Physical quantity being converted. Periods and directions are the same in
/// every system and never go through `convert`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measurement {
    Length,
    Speed,
    Temperature,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }

    /// Short unit label, e.g. "ft" or "m/s".
    pub fn label(&self, measurement: Measurement) -> &'static str {
        match (self, measurement) {
            (UnitSystem::Metric, Measurement::Length) => "m",
            (UnitSystem::Metric, Measurement::Speed) => "m/s",
            (UnitSystem::Metric, Measurement::Temperature) => "°C",
            (UnitSystem::Imperial, Measurement::Length) => "ft",
            (UnitSystem::Imperial, Measurement::Speed) => "mph",
            (UnitSystem::Imperial, Measurement::Temperature) => "°F",
        }
    }

    /// Convert `value` of the given measurement from `self` into `destination`.
    /// Converting into the same system returns the value unchanged.
    pub fn convert(&self, measurement: Measurement, destination: UnitSystem, value: f64) -> f64 {
        match (self, measurement, destination) {
            (UnitSystem::Metric, Measurement::Length, UnitSystem::Imperial) => {
                value * FEET_PER_METER
            }
            (UnitSystem::Metric, Measurement::Speed, UnitSystem::Imperial) => {
                value * MPH_PER_METER_PER_SECOND
            }
            (UnitSystem::Metric, Measurement::Temperature, UnitSystem::Imperial) => {
                value * (9.0 / 5.0) + 32.0
            }
            (UnitSystem::Imperial, Measurement::Length, UnitSystem::Metric) => {
                value / FEET_PER_METER
            }
            (UnitSystem::Imperial, Measurement::Speed, UnitSystem::Metric) => {
                value / MPH_PER_METER_PER_SECOND
            }
            (UnitSystem::Imperial, Measurement::Temperature, UnitSystem::Metric) => {
                (value - 32.0) * (5.0 / 9.0)
            }
            _ => value,
        }
    }

    /// `convert` lifted over an optional value.
    pub fn convert_opt(
        &self,
        measurement: Measurement,
        destination: UnitSystem,
        value: Option<f64>,
    ) -> Option<f64> {
        value.map(|v| self.convert(measurement, destination, v))
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sixteen-point compass rose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardinalDirection {
    North,
    NorthNorthEast,
    NorthEast,
    EastNorthEast,
    East,
    EastSouthEast,
    SouthEast,
    SouthSouthEast,
    South,
    SouthSouthWest,
    SouthWest,
    WestSouthWest,
    West,
    WestNorthWest,
    NorthWest,
    NorthNorthWest,
}

const COMPASS_ROSE: [CardinalDirection; 16] = [
    CardinalDirection::North,
    CardinalDirection::NorthNorthEast,
    CardinalDirection::NorthEast,
    CardinalDirection::EastNorthEast,
    CardinalDirection::East,
    CardinalDirection::EastSouthEast,
    CardinalDirection::SouthEast,
    CardinalDirection::SouthSouthEast,
    CardinalDirection::South,
    CardinalDirection::SouthSouthWest,
    CardinalDirection::SouthWest,
    CardinalDirection::WestSouthWest,
    CardinalDirection::West,
    CardinalDirection::WestNorthWest,
    CardinalDirection::NorthWest,
    CardinalDirection::NorthNorthWest,
];

impl CardinalDirection {
    /// Nearest compass point for a bearing in degrees. Any finite bearing is
    /// accepted; it is wrapped into [0, 360) first.
    pub fn from_degrees(degrees: f64) -> Self {
        let wrapped = degrees.rem_euclid(360.0);
        let index = (wrapped / 22.5).round() as usize % COMPASS_ROSE.len();
        COMPASS_ROSE[index]
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            CardinalDirection::North => "N",
            CardinalDirection::NorthNorthEast => "NNE",
            CardinalDirection::NorthEast => "NE",
            CardinalDirection::EastNorthEast => "ENE",
            CardinalDirection::East => "E",
            CardinalDirection::EastSouthEast => "ESE",
            CardinalDirection::SouthEast => "SE",
            CardinalDirection::SouthSouthEast => "SSE",
            CardinalDirection::South => "S",
            CardinalDirection::SouthSouthWest => "SSW",
            CardinalDirection::SouthWest => "SW",
            CardinalDirection::WestSouthWest => "WSW",
            CardinalDirection::West => "W",
            CardinalDirection::WestNorthWest => "WNW",
            CardinalDirection::NorthWest => "NW",
            CardinalDirection::NorthNorthWest => "NNW",
        }
    }
}

impl fmt::Display for CardinalDirection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// Smallest angle between two bearings, in [0, 180].
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}
