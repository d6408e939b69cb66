//! Per-day summaries of a stored forecast's hourly series.
//!
//! Hours are grouped by UTC calendar date. Each day averages whatever hours
//! carry a value; a day with no wind data gets no wind line.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

use crate::services::pipeline::HourlyConditions;
use crate::services::units::{CardinalDirection, Measurement, UnitSystem};

/// One calendar day of a forecast.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ForecastDay {
    /// Weekday name, e.g. "Saturday"
    pub day: String,
    /// Calendar date (UTC), "YYYY-MM-DD"
    pub date: String,
    /// Mean open-water wave height (ft)
    pub wave_height: Option<f64>,
    /// Mean wind speed (mph)
    pub wind_speed: Option<f64>,
    /// Mean wind bearing as a compass point
    pub wind_direction: Option<String>,
    /// Display line, e.g. "8.1 mph WSW"
    pub wind: Option<String>,
    /// Mean air temperature (°F), truncated to whole degrees
    pub temperature: Option<i32>,
    /// Hours that went into this day
    pub hours: usize,
}

#[derive(Default)]
struct DayAccumulator {
    wave_heights: Vec<f64>,
    wind_speeds: Vec<f64>,
    wind_directions: Vec<f64>,
    temperatures: Vec<f64>,
    hours: usize,
}

/// Group an hourly series into days, oldest first.
pub fn daily_summaries(hourly: &[HourlyConditions]) -> Vec<ForecastDay> {
    let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();

    for hour in hourly {
        let acc = days.entry(hour.time.date_naive()).or_default();
        acc.hours += 1;
        acc.wave_heights.extend(hour.wave_height);
        acc.wind_speeds.extend(hour.wind_speed);
        acc.wind_directions.extend(hour.wind_direction);
        acc.temperatures.extend(hour.air_temperature);
    }

    days.into_iter()
        .map(|(date, acc)| {
            let wind_speed = mean(&acc.wind_speeds).map(round_1dp);
            let wind_direction = circular_mean(&acc.wind_directions)
                .map(|deg| CardinalDirection::from_degrees(deg).abbreviation().to_string());
            let wind = wind_speed.map(|speed| {
                let label = UnitSystem::Imperial.label(Measurement::Speed);
                match &wind_direction {
                    Some(dir) => format!("{:.1} {} {}", speed, label, dir),
                    None => format!("{:.1} {}", speed, label),
                }
            });
            ForecastDay {
                day: date.format("%A").to_string(),
                date: date.format("%Y-%m-%d").to_string(),
                wave_height: mean(&acc.wave_heights).map(round_1dp),
                wind_speed,
                wind_direction,
                wind,
                temperature: mean(&acc.temperatures).map(|t| t.trunc() as i32),
                hours: acc.hours,
            }
        })
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Mean bearing in [0, 360). None for an empty set or when the bearings
/// cancel out exactly.
fn circular_mean(bearings: &[f64]) -> Option<f64> {
    if bearings.is_empty() {
        return None;
    }
    let (sin, cos) = bearings.iter().fold((0.0, 0.0), |(s, c), deg| {
        let rad = deg.to_radians();
        (s + rad.sin(), c + rad.cos())
    });
    if sin.abs() < 1e-9 && cos.abs() < 1e-9 {
        return None;
    }
    Some(sin.atan2(cos).to_degrees().rem_euclid(360.0))
}

fn round_1dp(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
