//! Environmental samples: one model output for one forecast hour.
//!
//! Samples carry their unit system so conversion is idempotent, and are the
//! unit of merging between the wave model and the weather model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::services::tuning::BeachGeometry;
use crate::services::units::{Measurement, UnitSystem};
use crate::services::waves::{estimate_breaking_heights, BreakingWaveEstimate};

/// One directional wave train. Period is in seconds and direction in degrees
/// (where the swell comes from) in every unit system; only height converts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Swell {
    pub height: f64,
    pub period: f64,
    pub direction: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentalSample {
    pub time: DateTime<Utc>,
    pub unit: UnitSystem,
    pub wave_summary: Option<Swell>,
    /// Swell trains in the order the model reports them
    pub swell_components: Vec<Swell>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    pub air_temperature: Option<f64>,
    pub breaking: Option<BreakingWaveEstimate>,
}

impl EnvironmentalSample {
    pub fn new(time: DateTime<Utc>, unit: UnitSystem) -> Self {
        Self {
            time,
            unit,
            wave_summary: None,
            swell_components: Vec::new(),
            wind_speed: None,
            wind_direction: None,
            air_temperature: None,
            breaking: None,
        }
    }

    /// Convert every dimensional field into `target`. No-op when the sample
    /// is already tagged with `target`.
    pub fn to_units(&mut self, target: UnitSystem) {
        if self.unit == target {
            return;
        }
        let from = self.unit;
        let length = |v: f64| from.convert(Measurement::Length, target, v);

        if let Some(summary) = self.wave_summary.as_mut() {
            summary.height = length(summary.height);
        }
        for swell in &mut self.swell_components {
            swell.height = length(swell.height);
        }
        if let Some(breaking) = self.breaking.as_mut() {
            breaking.minimum = length(breaking.minimum);
            breaking.maximum = length(breaking.maximum);
        }
        self.wind_speed = from.convert_opt(Measurement::Speed, target, self.wind_speed);
        self.air_temperature =
            from.convert_opt(Measurement::Temperature, target, self.air_temperature);
        self.unit = target;
    }

    /// Solve breaking heights for this sample on the given beach.
    ///
    /// Uses the swell component with the largest breaking height, or the
    /// wave summary when the model reported no components. The sample keeps
    /// its unit system; the solver itself runs in metric.
    pub fn solve_breaking_wave_heights(&mut self, geometry: &BeachGeometry) {
        let original_unit = self.unit;
        self.to_units(UnitSystem::Metric);

        let estimate =
            |s: &Swell| estimate_breaking_heights(s.height, s.period, s.direction, geometry);

        self.breaking = if self.swell_components.is_empty() {
            self.wave_summary.as_ref().map(estimate)
        } else {
            self.swell_components
                .iter()
                .map(estimate)
                .max_by(|a, b| a.maximum.total_cmp(&b.maximum))
        };

        self.to_units(original_unit);
    }
}

/// Left-join weather fields into wave samples by nearest timestamp.
///
/// Wave samples decide which hours exist; each takes wind and temperature
/// from the closest weather sample no further than `tolerance` away. Weather
/// samples are converted into the wave sample's unit system before copying.
/// Returns how many wave samples received weather data.
pub fn merge_weather(
    wave: &mut [EnvironmentalSample],
    weather: &[EnvironmentalSample],
    tolerance: Duration,
) -> usize {
    let mut merged = 0;

    for sample in wave.iter_mut() {
        let target_ts = sample.time.timestamp();
        let closest = weather
            .iter()
            .min_by_key(|w| (w.time.timestamp() - target_ts).unsigned_abs());

        let Some(closest) = closest else {
            break;
        };
        if (closest.time - sample.time).abs() > tolerance {
            continue;
        }

        let mut matched = closest.clone();
        matched.to_units(sample.unit);

        if matched.wind_speed.is_some() {
            sample.wind_speed = matched.wind_speed;
        }
        if matched.wind_direction.is_some() {
            sample.wind_direction = matched.wind_direction;
        }
        if matched.air_temperature.is_some() {
            sample.air_temperature = matched.air_temperature;
        }
        merged += 1;
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> DateTime<Utc> {
        s.parse::<DateTime<Utc>>().unwrap()
    }

    fn wave_sample(time: &str) -> EnvironmentalSample {
        let mut s = EnvironmentalSample::new(t(time), UnitSystem::Metric);
        s.wave_summary = Some(Swell {
            height: 1.5,
            period: 12.0,
            direction: 270.0,
        });
        s.swell_components = vec![
            Swell {
                height: 1.2,
                period: 14.0,
                direction: 280.0,
            },
            Swell {
                height: 0.6,
                period: 8.0,
                direction: 200.0,
            },
        ];
        s
    }

    fn weather_sample(time: &str, wind: f64, unit: UnitSystem) -> EnvironmentalSample {
        let mut s = EnvironmentalSample::new(t(time), unit);
        s.wind_speed = Some(wind);
        s.wind_direction = Some(315.0);
        s.air_temperature = Some(15.0);
        s
    }

    #[test]
    fn test_to_units_converts_all_fields() {
        let mut s = wave_sample("2026-03-01T00:00:00Z");
        s.wind_speed = Some(10.0);
        s.air_temperature = Some(20.0);
        s.breaking = Some(BreakingWaveEstimate {
            minimum: 1.0,
            maximum: 1.4,
        });
        s.to_units(UnitSystem::Imperial);

        assert_eq!(s.unit, UnitSystem::Imperial);
        assert!((s.wave_summary.unwrap().height - 4.92126).abs() < 1e-4);
        assert!((s.swell_components[0].height - 3.937008).abs() < 1e-4);
        assert_eq!(s.swell_components[0].period, 14.0);
        assert_eq!(s.swell_components[0].direction, 280.0);
        assert!((s.wind_speed.unwrap() - 22.3694).abs() < 1e-4);
        assert!((s.air_temperature.unwrap() - 68.0).abs() < 1e-9);
        assert!((s.breaking.unwrap().maximum - 4.593176).abs() < 1e-4);
    }

    #[test]
    fn test_to_units_is_idempotent() {
        let mut s = wave_sample("2026-03-01T00:00:00Z");
        s.wind_speed = Some(12.0);
        s.to_units(UnitSystem::Imperial);
        let once = s.clone();
        s.to_units(UnitSystem::Imperial);
        assert_eq!(s, once);
    }

    #[test]
    fn test_imperial_sample_to_imperial_unchanged() {
        let mut s = EnvironmentalSample::new(t("2026-03-01T00:00:00Z"), UnitSystem::Imperial);
        s.wave_summary = Some(Swell {
            height: 4.0,
            period: 11.0,
            direction: 250.0,
        });
        s.wind_speed = Some(9.0);
        s.air_temperature = Some(61.0);
        let before = s.clone();
        s.to_units(UnitSystem::Imperial);
        assert_eq!(s, before);
    }

    #[test]
    fn test_solve_uses_largest_component() {
        let geometry = BeachGeometry {
            depth: 30.0,
            angle: 270.0,
            slope: 0.02,
        };
        let mut s = wave_sample("2026-03-01T00:00:00Z");
        s.solve_breaking_wave_heights(&geometry);

        let first = estimate_breaking_heights(1.2, 14.0, 280.0, &geometry);
        let breaking = s.breaking.unwrap();
        assert_eq!(breaking, first);
        assert_eq!(s.unit, UnitSystem::Metric);
    }

    #[test]
    fn test_solve_keeps_imperial_unit() {
        let geometry = BeachGeometry {
            depth: 30.0,
            angle: 270.0,
            slope: 0.02,
        };
        let mut metric = wave_sample("2026-03-01T00:00:00Z");
        metric.solve_breaking_wave_heights(&geometry);

        let mut imperial = wave_sample("2026-03-01T00:00:00Z");
        imperial.to_units(UnitSystem::Imperial);
        imperial.solve_breaking_wave_heights(&geometry);

        assert_eq!(imperial.unit, UnitSystem::Imperial);
        let expected_ft = metric.breaking.unwrap().maximum * 3.28084;
        assert!((imperial.breaking.unwrap().maximum - expected_ft).abs() < 1e-6);
    }

    #[test]
    fn test_solve_falls_back_to_summary() {
        let geometry = BeachGeometry {
            depth: 30.0,
            angle: 270.0,
            slope: 0.02,
        };
        let mut s = wave_sample("2026-03-01T00:00:00Z");
        s.swell_components.clear();
        s.solve_breaking_wave_heights(&geometry);
        assert_eq!(
            s.breaking.unwrap(),
            estimate_breaking_heights(1.5, 12.0, 270.0, &geometry)
        );
    }

    #[test]
    fn test_merge_exact_hours() {
        let mut wave = vec![
            wave_sample("2026-03-01T00:00:00Z"),
            wave_sample("2026-03-01T01:00:00Z"),
        ];
        let weather = vec![
            weather_sample("2026-03-01T00:00:00Z", 3.0, UnitSystem::Metric),
            weather_sample("2026-03-01T01:00:00Z", 5.0, UnitSystem::Metric),
        ];
        let merged = merge_weather(&mut wave, &weather, Duration::hours(3));
        assert_eq!(merged, 2);
        assert_eq!(wave[0].wind_speed, Some(3.0));
        assert_eq!(wave[1].wind_speed, Some(5.0));
        assert_eq!(wave[1].wind_direction, Some(315.0));
    }

    #[test]
    fn test_merge_wave_side_is_authoritative() {
        let mut wave = vec![wave_sample("2026-03-01T00:00:00Z")];
        let weather = vec![
            weather_sample("2026-03-01T00:00:00Z", 3.0, UnitSystem::Metric),
            weather_sample("2026-03-01T01:00:00Z", 5.0, UnitSystem::Metric),
            weather_sample("2026-03-01T02:00:00Z", 7.0, UnitSystem::Metric),
        ];
        merge_weather(&mut wave, &weather, Duration::hours(3));
        assert_eq!(wave.len(), 1);
        assert_eq!(wave[0].wind_speed, Some(3.0));
    }

    #[test]
    fn test_merge_nearest_within_tolerance() {
        let mut wave = vec![
            wave_sample("2026-03-01T02:00:00Z"),
            wave_sample("2026-03-01T12:00:00Z"),
        ];
        let weather = vec![weather_sample("2026-03-01T00:00:00Z", 4.0, UnitSystem::Metric)];
        let merged = merge_weather(&mut wave, &weather, Duration::hours(3));
        assert_eq!(merged, 1);
        assert_eq!(wave[0].wind_speed, Some(4.0));
        assert_eq!(wave[1].wind_speed, None);
    }

    #[test]
    fn test_merge_converts_weather_units() {
        let mut wave = vec![wave_sample("2026-03-01T00:00:00Z")];
        wave[0].to_units(UnitSystem::Imperial);
        let weather = vec![weather_sample("2026-03-01T00:00:00Z", 10.0, UnitSystem::Metric)];
        merge_weather(&mut wave, &weather, Duration::hours(1));
        assert!((wave[0].wind_speed.unwrap() - 22.3694).abs() < 1e-4);
        assert!((wave[0].air_temperature.unwrap() - 59.0).abs() < 1e-9);
    }

    #[test]
    fn test_merge_empty_weather() {
        let mut wave = vec![wave_sample("2026-03-01T00:00:00Z")];
        assert_eq!(merge_weather(&mut wave, &[], Duration::hours(3)), 0);
        assert_eq!(wave[0].wind_speed, None);
    }
}
