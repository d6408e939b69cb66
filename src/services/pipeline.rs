//! Forecast fetch pipeline.
//!
//! One run per spot: wave model → weather merge → breaking heights →
//! imperial conversion → nearest tide station → assembled [`Forecast`].
//! Only the wave model is mandatory; weather and tide failures are recorded
//! as [`DataGap`]s and leave the matching fields empty.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::OnceCell;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::models::Spot;
use crate::errors::ForecastError;
use crate::services::conditions::{merge_weather, EnvironmentalSample, Swell};
use crate::services::providers::{
    ProviderError, TideStation, TideStationProvider, WaveModelProvider, WeatherProvider,
};
use crate::services::tides::nearest_station;
use crate::services::tuning;
use crate::services::units::{Measurement, UnitSystem};

/// Max distance between a wave hour and the weather sample merged into it.
/// yr.no drops to 6-hourly steps after ~60 h; half of that.
const MERGE_TOLERANCE_HOURS: i64 = 3;

/// Tide levels are requested for `[now, now + TIDE_WINDOW_HOURS]`.
const TIDE_WINDOW_HOURS: i64 = 1;

/// Units everything is stored and served in.
const DISPLAY_UNITS: UnitSystem = UnitSystem::Imperial;

/// How far ahead a forecast looks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ForecastHorizon {
    /// Single-spot view: the next 24 hours
    #[default]
    Current,
    /// Multi-day view: the next 72 hours
    Extended,
}

impl ForecastHorizon {
    pub fn hours(&self) -> u32 {
        match self {
            ForecastHorizon::Current => 24,
            ForecastHorizon::Extended => 72,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ForecastHorizon::Current => "current",
            ForecastHorizon::Extended => "extended",
        }
    }
}

impl FromStr for ForecastHorizon {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "current" => Ok(ForecastHorizon::Current),
            "extended" => Ok(ForecastHorizon::Extended),
            other => Err(format!(
                "unknown forecast horizon '{}', expected 'current' or 'extended'",
                other
            )),
        }
    }
}

/// A non-fatal source that contributed nothing to a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DataGap {
    Weather,
    Tide,
}

/// Up to three swell trains of the current hour, in model order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SwellComponents {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<Swell>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<Swell>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tertiary: Option<Swell>,
}

impl SwellComponents {
    pub fn from_model_order(swells: &[Swell]) -> Self {
        let mut iter = swells.iter().copied();
        Self {
            primary: iter.next(),
            secondary: iter.next(),
            tertiary: iter.next(),
        }
    }

    pub fn len(&self) -> usize {
        [self.primary, self.secondary, self.tertiary]
            .iter()
            .filter(|s| s.is_some())
            .count()
    }
}

/// One hour of the merged series, imperial units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HourlyConditions {
    pub time: DateTime<Utc>,
    /// Open-water significant wave height (ft)
    pub wave_height: Option<f64>,
    /// Breaking height range at the beach (ft)
    pub breaking_min: Option<f64>,
    pub breaking_max: Option<f64>,
    /// mph
    pub wind_speed: Option<f64>,
    /// Degrees the wind blows from
    pub wind_direction: Option<f64>,
    /// °F
    pub air_temperature: Option<f64>,
}

impl From<&EnvironmentalSample> for HourlyConditions {
    fn from(sample: &EnvironmentalSample) -> Self {
        Self {
            time: sample.time,
            wave_height: sample.wave_summary.map(|s| s.height),
            breaking_min: sample.breaking.map(|b| b.minimum),
            breaking_max: sample.breaking.map(|b| b.maximum),
            wind_speed: sample.wind_speed,
            wind_direction: sample.wind_direction,
            air_temperature: sample.air_temperature,
        }
    }
}

/// The canonical per-spot forecast record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Forecast {
    pub id: Uuid,
    pub spot_id: i64,
    /// When the forecast was fetched (not the forecast hour)
    pub timestamp: DateTime<Utc>,
    pub horizon_hours: i32,
    /// Current minimum breaking height (ft)
    pub wave_height: f64,
    /// Water level above MLLW (ft)
    pub tide: Option<f64>,
    pub tide_station_id: Option<String>,
    pub tide_station_name: Option<String>,
    /// mph
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    pub swell_components: SwellComponents,
    pub hourly: Vec<HourlyConditions>,
    pub data_gaps: Vec<DataGap>,
}

impl Forecast {
    pub fn covers(&self, horizon: ForecastHorizon) -> bool {
        self.horizon_hours >= horizon.hours() as i32
    }

    /// Widest horizon this forecast covers.
    pub fn horizon(&self) -> ForecastHorizon {
        if self.covers(ForecastHorizon::Extended) {
            ForecastHorizon::Extended
        } else {
            ForecastHorizon::Current
        }
    }
}

struct TideReading {
    station: TideStation,
    level: f64,
}

pub struct ForecastPipeline {
    waves: Arc<dyn WaveModelProvider>,
    weather: Arc<dyn WeatherProvider>,
    tides: Arc<dyn TideStationProvider>,
    /// Station list, loaded on first use and kept for the process lifetime
    stations: OnceCell<Vec<TideStation>>,
}

impl ForecastPipeline {
    pub fn new(
        waves: Arc<dyn WaveModelProvider>,
        weather: Arc<dyn WeatherProvider>,
        tides: Arc<dyn TideStationProvider>,
    ) -> Self {
        Self {
            waves,
            weather,
            tides,
            stations: OnceCell::new(),
        }
    }

    /// Fetch and assemble a fresh forecast for `spot`. Does not touch storage.
    pub async fn fetch_forecast(
        &self,
        spot: &Spot,
        horizon: ForecastHorizon,
    ) -> Result<Forecast, ForecastError> {
        let geometry = tuning::tune(&spot.name);

        let mut samples = self
            .waves
            .fetch_wave_samples(spot.latitude, spot.longitude, 0, horizon.hours())
            .await
            .map_err(|e| match e {
                ProviderError::Empty { .. } | ProviderError::Timeout { .. } => {
                    tracing::warn!("No wave data for spot {} ({}): {}", spot.id, spot.name, e);
                    ForecastError::WaveDataUnavailable(spot.name.clone())
                }
                other => ForecastError::UnexpectedProvider(other.to_string()),
            })?;

        if samples.is_empty() {
            return Err(ForecastError::WaveDataUnavailable(spot.name.clone()));
        }

        let mut data_gaps = Vec::new();

        match self
            .weather
            .fetch_hourly_weather(spot.latitude, spot.longitude)
            .await
        {
            Ok(weather) if !weather.is_empty() => {
                let merged = merge_weather(
                    &mut samples,
                    &weather,
                    Duration::hours(MERGE_TOLERANCE_HOURS),
                );
                tracing::debug!(
                    "Merged weather into {}/{} wave hours for spot {}",
                    merged,
                    samples.len(),
                    spot.id
                );
            }
            Ok(_) => {
                tracing::warn!("Weather provider returned no samples for spot {}", spot.id);
                data_gaps.push(DataGap::Weather);
            }
            Err(e) => {
                tracing::warn!("Weather unavailable for spot {}: {}", spot.id, e);
                data_gaps.push(DataGap::Weather);
            }
        }

        for sample in samples.iter_mut() {
            sample.solve_breaking_wave_heights(&geometry);
            sample.to_units(DISPLAY_UNITS);
        }

        let now = Utc::now();
        let tide = match self.current_tide(spot, now).await {
            Ok(reading) => Some(reading),
            Err(e) => {
                tracing::warn!("Tide unavailable for spot {}: {}", spot.id, e);
                data_gaps.push(DataGap::Tide);
                None
            }
        };

        let current = &samples[0];

        let forecast = Forecast {
            id: Uuid::new_v4(),
            spot_id: spot.id,
            timestamp: now,
            horizon_hours: horizon.hours() as i32,
            wave_height: current.breaking.map(|b| b.minimum).unwrap_or_default(),
            tide: tide.as_ref().map(|t| t.level),
            tide_station_id: tide.as_ref().map(|t| t.station.id.clone()),
            tide_station_name: tide.as_ref().map(|t| t.station.name.clone()),
            wind_speed: current.wind_speed,
            wind_direction: current.wind_direction,
            swell_components: SwellComponents::from_model_order(&current.swell_components),
            hourly: samples.iter().map(HourlyConditions::from).collect(),
            data_gaps,
        };
        tracing::debug!(
            "Assembled {} forecast for spot {}: {} hours, {} swell trains, gaps {:?}",
            horizon.as_str(),
            spot.id,
            forecast.hourly.len(),
            forecast.swell_components.len(),
            forecast.data_gaps
        );
        Ok(forecast)
    }

    async fn stations(&self) -> Result<&[TideStation], ProviderError> {
        self.stations
            .get_or_try_init(|| self.tides.list_stations())
            .await
            .map(Vec::as_slice)
    }

    async fn current_tide(
        &self,
        spot: &Spot,
        now: DateTime<Utc>,
    ) -> Result<TideReading, ProviderError> {
        let stations = self.stations().await?;
        let station = nearest_station(stations, spot.latitude, spot.longitude).ok_or(
            ProviderError::Empty {
                provider: "tide stations",
            },
        )?;

        let levels = self
            .tides
            .fetch_tide_levels(&station.id, now, now + Duration::hours(TIDE_WINDOW_HOURS))
            .await?;
        let first = levels.first().ok_or(ProviderError::Empty {
            provider: "tide levels",
        })?;

        Ok(TideReading {
            station: station.clone(),
            level: first
                .unit
                .convert(Measurement::Length, DISPLAY_UNITS, first.level),
        })
    }
}
