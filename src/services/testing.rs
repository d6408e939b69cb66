//! In-memory doubles for the provider and storage seams.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::db::models::{NewSpot, Spot, SpotUpdate};
use crate::db::store::{ForecastStore, SpotRepository};
use crate::services::conditions::{EnvironmentalSample, Swell};
use crate::services::pipeline::Forecast;
use crate::services::providers::{
    ProviderError, TideLevel, TideStation, TideStationProvider, WaveModelProvider,
    WeatherProvider,
};
use crate::services::units::UnitSystem;

/// A spot next to Port San Luis on the Central Coast.
pub fn sample_spot(id: i64, name: &str) -> Spot {
    Spot {
        id,
        name: name.to_string(),
        latitude: 35.1428,
        longitude: -120.6413,
        description: None,
        location: Some("San Luis Obispo County".to_string()),
        difficulty: None,
        created_at: Utc::now(),
        updated_at: None,
    }
}

/// Metric wave sample with one swell train that doubles as the summary.
pub fn swell_sample(
    time: DateTime<Utc>,
    height: f64,
    period: f64,
    direction: f64,
) -> EnvironmentalSample {
    let swell = Swell {
        height,
        period,
        direction,
    };
    let mut sample = EnvironmentalSample::new(time, UnitSystem::Metric);
    sample.wave_summary = Some(swell);
    sample.swell_components = vec![swell];
    sample
}

pub fn weather_sample(
    time: DateTime<Utc>,
    wind_speed: f64,
    wind_direction: f64,
    air_temperature: f64,
) -> EnvironmentalSample {
    let mut sample = EnvironmentalSample::new(time, UnitSystem::Metric);
    sample.wind_speed = Some(wind_speed);
    sample.wind_direction = Some(wind_direction);
    sample.air_temperature = Some(air_temperature);
    sample
}

// --- providers ---

enum WaveOutcome {
    Samples(Vec<EnvironmentalSample>),
    Fail(fn() -> ProviderError),
}

pub struct StubWaves {
    outcome: Mutex<WaveOutcome>,
    /// Spots at this latitude get no wave data
    failing_latitude: Mutex<Option<f64>>,
    pub calls: AtomicUsize,
    pub last_window: Mutex<Option<(u32, u32)>>,
}

impl StubWaves {
    fn new(outcome: WaveOutcome) -> Self {
        Self {
            outcome: Mutex::new(outcome),
            failing_latitude: Mutex::new(None),
            calls: AtomicUsize::new(0),
            last_window: Mutex::new(None),
        }
    }

    pub fn with_samples(samples: Vec<EnvironmentalSample>) -> Self {
        Self::new(WaveOutcome::Samples(samples))
    }

    /// Succeeds with no samples at all.
    pub fn empty() -> Self {
        Self::with_samples(Vec::new())
    }

    pub fn failing(error: fn() -> ProviderError) -> Self {
        Self::new(WaveOutcome::Fail(error))
    }

    pub fn set_failing(&self, error: fn() -> ProviderError) {
        *self.outcome.lock().unwrap() = WaveOutcome::Fail(error);
    }

    pub fn set_samples(&self, samples: Vec<EnvironmentalSample>) {
        *self.outcome.lock().unwrap() = WaveOutcome::Samples(samples);
    }

    pub fn fail_at_latitude(&self, latitude: f64) {
        *self.failing_latitude.lock().unwrap() = Some(latitude);
    }
}

#[async_trait]
impl WaveModelProvider for StubWaves {
    async fn fetch_wave_samples(
        &self,
        latitude: f64,
        _longitude: f64,
        start_hour: u32,
        end_hour: u32,
    ) -> Result<Vec<EnvironmentalSample>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_window.lock().unwrap() = Some((start_hour, end_hour));
        if *self.failing_latitude.lock().unwrap() == Some(latitude) {
            return Err(ProviderError::Empty {
                provider: "stub waves",
            });
        }
        match &*self.outcome.lock().unwrap() {
            WaveOutcome::Samples(samples) => Ok(samples.clone()),
            WaveOutcome::Fail(error) => Err(error()),
        }
    }
}

pub struct StubWeather {
    /// `None` fails every call
    samples: Option<Vec<EnvironmentalSample>>,
    pub calls: AtomicUsize,
}

impl StubWeather {
    pub fn with_samples(samples: Vec<EnvironmentalSample>) -> Self {
        Self {
            samples: Some(samples),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            samples: None,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Default for StubWeather {
    /// Light onshore breeze at the current hour.
    fn default() -> Self {
        Self::with_samples(vec![weather_sample(Utc::now(), 4.0, 290.0, 14.0)])
    }
}

#[async_trait]
impl WeatherProvider for StubWeather {
    async fn fetch_hourly_weather(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<Vec<EnvironmentalSample>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.samples.clone().ok_or(ProviderError::Status {
            provider: "stub weather",
            status: 503,
        })
    }
}

pub struct StubTides {
    stations: Vec<TideStation>,
    fail_levels: bool,
    station_list_failures: AtomicUsize,
    pub station_list_calls: AtomicUsize,
    pub requested_stations: Mutex<Vec<String>>,
}

impl StubTides {
    pub fn with_stations(stations: Vec<TideStation>) -> Self {
        Self {
            stations,
            ..Self::default()
        }
    }

    pub fn failing_levels() -> Self {
        Self {
            fail_levels: true,
            ..Self::default()
        }
    }

    /// The first station list call fails, later ones succeed.
    pub fn failing_station_list_once() -> Self {
        Self {
            station_list_failures: AtomicUsize::new(1),
            ..Self::default()
        }
    }
}

impl Default for StubTides {
    fn default() -> Self {
        let station = |id: &str, name: &str, latitude: f64, longitude: f64| TideStation {
            id: id.to_string(),
            name: name.to_string(),
            latitude,
            longitude,
        };
        Self {
            stations: vec![
                station("9414290", "San Francisco", 37.8063, -122.4659),
                station("9412110", "Port San Luis", 35.1683, -120.754),
                station("9413450", "Monterey", 36.6089, -121.8914),
            ],
            fail_levels: false,
            station_list_failures: AtomicUsize::new(0),
            station_list_calls: AtomicUsize::new(0),
            requested_stations: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TideStationProvider for StubTides {
    async fn list_stations(&self) -> Result<Vec<TideStation>, ProviderError> {
        self.station_list_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.station_list_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.station_list_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ProviderError::Timeout {
                provider: "stub tides",
            });
        }
        Ok(self.stations.clone())
    }

    async fn fetch_tide_levels(
        &self,
        station_id: &str,
        start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<TideLevel>, ProviderError> {
        self.requested_stations
            .lock()
            .unwrap()
            .push(station_id.to_string());
        if self.fail_levels {
            return Err(ProviderError::Empty {
                provider: "stub tides",
            });
        }
        Ok(vec![TideLevel {
            time: start,
            level: 3.4,
            unit: UnitSystem::Imperial,
        }])
    }
}

// --- storage ---

#[derive(Default)]
pub struct InMemorySpots {
    spots: Mutex<Vec<Spot>>,
    pub fail_listing: bool,
}

impl InMemorySpots {
    pub fn new(spots: Vec<Spot>) -> Self {
        Self {
            spots: Mutex::new(spots),
            fail_listing: false,
        }
    }
}

#[async_trait]
impl SpotRepository for InMemorySpots {
    async fn list_spots(&self, location: Option<&str>) -> Result<Vec<Spot>, sqlx::Error> {
        if self.fail_listing {
            return Err(sqlx::Error::PoolTimedOut);
        }
        let mut spots: Vec<Spot> = self
            .spots
            .lock()
            .unwrap()
            .iter()
            .filter(|s| location.is_none() || s.location.as_deref() == location)
            .cloned()
            .collect();
        spots.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(spots)
    }

    async fn get_spot(&self, id: i64) -> Result<Option<Spot>, sqlx::Error> {
        Ok(self.spots.lock().unwrap().iter().find(|s| s.id == id).cloned())
    }

    async fn create_spot(&self, body: &NewSpot) -> Result<Spot, sqlx::Error> {
        let mut spots = self.spots.lock().unwrap();
        let spot = Spot {
            id: spots.iter().map(|s| s.id).max().unwrap_or(0) + 1,
            name: body.name.trim().to_string(),
            latitude: body.latitude,
            longitude: body.longitude,
            description: body.description.clone(),
            location: body.location.clone(),
            difficulty: body.difficulty.clone(),
            created_at: Utc::now(),
            updated_at: None,
        };
        spots.push(spot.clone());
        Ok(spot)
    }

    async fn update_spot(
        &self,
        id: i64,
        update: &SpotUpdate,
    ) -> Result<Option<Spot>, sqlx::Error> {
        let mut spots = self.spots.lock().unwrap();
        Ok(spots.iter_mut().find(|s| s.id == id).map(|spot| {
            apply_update(update, spot);
            spot.updated_at = Some(Utc::now());
            spot.clone()
        }))
    }

    async fn delete_spot(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut spots = self.spots.lock().unwrap();
        let before = spots.len();
        spots.retain(|s| s.id != id);
        Ok(spots.len() < before)
    }
}

/// Same per-column semantics as the `COALESCE` update in `queries::update_spot`.
fn apply_update(update: &SpotUpdate, spot: &mut Spot) {
    if let Some(name) = &update.name {
        spot.name = name.trim().to_string();
    }
    if let Some(latitude) = update.latitude {
        spot.latitude = latitude;
    }
    if let Some(longitude) = update.longitude {
        spot.longitude = longitude;
    }
    if update.description.is_some() {
        spot.description = update.description.clone();
    }
    if update.location.is_some() {
        spot.location = update.location.clone();
    }
    if update.difficulty.is_some() {
        spot.difficulty = update.difficulty.clone();
    }
}

/// Rows in insertion order, like an unconstrained table. Reads pick the
/// newest row per spot.
#[derive(Default)]
pub struct InMemoryForecasts {
    rows: Mutex<Vec<Forecast>>,
    pub replace_calls: AtomicUsize,
}

impl InMemoryForecasts {
    /// Append a row as-is, without removing earlier rows for the spot.
    pub fn insert(&self, forecast: Forecast) {
        self.rows.lock().unwrap().push(forecast);
    }

    /// Newest row for the spot.
    pub fn get(&self, spot_id: i64) -> Option<Forecast> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.spot_id == spot_id)
            .max_by_key(|f| f.timestamp)
            .cloned()
    }

    pub fn rows_for(&self, spot_id: i64) -> usize {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.spot_id == spot_id)
            .count()
    }

    pub fn clear(&self) {
        self.rows.lock().unwrap().clear();
    }

    /// Total rows across all spots.
    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl ForecastStore for InMemoryForecasts {
    async fn latest_forecast(&self, spot_id: i64) -> Result<Option<Forecast>, sqlx::Error> {
        Ok(self.get(spot_id))
    }

    async fn replace_forecast(&self, forecast: &Forecast) -> Result<Forecast, sqlx::Error> {
        self.replace_calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|f| f.spot_id != forecast.spot_id);
        rows.push(forecast.clone());
        Ok(forecast.clone())
    }
}
