//! NOAA CO-OPS tide predictions client.
//!
//! Station metadata comes from the MD API, levels from the data getter.
//! Levels are requested in feet above MLLW, GMT timestamps.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

use crate::services::providers::{
    ensure_success, http_client, ProviderError, TideLevel, TideStation, TideStationProvider,
};
use crate::services::units::UnitSystem;

pub const DEFAULT_TIDE_STATIONS_URL: &str =
    "https://api.tidesandcurrents.noaa.gov/mdapi/prod/webapi/stations.json";
pub const DEFAULT_TIDE_DATA_URL: &str =
    "https://api.tidesandcurrents.noaa.gov/api/prod/datagetter";

const PROVIDER: &str = "noaa tides";

#[derive(Debug, Clone)]
pub struct NoaaTideClient {
    client: reqwest::Client,
    stations_url: String,
    data_url: String,
}

// --- NOAA JSON response types ---

#[derive(Debug, Deserialize)]
struct StationsResponse {
    #[serde(default)]
    stations: Vec<StationRecord>,
}

#[derive(Debug, Deserialize)]
struct StationRecord {
    id: String,
    name: String,
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct PredictionsResponse {
    #[serde(default)]
    predictions: Vec<PredictionRecord>,
    error: Option<NoaaError>,
}

/// NOAA sends levels as strings: {"t":"2026-03-01 07:06","v":"0.873"}
#[derive(Debug, Deserialize)]
struct PredictionRecord {
    t: String,
    v: String,
}

#[derive(Debug, Deserialize)]
struct NoaaError {
    message: String,
}

impl From<StationRecord> for TideStation {
    fn from(record: StationRecord) -> Self {
        TideStation {
            id: record.id,
            name: record.name,
            latitude: record.lat,
            longitude: record.lng,
        }
    }
}

impl NoaaTideClient {
    pub fn new(stations_url: &str, data_url: &str, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            stations_url: stations_url.to_string(),
            data_url: data_url.to_string(),
        }
    }
}

#[async_trait]
impl TideStationProvider for NoaaTideClient {
    async fn list_stations(&self) -> Result<Vec<TideStation>, ProviderError> {
        let response = self
            .client
            .get(&self.stations_url)
            .query(&[("type", "tidepredictions")])
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        let body: StationsResponse = ensure_success(PROVIDER, response)?
            .json()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        if body.stations.is_empty() {
            return Err(ProviderError::Empty { provider: PROVIDER });
        }

        tracing::info!("Loaded {} NOAA tide stations", body.stations.len());
        Ok(body.stations.into_iter().map(TideStation::from).collect())
    }

    async fn fetch_tide_levels(
        &self,
        station_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TideLevel>, ProviderError> {
        let begin_date = start.format("%Y%m%d %H:%M").to_string();
        let end_date = end.format("%Y%m%d %H:%M").to_string();

        let response = self
            .client
            .get(&self.data_url)
            .query(&[
                ("begin_date", begin_date.as_str()),
                ("end_date", end_date.as_str()),
                ("station", station_id),
                ("product", "predictions"),
                ("datum", "MLLW"),
                ("units", "english"),
                ("time_zone", "gmt"),
                ("application", "surf_forecast_api"),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        let body: PredictionsResponse = ensure_success(PROVIDER, response)?
            .json()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        // NOAA reports "no data" as HTTP 200 with an error object
        if let Some(error) = body.error {
            tracing::debug!("NOAA station {}: {}", station_id, error.message);
            return Err(ProviderError::Empty { provider: PROVIDER });
        }

        let levels = parse_predictions(&body.predictions)?;
        if levels.is_empty() {
            return Err(ProviderError::Empty { provider: PROVIDER });
        }
        Ok(levels)
    }
}

fn parse_predictions(records: &[PredictionRecord]) -> Result<Vec<TideLevel>, ProviderError> {
    records
        .iter()
        .map(|record| {
            let time = NaiveDateTime::parse_from_str(&record.t, "%Y-%m-%d %H:%M")
                .map_err(|e| ProviderError::Parse {
                    provider: PROVIDER,
                    message: format!("bad time '{}': {}", record.t, e),
                })?
                .and_utc();
            let level = record.v.trim().parse::<f64>().map_err(|e| ProviderError::Parse {
                provider: PROVIDER,
                message: format!("bad level '{}': {}", record.v, e),
            })?;
            Ok(TideLevel {
                time,
                level,
                unit: UnitSystem::Imperial,
            })
        })
        .collect()
}

/// Closest station by plain Euclidean distance in (latitude, longitude).
/// Ties keep the earliest station in the list.
pub fn nearest_station(
    stations: &[TideStation],
    latitude: f64,
    longitude: f64,
) -> Option<&TideStation> {
    stations.iter().min_by(|a, b| {
        let da = (a.latitude - latitude).powi(2) + (a.longitude - longitude).powi(2);
        let db = (b.latitude - latitude).powi(2) + (b.longitude - longitude).powi(2);
        da.total_cmp(&db)
    })
}
