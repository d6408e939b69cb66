use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::helpers::{dec_to_f64, f64_to_decimal_1dp, opt_dec_to_f64, opt_f64_to_decimal_1dp};
use crate::services::pipeline::{DataGap, Forecast, HourlyConditions, SwellComponents};

/// A surf spot. Coordinates are WGS84 degrees.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, ToSchema)]
pub struct Spot {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    /// Region the spot belongs to, e.g. "San Luis Obispo County"
    pub location: Option<String>,
    pub difficulty: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Body of `POST /api/v1/spots`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewSpot {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    pub location: Option<String>,
    pub difficulty: Option<String>,
}

impl NewSpot {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Spot name must not be empty".to_string());
        }
        check_coordinates(Some(self.latitude), Some(self.longitude))
    }
}

/// Body of `PATCH /api/v1/spots/:id`. Absent fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SpotUpdate {
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub difficulty: Option<String>,
}

impl SpotUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.description.is_none()
            && self.location.is_none()
            && self.difficulty.is_none()
    }

    pub fn validate(&self) -> Result<(), String> {
        if matches!(&self.name, Some(name) if name.trim().is_empty()) {
            return Err("Spot name must not be empty".to_string());
        }
        check_coordinates(self.latitude, self.longitude)
    }
}

fn check_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Result<(), String> {
    if let Some(lat) = latitude {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(format!("Latitude {} is outside [-90, 90]", lat));
        }
    }
    if let Some(lon) = longitude {
        if !(-180.0..=180.0).contains(&lon) {
            return Err(format!("Longitude {} is outside [-180, 180]", lon));
        }
    }
    Ok(())
}

/// Row of `spot_forecasts`. Measurements are NUMERIC(6,1).
#[derive(Debug, Clone, FromRow)]
pub struct ForecastRow {
    pub id: Uuid,
    pub spot_id: i64,
    pub timestamp: DateTime<Utc>,
    pub horizon_hours: i32,
    pub wave_height: Decimal,
    pub tide: Option<Decimal>,
    pub tide_station_id: Option<String>,
    pub tide_station_name: Option<String>,
    pub wind_speed: Option<Decimal>,
    pub wind_direction: Option<Decimal>,
    pub swell_components: Json<SwellComponents>,
    pub hourly: Json<Vec<HourlyConditions>>,
    pub data_gaps: Json<Vec<DataGap>>,
    #[allow(dead_code)] // Populated by FromRow; not part of the API shape
    pub created_at: DateTime<Utc>,
}

impl From<&Forecast> for ForecastRow {
    fn from(f: &Forecast) -> Self {
        Self {
            id: f.id,
            spot_id: f.spot_id,
            timestamp: f.timestamp,
            horizon_hours: f.horizon_hours,
            wave_height: f64_to_decimal_1dp(f.wave_height),
            tide: opt_f64_to_decimal_1dp(f.tide),
            tide_station_id: f.tide_station_id.clone(),
            tide_station_name: f.tide_station_name.clone(),
            wind_speed: opt_f64_to_decimal_1dp(f.wind_speed),
            wind_direction: opt_f64_to_decimal_1dp(f.wind_direction),
            swell_components: Json(f.swell_components.clone()),
            hourly: Json(f.hourly.clone()),
            data_gaps: Json(f.data_gaps.clone()),
            created_at: f.timestamp,
        }
    }
}

impl From<ForecastRow> for Forecast {
    fn from(row: ForecastRow) -> Self {
        Self {
            id: row.id,
            spot_id: row.spot_id,
            timestamp: row.timestamp,
            horizon_hours: row.horizon_hours,
            wave_height: dec_to_f64(row.wave_height),
            tide: opt_dec_to_f64(row.tide),
            tide_station_id: row.tide_station_id,
            tide_station_name: row.tide_station_name,
            wind_speed: opt_dec_to_f64(row.wind_speed),
            wind_direction: opt_dec_to_f64(row.wind_direction),
            swell_components: row.swell_components.0,
            hourly: row.hourly.0,
            data_gaps: row.data_gaps.0,
        }
    }
}
