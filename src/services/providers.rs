//! Environmental data provider interfaces.
//!
//! The pipeline only talks to these traits; the concrete HTTP clients live in
//! `marine`, `yr` and `tides`, and tests swap in scripted doubles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

use crate::services::conditions::EnvironmentalSample;
use crate::services::units::UnitSystem;

/// Failure of a single upstream call.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} request failed: {message}")]
    Request {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} returned HTTP {status}")]
    Status { provider: &'static str, status: u16 },

    #[error("{provider} response could not be parsed: {message}")]
    Parse {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} timed out")]
    Timeout { provider: &'static str },

    #[error("{provider} returned no data")]
    Empty { provider: &'static str },
}

impl ProviderError {
    /// Classify a reqwest failure, keeping timeouts distinguishable.
    pub fn from_reqwest(provider: &'static str, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout { provider }
        } else if e.is_decode() {
            ProviderError::Parse {
                provider,
                message: e.to_string(),
            }
        } else {
            ProviderError::Request {
                provider,
                message: e.to_string(),
            }
        }
    }
}

/// A station publishing tide predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TideStation {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// One predicted water level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TideLevel {
    pub time: DateTime<Utc>,
    pub level: f64,
    pub unit: UnitSystem,
}

#[async_trait]
pub trait WaveModelProvider: Send + Sync {
    /// Hourly wave samples for `[start_hour, end_hour)` hours from now,
    /// soonest first.
    async fn fetch_wave_samples(
        &self,
        latitude: f64,
        longitude: f64,
        start_hour: u32,
        end_hour: u32,
    ) -> Result<Vec<EnvironmentalSample>, ProviderError>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Wind and air temperature samples, soonest first.
    async fn fetch_hourly_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<EnvironmentalSample>, ProviderError>;
}

#[async_trait]
pub trait TideStationProvider: Send + Sync {
    async fn list_stations(&self) -> Result<Vec<TideStation>, ProviderError>;

    async fn fetch_tide_levels(
        &self,
        station_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TideLevel>, ProviderError>;
}

/// Shared reqwest client for upstream calls. Every request is bounded by
/// `timeout`.
pub fn http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("Failed to build HTTP client")
}

/// Check the status of an upstream response before reading its body.
pub(crate) fn ensure_success(
    provider: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(ProviderError::Status {
            provider,
            status: response.status().as_u16(),
        })
    }
}
