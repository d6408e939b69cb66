//! Open-Meteo Marine API client.
//!
//! Hourly wave model output (combined sea state plus up to three swell
//! trains), reported in metres and degrees.
//! See: https://open-meteo.com/en/docs/marine-weather-api

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

use crate::services::conditions::{EnvironmentalSample, Swell};
use crate::services::providers::{
    ensure_success, http_client, ProviderError, WaveModelProvider,
};
use crate::services::units::UnitSystem;

pub const DEFAULT_MARINE_API_URL: &str = "https://marine-api.open-meteo.com/v1/marine";

const PROVIDER: &str = "open-meteo marine";

const HOURLY_VARIABLES: &str = "wave_height,wave_period,wave_direction,\
swell_wave_height,swell_wave_period,swell_wave_direction,\
secondary_swell_wave_height,secondary_swell_wave_period,secondary_swell_wave_direction,\
tertiary_swell_wave_height,tertiary_swell_wave_period,tertiary_swell_wave_direction";

#[derive(Debug, Clone)]
pub struct MarineClient {
    client: reqwest::Client,
    base_url: String,
}

// --- Open-Meteo JSON response types ---

#[derive(Debug, Deserialize)]
struct MarineResponse {
    hourly: Option<MarineHourly>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MarineHourly {
    time: Vec<String>,
    wave_height: Vec<Option<f64>>,
    wave_period: Vec<Option<f64>>,
    wave_direction: Vec<Option<f64>>,
    swell_wave_height: Vec<Option<f64>>,
    swell_wave_period: Vec<Option<f64>>,
    swell_wave_direction: Vec<Option<f64>>,
    secondary_swell_wave_height: Vec<Option<f64>>,
    secondary_swell_wave_period: Vec<Option<f64>>,
    secondary_swell_wave_direction: Vec<Option<f64>>,
    tertiary_swell_wave_height: Vec<Option<f64>>,
    tertiary_swell_wave_period: Vec<Option<f64>>,
    tertiary_swell_wave_direction: Vec<Option<f64>>,
}

fn at(series: &[Option<f64>], index: usize) -> Option<f64> {
    series.get(index).copied().flatten()
}

fn swell_at(
    heights: &[Option<f64>],
    periods: &[Option<f64>],
    directions: &[Option<f64>],
    index: usize,
) -> Option<Swell> {
    Some(Swell {
        height: at(heights, index)?,
        period: at(periods, index)?,
        direction: at(directions, index)?,
    })
}

/// Open-Meteo hourly timestamps look like "2026-03-01T07:00" (GMT requested).
fn parse_hour(time: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M")
        .ok()
        .map(|naive| naive.and_utc())
}

impl MarineClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl WaveModelProvider for MarineClient {
    async fn fetch_wave_samples(
        &self,
        latitude: f64,
        longitude: f64,
        start_hour: u32,
        end_hour: u32,
    ) -> Result<Vec<EnvironmentalSample>, ProviderError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", format!("{:.4}", latitude)),
                ("longitude", format!("{:.4}", longitude)),
                ("hourly", HOURLY_VARIABLES.to_string()),
                ("forecast_hours", end_hour.to_string()),
                ("timezone", "GMT".to_string()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        let body: MarineResponse = ensure_success(PROVIDER, response)?
            .json()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        let samples = parse_marine_hourly(body.hourly.unwrap_or_default(), start_hour as usize);
        if samples.is_empty() {
            return Err(ProviderError::Empty { provider: PROVIDER });
        }

        tracing::debug!(
            "Marine model: {} hourly samples for ({:.4}, {:.4})",
            samples.len(),
            latitude,
            longitude
        );
        Ok(samples)
    }
}

/// Convert the columnar hourly block into samples, skipping the first
/// `skip` hours. Hours with neither a sea-state summary nor any swell train
/// are dropped.
fn parse_marine_hourly(hourly: MarineHourly, skip: usize) -> Vec<EnvironmentalSample> {
    let mut samples = Vec::with_capacity(hourly.time.len().saturating_sub(skip));

    for (i, time) in hourly.time.iter().enumerate().skip(skip) {
        let Some(time) = parse_hour(time) else {
            tracing::warn!("Skipping marine hour with unparseable time '{}'", time);
            continue;
        };

        let mut sample = EnvironmentalSample::new(time, UnitSystem::Metric);
        sample.wave_summary = swell_at(
            &hourly.wave_height,
            &hourly.wave_period,
            &hourly.wave_direction,
            i,
        );
        sample.swell_components = [
            swell_at(
                &hourly.swell_wave_height,
                &hourly.swell_wave_period,
                &hourly.swell_wave_direction,
                i,
            ),
            swell_at(
                &hourly.secondary_swell_wave_height,
                &hourly.secondary_swell_wave_period,
                &hourly.secondary_swell_wave_direction,
                i,
            ),
            swell_at(
                &hourly.tertiary_swell_wave_height,
                &hourly.tertiary_swell_wave_period,
                &hourly.tertiary_swell_wave_direction,
                i,
            ),
        ]
        .into_iter()
        .flatten()
        .collect();

        if sample.wave_summary.is_none() && sample.swell_components.is_empty() {
            continue;
        }
        samples.push(sample);
    }

    samples
}
