//! Forecast cache.
//!
//! Decides whether a spot's stored forecast can be served or has to be
//! refetched, and writes fresh results back through the store. Freshness is
//! a fixed window on the fetch timestamp plus a horizon check: a row fetched
//! for 24 h does not answer a 72 h request.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::db::models::Spot;
use crate::db::store::{ForecastStore, SpotRepository};
use crate::errors::ForecastError;
use crate::services::pipeline::{Forecast, ForecastHorizon, ForecastPipeline};

#[derive(Debug, Clone, Copy)]
pub struct CacheSettings {
    /// Rows younger than this are served without calling providers
    pub window: Duration,
    /// Horizon used when the caller does not ask for one
    pub horizon: ForecastHorizon,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            window: Duration::hours(6),
            horizon: ForecastHorizon::Current,
        }
    }
}

/// Where a returned forecast came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Served from storage, within the cache window
    Hit,
    /// Fetched from providers and stored
    Refreshed,
    /// Providers failed; the last stored row was served instead
    Stale,
}

#[derive(Debug, Clone)]
pub struct ResolvedForecast {
    pub forecast: Forecast,
    pub status: CacheStatus,
}

impl ResolvedForecast {
    pub fn is_stale(&self) -> bool {
        self.status == CacheStatus::Stale
    }
}

pub struct ForecastCache {
    spots: Arc<dyn SpotRepository>,
    store: Arc<dyn ForecastStore>,
    pipeline: Arc<ForecastPipeline>,
    settings: CacheSettings,
}

impl ForecastCache {
    pub fn new(
        spots: Arc<dyn SpotRepository>,
        store: Arc<dyn ForecastStore>,
        pipeline: Arc<ForecastPipeline>,
        settings: CacheSettings,
    ) -> Self {
        Self {
            spots,
            store,
            pipeline,
            settings,
        }
    }

    pub fn spots(&self) -> &Arc<dyn SpotRepository> {
        &self.spots
    }

    /// Resolve a spot's forecast at the configured default horizon.
    pub async fn get_forecast(
        &self,
        spot_id: i64,
        force_refresh: bool,
    ) -> Result<ResolvedForecast, ForecastError> {
        self.get_forecast_with_horizon(spot_id, force_refresh, self.settings.horizon)
            .await
    }

    /// Resolve a spot's forecast covering at least `horizon`.
    ///
    /// 1. Unknown spot → `SpotNotFound`
    /// 2. Not forced and a fresh row covers the horizon → that row
    /// 3. Otherwise fetch, replace the stored row, return the new one. The
    ///    fetch never narrows the horizon of the row it replaces.
    /// 4. Fetch failed on a read (not forced) with a row on file → that row,
    ///    flagged stale. Forced refreshes always propagate the error.
    pub async fn get_forecast_with_horizon(
        &self,
        spot_id: i64,
        force_refresh: bool,
        horizon: ForecastHorizon,
    ) -> Result<ResolvedForecast, ForecastError> {
        let spot = self
            .spots
            .get_spot(spot_id)
            .await?
            .ok_or(ForecastError::SpotNotFound(spot_id))?;

        let cached = self.store.latest_forecast(spot_id).await?;

        let mut fetch_horizon = horizon.max(self.settings.horizon);
        if let Some(ref forecast) = cached {
            if !force_refresh && self.is_fresh(forecast, Utc::now()) && forecast.covers(horizon) {
                tracing::info!("Cache hit for spot {} ({})", spot.id, spot.name);
                return Ok(ResolvedForecast {
                    forecast: forecast.clone(),
                    status: CacheStatus::Hit,
                });
            }
            fetch_horizon = fetch_horizon.max(forecast.horizon());
        }

        tracing::info!(
            "Cache miss for spot {} ({}), fetching {} forecast{}",
            spot.id,
            spot.name,
            fetch_horizon.as_str(),
            if force_refresh { " (forced)" } else { "" }
        );

        match self.refresh(&spot, fetch_horizon).await {
            Ok(forecast) => Ok(ResolvedForecast {
                forecast,
                status: CacheStatus::Refreshed,
            }),
            Err(e @ ForecastError::Storage(_)) => Err(e),
            Err(e) if force_refresh => Err(e),
            Err(e) => match cached {
                Some(forecast) => {
                    tracing::warn!(
                        "Fetch failed for spot {}, serving stale forecast from {}: {}",
                        spot.id,
                        forecast.timestamp,
                        e
                    );
                    Ok(ResolvedForecast {
                        forecast,
                        status: CacheStatus::Stale,
                    })
                }
                None => Err(e),
            },
        }
    }

    async fn refresh(
        &self,
        spot: &Spot,
        horizon: ForecastHorizon,
    ) -> Result<Forecast, ForecastError> {
        let forecast = self.pipeline.fetch_forecast(spot, horizon).await?;
        Ok(self.store.replace_forecast(&forecast).await?)
    }

    fn is_fresh(&self, forecast: &Forecast, now: DateTime<Utc>) -> bool {
        forecast.timestamp > now - self.settings.window
    }
}
