//! Forecast HTTP endpoints.
//!
//! - GET /api/v1/spots/:id/forecast?refresh=bool&horizon=current|extended
//! - GET /api/v1/spots/:id/forecast/daily

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::errors::{AppError, ErrorResponse};
use crate::services::forecast::{CacheStatus, ForecastCache, ResolvedForecast};
use crate::services::pipeline::{Forecast, ForecastHorizon};
use crate::services::summary::{daily_summaries, ForecastDay};

pub(crate) const STALE_HEADER: &str = "X-Forecast-Stale";

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ForecastQuery {
    /// Skip the cache and fetch from the providers
    #[serde(default)]
    pub refresh: bool,
    /// "current" (24 h) or "extended" (72 h); defaults to the server setting
    pub horizon: Option<String>,
}

/// A spot forecast plus where it came from.
#[derive(Debug, Serialize, ToSchema)]
pub struct ForecastResponse {
    #[serde(flatten)]
    pub forecast: Forecast,
    /// "hit", "refreshed" or "stale"
    pub cache_status: CacheStatus,
    /// Whether this forecast is stale (providers were unreachable, serving stored data)
    pub stale: bool,
}

/// Per-day summaries of a spot's stored forecast.
#[derive(Debug, Serialize, ToSchema)]
pub struct DailyForecastResponse {
    pub spot_id: i64,
    /// When the underlying forecast was fetched
    pub fetched_at: DateTime<Utc>,
    pub stale: bool,
    pub days: Vec<ForecastDay>,
}

fn parse_horizon(raw: Option<&str>) -> Result<Option<ForecastHorizon>, AppError> {
    raw.map(|h| h.parse::<ForecastHorizon>())
        .transpose()
        .map_err(AppError::BadRequest)
}

fn stale_headers(resolved: &ResolvedForecast) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if resolved.is_stale() {
        headers.insert(STALE_HEADER, HeaderValue::from_static("true"));
    }
    headers
}

/// Get the forecast for a spot.
///
/// Serves the stored forecast while it is inside the cache window and covers
/// the requested horizon, otherwise fetches a new one. If the providers fail
/// and an older forecast is stored, that one is returned with the
/// `X-Forecast-Stale: true` header.
#[utoipa::path(
    get,
    path = "/api/v1/spots/{id}/forecast",
    tag = "Forecasts",
    params(
        ("id" = i64, Path, description = "Spot id"),
        ForecastQuery,
    ),
    responses(
        (status = 200, description = "Forecast for the spot", body = ForecastResponse,
         headers(
             ("X-Forecast-Stale" = String, description = "Set to 'true' when serving stored data because the providers are unreachable")
         )),
        (status = 400, description = "Invalid horizon", body = ErrorResponse),
        (status = 404, description = "Spot not found", body = ErrorResponse),
        (status = 502, description = "Wave model unavailable and nothing stored", body = ErrorResponse),
    )
)]
pub async fn get_spot_forecast(
    State(cache): State<Arc<ForecastCache>>,
    Path(id): Path<i64>,
    Query(params): Query<ForecastQuery>,
) -> Result<(HeaderMap, Json<ForecastResponse>), AppError> {
    let resolved = match parse_horizon(params.horizon.as_deref())? {
        Some(horizon) => {
            cache
                .get_forecast_with_horizon(id, params.refresh, horizon)
                .await?
        }
        None => cache.get_forecast(id, params.refresh).await?,
    };

    let headers = stale_headers(&resolved);
    let response = ForecastResponse {
        stale: resolved.is_stale(),
        cache_status: resolved.status,
        forecast: resolved.forecast,
    };
    Ok((headers, Json(response)))
}

/// Get a multi-day summary for a spot.
///
/// Uses the extended horizon so the summary spans several days.
#[utoipa::path(
    get,
    path = "/api/v1/spots/{id}/forecast/daily",
    tag = "Forecasts",
    params(
        ("id" = i64, Path, description = "Spot id"),
    ),
    responses(
        (status = 200, description = "One entry per UTC day", body = DailyForecastResponse,
         headers(
             ("X-Forecast-Stale" = String, description = "Set to 'true' when serving stored data because the providers are unreachable")
         )),
        (status = 404, description = "Spot not found", body = ErrorResponse),
        (status = 502, description = "Wave model unavailable and nothing stored", body = ErrorResponse),
    )
)]
pub async fn get_daily_forecast(
    State(cache): State<Arc<ForecastCache>>,
    Path(id): Path<i64>,
) -> Result<(HeaderMap, Json<DailyForecastResponse>), AppError> {
    let resolved = cache
        .get_forecast_with_horizon(id, false, ForecastHorizon::Extended)
        .await?;

    let headers = stale_headers(&resolved);
    let response = DailyForecastResponse {
        spot_id: resolved.forecast.spot_id,
        fetched_at: resolved.forecast.timestamp,
        stale: resolved.is_stale(),
        days: daily_summaries(&resolved.forecast.hourly),
    };
    Ok((headers, Json(response)))
}
