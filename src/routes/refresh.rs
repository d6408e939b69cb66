//! Batch refresh endpoints.
//!
//! - POST /api/v1/forecasts/refresh: start a batch over all spots
//! - GET /api/v1/forecasts/refresh: current driver state

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

use crate::errors::{AppError, ErrorResponse};
use crate::services::refresh::{RefreshDriver, RefreshState};

/// Start refreshing every spot's forecast in the background.
///
/// Returns immediately; poll the GET endpoint for the result.
#[utoipa::path(
    post,
    path = "/api/v1/forecasts/refresh",
    tag = "Refresh",
    responses(
        (status = 202, description = "Batch started", body = RefreshState),
        (status = 409, description = "A batch is already running", body = ErrorResponse),
    )
)]
pub async fn trigger_refresh(
    State(driver): State<Arc<RefreshDriver>>,
) -> Result<(StatusCode, Json<RefreshState>), AppError> {
    if !driver.trigger().await {
        return Err(AppError::Conflict(
            "A forecast refresh is already running".to_string(),
        ));
    }
    tracing::info!("Forecast refresh triggered via API");
    Ok((StatusCode::ACCEPTED, Json(driver.snapshot().await)))
}

/// Get the refresh driver state, including the last batch result.
#[utoipa::path(
    get,
    path = "/api/v1/forecasts/refresh",
    tag = "Refresh",
    responses(
        (status = 200, description = "Current refresh state", body = RefreshState),
    )
)]
pub async fn get_refresh_status(State(driver): State<Arc<RefreshDriver>>) -> Json<RefreshState> {
    Json(driver.snapshot().await)
}
