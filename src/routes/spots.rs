//! Spot catalogue endpoints.
//!
//! - GET    /api/v1/spots?location=...
//! - POST   /api/v1/spots
//! - GET    /api/v1/spots/:id
//! - PATCH  /api/v1/spots/:id
//! - DELETE /api/v1/spots/:id

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

use crate::db::models::{NewSpot, Spot, SpotUpdate};
use crate::db::store::SpotRepository;
use crate::errors::{AppError, ErrorResponse};

pub type SpotState = Arc<dyn SpotRepository>;

#[derive(Debug, Deserialize, IntoParams)]
pub struct SpotQuery {
    /// Only spots in this location (exact match, e.g. "San Luis Obispo County")
    pub location: Option<String>,
}

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Spot {} not found", id))
}

/// List surf spots, optionally filtered by location.
#[utoipa::path(
    get,
    path = "/api/v1/spots",
    tag = "Spots",
    params(SpotQuery),
    responses(
        (status = 200, description = "Spots ordered by name", body = Vec<Spot>),
    )
)]
pub async fn list_spots(
    State(spots): State<SpotState>,
    Query(params): Query<SpotQuery>,
) -> Result<Json<Vec<Spot>>, AppError> {
    let location = params.location.as_deref().filter(|l| !l.trim().is_empty());
    Ok(Json(spots.list_spots(location).await?))
}

/// Get a single spot.
#[utoipa::path(
    get,
    path = "/api/v1/spots/{id}",
    tag = "Spots",
    params(
        ("id" = i64, Path, description = "Spot id"),
    ),
    responses(
        (status = 200, description = "The spot", body = Spot),
        (status = 404, description = "Spot not found", body = ErrorResponse),
    )
)]
pub async fn get_spot(
    State(spots): State<SpotState>,
    Path(id): Path<i64>,
) -> Result<Json<Spot>, AppError> {
    let spot = spots.get_spot(id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(spot))
}

/// Add a spot to the catalogue.
#[utoipa::path(
    post,
    path = "/api/v1/spots",
    tag = "Spots",
    request_body = NewSpot,
    responses(
        (status = 201, description = "Spot created", body = Spot),
        (status = 400, description = "Empty name or coordinates out of range", body = ErrorResponse),
    )
)]
pub async fn create_spot(
    State(spots): State<SpotState>,
    Json(body): Json<NewSpot>,
) -> Result<(StatusCode, Json<Spot>), AppError> {
    body.validate().map_err(AppError::BadRequest)?;
    let spot = spots.create_spot(&body).await?;
    Ok((StatusCode::CREATED, Json(spot)))
}

/// Change some fields of a spot.
///
/// An empty body returns the spot unchanged and leaves `updated_at` alone.
#[utoipa::path(
    patch,
    path = "/api/v1/spots/{id}",
    tag = "Spots",
    params(
        ("id" = i64, Path, description = "Spot id"),
    ),
    request_body = SpotUpdate,
    responses(
        (status = 200, description = "The updated spot", body = Spot),
        (status = 400, description = "Empty name or coordinates out of range", body = ErrorResponse),
        (status = 404, description = "Spot not found", body = ErrorResponse),
    )
)]
pub async fn update_spot(
    State(spots): State<SpotState>,
    Path(id): Path<i64>,
    Json(body): Json<SpotUpdate>,
) -> Result<Json<Spot>, AppError> {
    body.validate().map_err(AppError::BadRequest)?;
    let spot = if body.is_empty() {
        spots.get_spot(id).await?
    } else {
        spots.update_spot(id, &body).await?
    };
    Ok(Json(spot.ok_or_else(|| not_found(id))?))
}

/// Remove a spot together with its stored forecast.
#[utoipa::path(
    delete,
    path = "/api/v1/spots/{id}",
    tag = "Spots",
    params(
        ("id" = i64, Path, description = "Spot id"),
    ),
    responses(
        (status = 204, description = "Spot deleted"),
        (status = 404, description = "Spot not found", body = ErrorResponse),
    )
)]
pub async fn delete_spot(
    State(spots): State<SpotState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    if !spots.delete_spot(id).await? {
        return Err(not_found(id));
    }
    Ok(StatusCode::NO_CONTENT)
}
