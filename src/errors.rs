use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Standard error response body.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

/// Failures of the forecast pipeline, cache and batch refresh.
#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error("Spot {0} not found")]
    SpotNotFound(i64),

    /// The wave model returned nothing (empty result or timeout).
    #[error("No wave data available for {0}")]
    WaveDataUnavailable(String),

    #[error("Unexpected provider failure: {0}")]
    UnexpectedProvider(String),

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::ExternalServiceError(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
            AppError::DatabaseError(err) => {
                tracing::error!("Database error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal database error".to_string(),
                )
            }
        };

        (status, axum::Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ForecastError> for AppError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::SpotNotFound(id) => AppError::NotFound(format!("Spot {} not found", id)),
            ForecastError::WaveDataUnavailable(_) | ForecastError::UnexpectedProvider(_) => {
                AppError::ExternalServiceError(err.to_string())
            }
            ForecastError::Storage(e) => AppError::DatabaseError(e),
        }
    }
}
