use axum::extract::State;
use axum::Json;
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok" when healthy, "degraded" when the database is unreachable
    pub status: String,
    pub version: String,
    pub database: bool,
}

impl HealthResponse {
    fn new(database: bool) -> Self {
        Self {
            status: if database { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database,
        }
    }
}

/// Health check endpoint.
///
/// Always 200; a failed `SELECT 1` reports "degraded" so load balancers can
/// tell a database outage from a dead process. Upstream providers are not
/// checked.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    )
)]
pub async fn health_check(State(pool): State<PgPool>) -> Json<HealthResponse> {
    let db_ok = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&pool)
        .await
        .is_ok();

    Json(HealthResponse::new(db_ok))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_follows_database() {
        let healthy = HealthResponse::new(true);
        assert_eq!(healthy.status, "ok");
        assert!(healthy.database);

        let degraded = HealthResponse::new(false);
        assert_eq!(degraded.status, "degraded");
        assert!(!degraded.database);
        assert_eq!(degraded.version, env!("CARGO_PKG_VERSION"));
    }
}
