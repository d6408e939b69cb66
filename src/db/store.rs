//! Storage seams used by the forecast cache and the batch refresh, plus the
//! Postgres implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use super::models::{ForecastRow, NewSpot, Spot, SpotUpdate};
use super::queries;
use crate::services::pipeline::Forecast;

#[async_trait]
pub trait SpotRepository: Send + Sync {
    /// Spots ordered by name, optionally restricted to one location.
    async fn list_spots(&self, location: Option<&str>) -> Result<Vec<Spot>, sqlx::Error>;

    async fn get_spot(&self, id: i64) -> Result<Option<Spot>, sqlx::Error>;

    async fn create_spot(&self, spot: &NewSpot) -> Result<Spot, sqlx::Error>;

    /// `None` for an unknown spot.
    async fn update_spot(
        &self,
        id: i64,
        update: &SpotUpdate,
    ) -> Result<Option<Spot>, sqlx::Error>;

    /// False for an unknown spot.
    async fn delete_spot(&self, id: i64) -> Result<bool, sqlx::Error>;
}

#[async_trait]
pub trait ForecastStore: Send + Sync {
    /// Newest stored forecast for the spot, however old.
    async fn latest_forecast(&self, spot_id: i64) -> Result<Option<Forecast>, sqlx::Error>;

    /// Atomically swap the spot's stored forecast for `forecast`. Afterwards
    /// exactly one row exists for the spot. Returns the row as stored.
    async fn replace_forecast(&self, forecast: &Forecast) -> Result<Forecast, sqlx::Error>;
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SpotRepository for PgStore {
    async fn list_spots(&self, location: Option<&str>) -> Result<Vec<Spot>, sqlx::Error> {
        queries::list_spots(&self.pool, location).await
    }

    async fn get_spot(&self, id: i64) -> Result<Option<Spot>, sqlx::Error> {
        queries::get_spot(&self.pool, id).await
    }

    async fn create_spot(&self, spot: &NewSpot) -> Result<Spot, sqlx::Error> {
        let created = queries::insert_spot(&self.pool, spot).await?;
        tracing::info!("Created spot {} ({})", created.id, created.name);
        Ok(created)
    }

    async fn update_spot(
        &self,
        id: i64,
        update: &SpotUpdate,
    ) -> Result<Option<Spot>, sqlx::Error> {
        queries::update_spot(&self.pool, id, update).await
    }

    async fn delete_spot(&self, id: i64) -> Result<bool, sqlx::Error> {
        let deleted = queries::delete_spot(&self.pool, id).await?;
        if deleted {
            tracing::info!("Deleted spot {} and its stored forecast", id);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl ForecastStore for PgStore {
    async fn latest_forecast(&self, spot_id: i64) -> Result<Option<Forecast>, sqlx::Error> {
        Ok(queries::latest_forecast(&self.pool, spot_id)
            .await?
            .map(Forecast::from))
    }

    async fn replace_forecast(&self, forecast: &Forecast) -> Result<Forecast, sqlx::Error> {
        let row = ForecastRow::from(forecast);

        // Concurrent refreshes of the same spot queue on the advisory lock
        let mut tx = self.pool.begin().await?;
        queries::lock_spot_forecasts(&mut tx, forecast.spot_id).await?;
        let removed = queries::delete_forecasts_for_spot(&mut tx, forecast.spot_id).await?;
        let stored = queries::insert_forecast(&mut tx, &row).await?;
        tx.commit().await?;

        tracing::debug!(
            "Replaced forecast for spot {} ({} previous row(s))",
            forecast.spot_id,
            removed
        );
        Ok(Forecast::from(stored))
    }
}
