use sqlx::{PgConnection, PgPool};

use super::models::{ForecastRow, NewSpot, Spot, SpotUpdate};

const SPOT_COLUMNS: &str = "id, name, latitude, longitude, description, location, difficulty,
                created_at, updated_at";

const FORECAST_COLUMNS: &str = "id, spot_id, timestamp, horizon_hours, wave_height, tide,
                tide_station_id, tide_station_name, wind_speed, wind_direction,
                swell_components, hourly, data_gaps, created_at";

/// List spots, optionally restricted to one location.
pub async fn list_spots(pool: &PgPool, location: Option<&str>) -> Result<Vec<Spot>, sqlx::Error> {
    sqlx::query_as::<_, Spot>(&format!(
        "SELECT {} FROM spots
         WHERE ($1::TEXT IS NULL OR location = $1)
         ORDER BY name",
        SPOT_COLUMNS
    ))
    .bind(location)
    .fetch_all(pool)
    .await
}

/// Get a single spot by ID.
pub async fn get_spot(pool: &PgPool, id: i64) -> Result<Option<Spot>, sqlx::Error> {
    sqlx::query_as::<_, Spot>(&format!("SELECT {} FROM spots WHERE id = $1", SPOT_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_spot(pool: &PgPool, spot: &NewSpot) -> Result<Spot, sqlx::Error> {
    sqlx::query_as::<_, Spot>(&format!(
        "INSERT INTO spots (name, latitude, longitude, description, location, difficulty)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {}",
        SPOT_COLUMNS
    ))
    .bind(spot.name.trim())
    .bind(spot.latitude)
    .bind(spot.longitude)
    .bind(&spot.description)
    .bind(&spot.location)
    .bind(&spot.difficulty)
    .fetch_one(pool)
    .await
}

/// Overwrite the fields present in `update` and stamp `updated_at`.
/// Returns `None` for an unknown spot.
pub async fn update_spot(
    pool: &PgPool,
    id: i64,
    update: &SpotUpdate,
) -> Result<Option<Spot>, sqlx::Error> {
    sqlx::query_as::<_, Spot>(&format!(
        "UPDATE spots SET
            name        = COALESCE($2, name),
            latitude    = COALESCE($3, latitude),
            longitude   = COALESCE($4, longitude),
            description = COALESCE($5, description),
            location    = COALESCE($6, location),
            difficulty  = COALESCE($7, difficulty),
            updated_at  = NOW()
         WHERE id = $1
         RETURNING {}",
        SPOT_COLUMNS
    ))
    .bind(id)
    .bind(update.name.as_deref().map(str::trim))
    .bind(update.latitude)
    .bind(update.longitude)
    .bind(&update.description)
    .bind(&update.location)
    .bind(&update.difficulty)
    .fetch_optional(pool)
    .await
}

/// Delete a spot; its stored forecast goes with it (ON DELETE CASCADE).
/// Returns false if no such spot existed.
pub async fn delete_spot(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM spots WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Newest stored forecast for a spot, regardless of age.
pub async fn latest_forecast(
    pool: &PgPool,
    spot_id: i64,
) -> Result<Option<ForecastRow>, sqlx::Error> {
    sqlx::query_as::<_, ForecastRow>(&format!(
        "SELECT {} FROM spot_forecasts
         WHERE spot_id = $1
         ORDER BY timestamp DESC
         LIMIT 1",
        FORECAST_COLUMNS
    ))
    .bind(spot_id)
    .fetch_optional(pool)
    .await
}

/// Serialise forecast writers for one spot until the enclosing transaction ends.
pub async fn lock_spot_forecasts(conn: &mut PgConnection, spot_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(spot_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Delete every stored forecast for a spot. Returns the number of rows removed.
pub async fn delete_forecasts_for_spot(
    conn: &mut PgConnection,
    spot_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM spot_forecasts WHERE spot_id = $1")
        .bind(spot_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

/// Insert a forecast row and return it as stored.
pub async fn insert_forecast(
    conn: &mut PgConnection,
    row: &ForecastRow,
) -> Result<ForecastRow, sqlx::Error> {
    sqlx::query_as::<_, ForecastRow>(&format!(
        "INSERT INTO spot_forecasts (
            id, spot_id, timestamp, horizon_hours, wave_height, tide,
            tide_station_id, tide_station_name, wind_speed, wind_direction,
            swell_components, hourly, data_gaps
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
         RETURNING {}",
        FORECAST_COLUMNS
    ))
    .bind(row.id)
    .bind(row.spot_id)
    .bind(row.timestamp)
    .bind(row.horizon_hours)
    .bind(row.wave_height)
    .bind(row.tide)
    .bind(&row.tide_station_id)
    .bind(&row.tide_station_name)
    .bind(row.wind_speed)
    .bind(row.wind_direction)
    .bind(&row.swell_components)
    .bind(&row.hourly)
    .bind(&row.data_gaps)
    .fetch_one(conn)
    .await
}
