use std::time::Duration;

use crate::services::forecast::CacheSettings;
use crate::services::marine::DEFAULT_MARINE_API_URL;
use crate::services::pipeline::ForecastHorizon;
use crate::services::tides::{DEFAULT_TIDE_DATA_URL, DEFAULT_TIDE_STATIONS_URL};
use crate::services::yr::DEFAULT_YR_API_URL;

/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    /// yr.no rejects requests without an identifying User-Agent.
    pub weather_user_agent: String,
    /// Stored forecasts younger than this are served without refetching.
    pub forecast_cache_hours: i64,
    pub forecast_horizon: ForecastHorizon,
    pub provider_timeout_secs: u64,
    /// Batch refresh interval; 0 disables the scheduler.
    pub refresh_interval_minutes: u64,
    pub marine_api_url: String,
    pub yr_api_url: String,
    pub tide_stations_url: String,
    pub tide_data_url: String,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: var_or("PORT", "8080")
                .parse()
                .expect("PORT must be a valid u16"),
            weather_user_agent: var_or(
                "WEATHER_USER_AGENT",
                "SurfForecastApi/0.1 github.com/surf-forecast/surf-forecast-api",
            ),
            forecast_cache_hours: var_or("FORECAST_CACHE_HOURS", "6")
                .parse()
                .expect("FORECAST_CACHE_HOURS must be a whole number of hours"),
            forecast_horizon: var_or("FORECAST_HORIZON", "current")
                .parse()
                .expect("FORECAST_HORIZON must be 'current' or 'extended'"),
            provider_timeout_secs: var_or("PROVIDER_TIMEOUT_SECS", "20")
                .parse()
                .expect("PROVIDER_TIMEOUT_SECS must be a whole number of seconds"),
            refresh_interval_minutes: var_or("REFRESH_INTERVAL_MINUTES", "360")
                .parse()
                .expect("REFRESH_INTERVAL_MINUTES must be a whole number of minutes"),
            marine_api_url: var_or("MARINE_API_URL", DEFAULT_MARINE_API_URL),
            yr_api_url: var_or("YR_API_URL", DEFAULT_YR_API_URL),
            tide_stations_url: var_or("TIDE_STATIONS_URL", DEFAULT_TIDE_STATIONS_URL),
            tide_data_url: var_or("TIDE_DATA_URL", DEFAULT_TIDE_DATA_URL),
        }
    }

    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            window: chrono::Duration::hours(self.forecast_cache_hours),
            horizon: self.forecast_horizon,
        }
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    /// `None` when the scheduler is disabled.
    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_minutes > 0)
            .then(|| Duration::from_secs(self.refresh_interval_minutes * 60))
    }
}
