// Surf Forecast API v0.1
use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod db;
mod errors;
mod helpers;
mod routes;
mod services;

use config::AppConfig;
use db::store::{PgStore, SpotRepository};
use services::forecast::ForecastCache;
use services::marine::MarineClient;
use services::pipeline::ForecastPipeline;
use services::refresh::RefreshDriver;
use services::tides::NoaaTideClient;
use services::yr::YrClient;

/// Maximum number of connections in the database pool.
const DB_POOL_MAX_CONNECTIONS: u32 = 5;
/// Minimum number of connections kept alive in the database pool.
const DB_POOL_MIN_CONNECTIONS: u32 = 2;

/// Surf Forecast API OpenAPI document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Surf Forecast API",
        version = "0.1.0",
        description = "Per-spot surf forecasts. Combines a marine wave model, \
            an atmospheric weather model and NOAA tide predictions into breaking \
            wave heights tuned to each beach, and caches one forecast per spot.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Spots", description = "Surf spot catalogue"),
        (name = "Forecasts", description = "Cached spot forecasts and daily summaries"),
        (name = "Refresh", description = "Batch forecast refresh"),
    ),
    paths(
        routes::health::health_check,
        routes::spots::list_spots,
        routes::spots::create_spot,
        routes::spots::get_spot,
        routes::spots::update_spot,
        routes::spots::delete_spot,
        routes::forecasts::get_spot_forecast,
        routes::forecasts::get_daily_forecast,
        routes::refresh::trigger_refresh,
        routes::refresh::get_refresh_status,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            db::models::Spot,
            db::models::NewSpot,
            db::models::SpotUpdate,
            routes::forecasts::ForecastResponse,
            routes::forecasts::DailyForecastResponse,
            services::pipeline::Forecast,
            services::pipeline::HourlyConditions,
            services::pipeline::SwellComponents,
            services::pipeline::DataGap,
            services::pipeline::ForecastHorizon,
            services::conditions::Swell,
            services::forecast::CacheStatus,
            services::summary::ForecastDay,
            services::refresh::RefreshState,
            services::refresh::BatchResult,
            services::refresh::SpotRefreshError,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "surf_forecast_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    // Set up database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(DB_POOL_MAX_CONNECTIONS)
        .min_connections(DB_POOL_MIN_CONNECTIONS)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations completed");

    // Upstream providers share one timeout
    let timeout = config.provider_timeout();
    let pipeline = Arc::new(ForecastPipeline::new(
        Arc::new(MarineClient::new(&config.marine_api_url, timeout)),
        Arc::new(YrClient::new(
            &config.yr_api_url,
            &config.weather_user_agent,
            timeout,
        )),
        Arc::new(NoaaTideClient::new(
            &config.tide_stations_url,
            &config.tide_data_url,
            timeout,
        )),
    ));

    let store = Arc::new(PgStore::new(pool.clone()));
    let spot_repo: Arc<dyn SpotRepository> = store.clone();
    let cache = Arc::new(ForecastCache::new(
        spot_repo.clone(),
        store,
        pipeline,
        config.cache_settings(),
    ));

    let driver = Arc::new(RefreshDriver::new(
        cache.clone(),
        config.refresh_interval_minutes,
    ));
    match config.refresh_interval() {
        Some(interval) => {
            tokio::spawn(driver.clone().run_loop(interval));
        }
        None => tracing::info!("Refresh scheduler disabled (REFRESH_INTERVAL_MINUTES=0)"),
    }

    // CORS: catalogue edits and the refresh trigger; expose X-Forecast-Stale
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PATCH,
            axum::http::Method::DELETE,
        ])
        .allow_headers(Any)
        .expose_headers([routes::forecasts::STALE_HEADER
            .parse::<axum::http::HeaderName>()
            .expect("valid header name")]);

    // Build router
    // Health uses PgPool directly; spots go through the repository, forecasts through the cache.
    let spot_routes = Router::new()
        .route(
            "/api/v1/spots",
            get(routes::spots::list_spots).post(routes::spots::create_spot),
        )
        .route(
            "/api/v1/spots/:id",
            get(routes::spots::get_spot)
                .patch(routes::spots::update_spot)
                .delete(routes::spots::delete_spot),
        )
        .with_state(spot_repo);

    let forecast_routes = Router::new()
        .route(
            "/api/v1/spots/:id/forecast",
            get(routes::forecasts::get_spot_forecast),
        )
        .route(
            "/api/v1/spots/:id/forecast/daily",
            get(routes::forecasts::get_daily_forecast),
        )
        .with_state(cache);

    let refresh_routes = Router::new()
        .route(
            "/api/v1/forecasts/refresh",
            get(routes::refresh::get_refresh_status).post(routes::refresh::trigger_refresh),
        )
        .with_state(driver);

    let health_routes = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .with_state(pool);

    let app = Router::new()
        .merge(health_routes)
        .merge(spot_routes)
        .merge(forecast_routes)
        .merge(refresh_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
