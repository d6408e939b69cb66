//! Batch refresh of every spot's forecast.
//!
//! `refresh_all` walks the spot list and force-refreshes each one, recording
//! failures without stopping. `RefreshDriver` wraps it with shared status,
//! a fixed-interval scheduler loop and an on-demand trigger.
//!
//! State is in-memory (`Arc<RwLock<RefreshState>>`) and starts empty on
//! restart; the stored forecasts themselves survive in Postgres.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use crate::errors::ForecastError;
use crate::services::forecast::ForecastCache;

/// One spot that could not be refreshed during a batch.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SpotRefreshError {
    pub spot_id: i64,
    pub spot_name: String,
    pub error: String,
}

/// Outcome of one pass over all spots.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BatchResult {
    /// Spots whose stored forecast was replaced
    pub updated_count: usize,
    /// Spots attempted
    pub total: usize,
    pub errors: Vec<SpotRefreshError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Refresh every spot sequentially. Only a failure to list spots fails the
/// batch itself.
pub async fn refresh_all(cache: &ForecastCache) -> Result<BatchResult, ForecastError> {
    let started_at = Utc::now();
    let spots = cache.spots().list_spots(None).await?;
    tracing::info!("Batch refresh started for {} spots", spots.len());

    let mut updated_count = 0;
    let mut errors = Vec::new();

    for spot in &spots {
        match cache.get_forecast(spot.id, true).await {
            Ok(_) => updated_count += 1,
            Err(e) => {
                tracing::warn!(
                    "Batch refresh: spot {} ({}) failed: {}",
                    spot.id,
                    spot.name,
                    e
                );
                errors.push(SpotRefreshError {
                    spot_id: spot.id,
                    spot_name: spot.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let result = BatchResult {
        updated_count,
        total: spots.len(),
        errors,
        started_at,
        finished_at: Utc::now(),
    };
    tracing::info!(
        "Batch refresh finished: {}/{} spots updated in {} ms",
        result.updated_count,
        result.total,
        (result.finished_at - result.started_at).num_milliseconds()
    );
    Ok(result)
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Refresh driver status, exposed via the refresh endpoint.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct RefreshState {
    pub running: bool,
    pub total_runs: u64,
    pub last_started_at: Option<DateTime<Utc>>,
    pub last_result: Option<BatchResult>,
    /// Set when the last run could not list spots
    pub last_error: Option<String>,
    pub next_run_at: Option<DateTime<Utc>>,
    /// 0 when the scheduler is disabled
    pub interval_minutes: u64,
}

pub type SharedRefreshState = Arc<RwLock<RefreshState>>;

pub struct RefreshDriver {
    cache: Arc<ForecastCache>,
    state: SharedRefreshState,
}

impl RefreshDriver {
    pub fn new(cache: Arc<ForecastCache>, interval_minutes: u64) -> Self {
        let state = RefreshState {
            interval_minutes,
            ..RefreshState::default()
        };
        Self {
            cache,
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub async fn snapshot(&self) -> RefreshState {
        self.state.read().await.clone()
    }

    /// Mark a run as started. Returns false if one is already in progress.
    pub(crate) async fn begin(&self) -> bool {
        let mut s = self.state.write().await;
        if s.running {
            return false;
        }
        s.running = true;
        s.last_started_at = Some(Utc::now());
        true
    }

    async fn finish(&self, outcome: Result<BatchResult, ForecastError>) {
        let mut s = self.state.write().await;
        s.running = false;
        s.total_runs += 1;
        match outcome {
            Ok(result) => {
                s.last_result = Some(result);
                s.last_error = None;
            }
            Err(e) => {
                tracing::error!("Batch refresh failed: {}", e);
                s.last_error = Some(e.to_string());
            }
        }
    }

    async fn run_once(&self) {
        let outcome = refresh_all(&self.cache).await;
        self.finish(outcome).await;
    }

    /// Start a batch in the background. Returns false without starting one
    /// if a batch is already running.
    pub async fn trigger(self: &Arc<Self>) -> bool {
        if !self.begin().await {
            return false;
        }
        let driver = Arc::clone(self);
        tokio::spawn(async move { driver.run_once().await });
        true
    }

    /// Run a batch immediately, then every `interval`. Never returns.
    ///
    /// Should be spawned via `tokio::spawn(driver.run_loop(...))`.
    pub async fn run_loop(self: Arc<Self>, interval: std::time::Duration) {
        tracing::info!(
            "Refresh scheduler started, interval {} minutes",
            interval.as_secs() / 60
        );

        loop {
            if self.begin().await {
                self.run_once().await;
            } else {
                tracing::debug!("Scheduled refresh skipped, a batch is already running");
            }

            {
                let mut s = self.state.write().await;
                s.next_run_at = Duration::from_std(interval).ok().map(|d| Utc::now() + d);
            }
            tokio::time::sleep(interval).await;
        }
    }
}
