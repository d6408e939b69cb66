pub mod forecasts;
pub mod health;
pub mod refresh;
pub mod spots;
