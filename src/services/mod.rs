pub mod conditions;
pub mod forecast;
pub mod marine;
pub mod pipeline;
pub mod providers;
pub mod refresh;
pub mod summary;
pub mod tides;
pub mod tuning;
pub mod units;
pub mod waves;
pub mod yr;

#[cfg(test)]
pub mod testing;
