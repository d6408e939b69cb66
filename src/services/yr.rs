//! yr.no Locationforecast 2.0 client.
//!
//! Supplies wind and air temperature for the merge step. Hourly for the
//! first ~60 hours, then 6-hourly.
//! See: https://api.met.no/weatherapi/locationforecast/2.0/documentation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use std::time::Duration;

use crate::services::conditions::EnvironmentalSample;
use crate::services::providers::{ensure_success, http_client, ProviderError, WeatherProvider};
use crate::services::units::UnitSystem;

pub const DEFAULT_YR_API_URL: &str =
    "https://api.met.no/weatherapi/locationforecast/2.0/compact";

const PROVIDER: &str = "yr.no";

/// Client for the yr.no Locationforecast API.
#[derive(Debug, Clone)]
pub struct YrClient {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
}

// --- yr.no JSON response types ---

#[derive(Debug, Deserialize)]
struct YrResponse {
    properties: YrProperties,
}

#[derive(Debug, Deserialize)]
struct YrProperties {
    timeseries: Vec<YrTimeseries>,
}

#[derive(Debug, Deserialize)]
struct YrTimeseries {
    time: String,
    data: YrData,
}

#[derive(Debug, Deserialize)]
struct YrData {
    instant: YrInstant,
}

#[derive(Debug, Deserialize)]
struct YrInstant {
    details: YrInstantDetails,
}

#[derive(Debug, Deserialize)]
struct YrInstantDetails {
    air_temperature: Option<f64>,
    wind_speed: Option<f64>,
    wind_from_direction: Option<f64>,
}

impl YrClient {
    pub fn new(base_url: &str, user_agent: &str, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            base_url: base_url.to_string(),
            user_agent: user_agent.to_string(),
        }
    }
}

#[async_trait]
impl WeatherProvider for YrClient {
    async fn fetch_hourly_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<EnvironmentalSample>, ProviderError> {
        // Limit to 4 decimal places per yr.no terms of service
        let url = format!(
            "{}?lat={:.4}&lon={:.4}",
            self.base_url, latitude, longitude
        );

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.user_agent).map_err(|e| ProviderError::Request {
                provider: PROVIDER,
                message: format!("Invalid User-Agent: {}", e),
            })?,
        );

        let response = self
            .client
            .get(&url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        let body: YrResponse = ensure_success(PROVIDER, response)?
            .json()
            .await
            .map_err(|e| ProviderError::from_reqwest(PROVIDER, e))?;

        let samples = extract_weather_samples(&body);
        if samples.is_empty() {
            return Err(ProviderError::Empty { provider: PROVIDER });
        }
        Ok(samples)
    }
}

/// Turn a yr.no timeseries into metric weather samples. Entries with an
/// unparseable time or without any usable field are skipped.
fn extract_weather_samples(response: &YrResponse) -> Vec<EnvironmentalSample> {
    response
        .properties
        .timeseries
        .iter()
        .filter_map(|entry| {
            let time = DateTime::parse_from_rfc3339(&entry.time)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()?;
            let details = &entry.data.instant.details;
            if details.wind_speed.is_none()
                && details.wind_from_direction.is_none()
                && details.air_temperature.is_none()
            {
                return None;
            }

            let mut sample = EnvironmentalSample::new(time, UnitSystem::Metric);
            sample.wind_speed = details.wind_speed;
            sample.wind_direction = details.wind_from_direction;
            sample.air_temperature = details.air_temperature;
            Some(sample)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn compact_body() -> serde_json::Value {
        serde_json::json!({
            "type": "Feature",
            "geometry": { "type": "Point", "coordinates": [-120.6413, 35.1428, 0] },
            "properties": {
                "meta": { "updated_at": "2026-03-01T06:30:00Z" },
                "timeseries": [
                    {
                        "time": "2026-03-01T07:00:00Z",
                        "data": {
                            "instant": {
                                "details": {
                                    "air_temperature": 12.5,
                                    "wind_speed": 3.2,
                                    "wind_from_direction": 315.0
                                }
                            },
                            "next_1_hours": { "summary": { "symbol_code": "cloudy" } }
                        }
                    },
                    {
                        "time": "2026-03-01T08:00:00Z",
                        "data": {
                            "instant": {
                                "details": {
                                    "air_temperature": 13.0,
                                    "wind_speed": 4.0,
                                    "wind_from_direction": 300.0
                                }
                            }
                        }
                    },
                    {
                        "time": "not-a-time",
                        "data": { "instant": { "details": { "wind_speed": 9.9 } } }
                    }
                ]
            }
        })
    }

    #[tokio::test]
    async fn test_fetch_hourly_weather_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/compact"))
            .and(query_param("lat", "35.1428"))
            .and(query_param("lon", "-120.6413"))
            .and(header("user-agent", "surf-forecast-test/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(compact_body()))
            .mount(&server)
            .await;

        let client = YrClient::new(
            &format!("{}/compact", server.uri()),
            "surf-forecast-test/1.0",
            Duration::from_secs(5),
        );
        let samples = client.fetch_hourly_weather(35.1428, -120.6413).await.unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].unit, UnitSystem::Metric);
        assert_eq!(samples[0].wind_speed, Some(3.2));
        assert_eq!(samples[0].wind_direction, Some(315.0));
        assert_eq!(samples[1].air_temperature, Some(13.0));
        assert!(samples[0].wave_summary.is_none());
    }

    #[tokio::test]
    async fn test_forbidden_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = YrClient::new(&server.uri(), "test", Duration::from_secs(5));
        let err = client.fetch_hourly_weather(0.0, 0.0).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Status {
                provider: "yr.no",
                status: 403
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_timeseries_is_empty_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "properties": { "timeseries": [] }
            })))
            .mount(&server)
            .await;

        let client = YrClient::new(&server.uri(), "test", Duration::from_secs(5));
        let err = client.fetch_hourly_weather(0.0, 0.0).await.unwrap_err();
        assert!(matches!(err, ProviderError::Empty { .. }));
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let client = YrClient::new(&server.uri(), "test", Duration::from_secs(5));
        let err = client.fetch_hourly_weather(0.0, 0.0).await.unwrap_err();
        assert!(matches!(err, ProviderError::Parse { .. }));
    }

    #[test]
    fn test_extract_skips_entries_without_fields() {
        let response: YrResponse = serde_json::from_value(serde_json::json!({
            "properties": {
                "timeseries": [
                    { "time": "2026-03-01T07:00:00Z", "data": { "instant": { "details": {} } } },
                    { "time": "2026-03-01T08:00:00Z", "data": { "instant": { "details": { "wind_speed": 2.0 } } } }
                ]
            }
        }))
        .unwrap();
        let samples = extract_weather_samples(&response);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].wind_speed, Some(2.0));
        assert_eq!(samples[0].air_temperature, None);
    }
}
