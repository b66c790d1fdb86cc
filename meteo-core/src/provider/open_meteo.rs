//! Open-Meteo geocoding and current-weather clients. Neither endpoint needs an API key.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    error::LookupError,
    model::{Location, Observation, Query},
};

use super::{Geocoder, WeatherSource};

#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoder {
    http: Client,
    search_url: String,
    language: Option<String>,
}

impl OpenMeteoGeocoder {
    pub fn with_client(http: Client, base_url: &str, language: Option<String>) -> Self {
        Self {
            http,
            search_url: format!("{}/v1/search", base_url.trim_end_matches('/')),
            language,
        }
    }

    pub fn search_url(&self) -> &str {
        &self.search_url
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

#[async_trait]
impl Geocoder for OpenMeteoGeocoder {
    async fn search(&self, query: &Query) -> Result<Option<Location>, LookupError> {
        let mut params = vec![("name", query.as_str()), ("count", "1")];
        if let Some(language) = self.language.as_deref() {
            params.push(("language", language));
        }

        debug!(query = %query, "Geocoding place name");
        let res = self.http.get(&self.search_url).query(&params).send().await?;
        let parsed: GeoSearchResponse = read_json(res).await?;

        let location = parsed.results.into_iter().flatten().next().map(|r| Location {
            name: r.name,
            country: r.country,
            latitude: r.latitude,
            longitude: r.longitude,
        });

        debug!(found = location.is_some(), "Geocoding finished");
        Ok(location)
    }
}

#[derive(Debug, Clone)]
pub struct OpenMeteoWeather {
    http: Client,
    forecast_url: String,
}

impl OpenMeteoWeather {
    pub fn with_client(http: Client, base_url: &str) -> Self {
        Self {
            http,
            forecast_url: format!("{}/v1/forecast", base_url.trim_end_matches('/')),
        }
    }

    pub fn forecast_url(&self) -> &str {
        &self.forecast_url
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoWeather {
    async fn current(&self, latitude: f64, longitude: f64) -> Result<Observation, LookupError> {
        debug!(latitude, longitude, "Fetching current weather");

        let res = self
            .http
            .get(&self.forecast_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current_weather", "true".to_string()),
            ])
            .send()
            .await?;

        let parsed: ForecastResponse = read_json(res).await?;
        let current = parsed.current_weather;

        Ok(Observation {
            temperature_c: current.temperature,
            wind_speed_kmh: current.windspeed,
            weather_code: current.weathercode,
        })
    }
}

#[derive(Debug, Deserialize)]
struct GeoCandidate {
    name: String,
    country: Option<String>,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct GeoSearchResponse {
    // Absent, null or empty when nothing matched.
    results: Option<Vec<GeoCandidate>>,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: f64,
    windspeed: f64,
    weathercode: i32,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: CurrentWeather,
}

async fn read_json<T: DeserializeOwned>(res: Response) -> Result<T, LookupError> {
    let status = res.status();
    let body = res.text().await?;

    if !status.is_success() {
        return Err(LookupError::Status {
            status,
            body: truncate_body(&body),
        });
    }

    Ok(serde_json::from_str(&body)?)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn query(s: &str) -> Query {
        Query::parse(s).expect("non-empty query")
    }

    #[tokio::test]
    async fn geocoder_returns_first_candidate() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("name", "Paris"))
            .and(query_param("count", "1"))
            .and(query_param("language", "fr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [
                    {"id": 2988507, "name": "Paris", "country": "France",
                     "latitude": 48.85, "longitude": 2.35},
                    {"id": 4717560, "name": "Paris", "country": "United States",
                     "latitude": 33.66, "longitude": -95.55}
                ],
                "generationtime_ms": 0.5
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let geocoder =
            OpenMeteoGeocoder::with_client(Client::new(), &mock_server.uri(), Some("fr".into()));
        let location = geocoder
            .search(&query("Paris"))
            .await
            .unwrap()
            .expect("candidate");

        assert_eq!(location.name, "Paris");
        assert_eq!(location.country.as_deref(), Some("France"));
        assert_eq!(location.latitude, 48.85);
        assert_eq!(location.longitude, 2.35);
    }

    #[tokio::test]
    async fn geocoder_treats_missing_results_as_not_found() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"generationtime_ms": 0.3})),
            )
            .mount(&mock_server)
            .await;

        let geocoder = OpenMeteoGeocoder::with_client(Client::new(), &mock_server.uri(), None);
        let result = geocoder.search(&query("Atlantis")).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn geocoder_treats_null_or_empty_results_as_not_found() {
        for body in [
            serde_json::json!({"results": null}),
            serde_json::json!({"results": []}),
        ] {
            let mock_server = MockServer::start().await;

            Mock::given(method("GET"))
                .and(path("/v1/search"))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .mount(&mock_server)
                .await;

            let geocoder =
                OpenMeteoGeocoder::with_client(Client::new(), &mock_server.uri(), None);
            let result = geocoder.search(&query("Atlantis")).await.unwrap();

            assert!(result.is_none());
        }
    }

    #[tokio::test]
    async fn geocoder_accepts_candidate_without_country() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"name": "Antarctica Station", "latitude": -77.8, "longitude": 166.6}]
            })))
            .mount(&mock_server)
            .await;

        let geocoder = OpenMeteoGeocoder::with_client(Client::new(), &mock_server.uri(), None);
        let location = geocoder
            .search(&query("station"))
            .await
            .unwrap()
            .expect("candidate");

        assert_eq!(location.country, None);
        assert_eq!(location.label(), "Antarctica Station");
    }

    #[tokio::test]
    async fn geocoder_reports_malformed_payload_as_parse_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let geocoder = OpenMeteoGeocoder::with_client(Client::new(), &mock_server.uri(), None);
        let err = geocoder.search(&query("Paris")).await.unwrap_err();

        assert_eq!(err.kind(), FailureKind::Parse);
    }

    #[tokio::test]
    async fn weather_reads_current_conditions() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", "48.85"))
            .and(query_param("longitude", "2.35"))
            .and(query_param("current_weather", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "latitude": 48.86,
                "longitude": 2.34,
                "current_weather": {
                    "time": "2026-10-18T12:00",
                    "temperature": 21.4,
                    "windspeed": 12.0,
                    "winddirection": 250,
                    "weathercode": 1,
                    "is_day": 1
                }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let weather = OpenMeteoWeather::with_client(Client::new(), &mock_server.uri());
        let obs = weather.current(48.85, 2.35).await.unwrap();

        assert_eq!(
            obs,
            Observation {
                temperature_c: 21.4,
                wind_speed_kmh: 12.0,
                weather_code: 1,
            }
        );
    }

    #[tokio::test]
    async fn weather_maps_http_errors_to_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({"error": true, "reason": "bad latitude"})),
            )
            .mount(&mock_server)
            .await;

        let weather = OpenMeteoWeather::with_client(Client::new(), &mock_server.uri());
        let err = weather.current(123.0, 2.35).await.unwrap_err();

        match err {
            LookupError::Status { status, body } => {
                assert_eq!(status.as_u16(), 400);
                assert!(body.contains("bad latitude"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(150);
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= 203);
    }
}
