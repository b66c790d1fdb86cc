use crate::{
    Config,
    error::LookupError,
    model::{Location, Observation, Query},
    provider::open_meteo::{OpenMeteoGeocoder, OpenMeteoWeather},
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use std::fmt::Debug;

pub mod open_meteo;

/// Resolves a place name to at most one location.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    /// `Ok(None)` means the provider had no match; that is not an error.
    async fn search(&self, query: &Query) -> Result<Option<Location>, LookupError>;
}

/// Fetches the current observation for a coordinate pair.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn current(&self, latitude: f64, longitude: f64) -> Result<Observation, LookupError>;
}

/// Build both Open-Meteo clients from config, sharing one HTTP client.
pub fn open_meteo_from_config(
    config: &Config,
) -> anyhow::Result<(OpenMeteoGeocoder, OpenMeteoWeather)> {
    let http = Client::builder()
        .timeout(config.request_timeout())
        .user_agent(concat!("meteo/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let geocoder = OpenMeteoGeocoder::with_client(
        http.clone(),
        &config.geocoding_url,
        config.language_hint().map(str::to_owned),
    );
    let weather = OpenMeteoWeather::with_client(http, &config.forecast_url);

    Ok((geocoder, weather))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clients_pick_up_configured_urls_and_language() {
        let cfg = Config {
            geocoding_url: "http://geo.test/".into(),
            forecast_url: "http://wx.test".into(),
            language: Some("en".into()),
            ..Config::default()
        };

        let (geocoder, weather) = open_meteo_from_config(&cfg).expect("clients");
        assert_eq!(geocoder.search_url(), "http://geo.test/v1/search");
        assert_eq!(geocoder.language(), Some("en"));
        assert_eq!(weather.forecast_url(), "http://wx.test/v1/forecast");
    }

    #[test]
    fn blank_language_is_not_forwarded() {
        let cfg = Config {
            language: Some(String::new()),
            ..Config::default()
        };

        let (geocoder, _) = open_meteo_from_config(&cfg).expect("clients");
        assert_eq!(geocoder.language(), None);
    }
}
