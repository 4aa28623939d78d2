use std::fmt::Debug;

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    error::Result,
    http::{BearerAuth, DecoratorChain, join_url, read_json},
    model::{AirQuality, CurrentWeather, GeoLocation, WeatherForecast},
    session::SharedSession,
};

#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    async fn current_by_city(&self, city: &str) -> Result<CurrentWeather>;

    async fn current_by_coordinates(&self, lat: f64, lon: f64) -> Result<CurrentWeather>;

    /// Requires an authenticated session on the server side.
    async fn forecast_by_city(&self, city: &str) -> Result<WeatherForecast>;

    async fn geocode_city(&self, city: &str) -> Result<GeoLocation>;

    async fn air_quality_by_city(&self, city: &str) -> Result<AirQuality>;

    async fn air_quality_by_coordinates(&self, lat: f64, lon: f64) -> Result<AirQuality>;
}

/// Client for the `/weather/*` endpoints. Every request carries the session's
/// bearer token when one is present.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    base_url: String,
    http: Client,
    decorators: DecoratorChain,
}

impl WeatherClient {
    pub fn new(base_url: impl Into<String>, http: Client, session: SharedSession) -> Self {
        Self::with_decorators(base_url, http, DecoratorChain::new().with(BearerAuth::new(session)))
    }

    pub fn with_decorators(
        base_url: impl Into<String>,
        http: Client,
        decorators: DecoratorChain,
    ) -> Self {
        Self { base_url: base_url.into(), http, decorators }
    }

    async fn get<T>(&self, path: &str, query: &[(&str, String)], what: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = join_url(&self.base_url, path);
        tracing::debug!(%url, ?query, "weather request");

        let res = self.decorators.apply(self.http.get(url).query(query)).send().await?;

        read_json(res, what).await
    }
}

#[async_trait]
impl WeatherApi for WeatherClient {
    async fn current_by_city(&self, city: &str) -> Result<CurrentWeather> {
        self.get("/weather/current", &[("city", city.to_owned())], "current weather").await
    }

    async fn current_by_coordinates(&self, lat: f64, lon: f64) -> Result<CurrentWeather> {
        self.get(
            "/weather/current",
            &[("lat", lat.to_string()), ("lon", lon.to_string())],
            "current weather",
        )
        .await
    }

    async fn forecast_by_city(&self, city: &str) -> Result<WeatherForecast> {
        self.get("/weather/forecast", &[("city", city.to_owned())], "forecast").await
    }

    async fn geocode_city(&self, city: &str) -> Result<GeoLocation> {
        self.get("/weather/geocode", &[("city", city.to_owned())], "geocode").await
    }

    async fn air_quality_by_city(&self, city: &str) -> Result<AirQuality> {
        self.get("/weather/air-quality", &[("city", city.to_owned())], "air quality").await
    }

    async fn air_quality_by_coordinates(&self, lat: f64, lon: f64) -> Result<AirQuality> {
        self.get(
            "/weather/air-quality",
            &[("lat", lat.to_string()), ("lon", lon.to_string())],
            "air quality",
        )
        .await
    }
}
