//! Client for the weatherapi.com current conditions and astronomy endpoints.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt::{Debug, Formatter};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_WEATHER_API_URL: &str = "http://api.weatherapi.com/v1";

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Weather request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Conditions at a coordinate, as answered to clients.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Weather {
    pub sunrise: String,
    pub sunset: String,
    pub weather: String,
    pub temperature: f64,
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
struct CurrentResponse {
    current: Current,
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
struct Current {
    temp_c: f64,
    condition: Condition,
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
struct Condition {
    text: String,
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
struct AstronomyResponse {
    astronomy: Astronomy,
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
struct Astronomy {
    astro: Astro,
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
struct Astro {
    sunrise: String,
    sunset: String,
}

impl Weather {
    fn from_responses(current: CurrentResponse, astronomy: AstronomyResponse) -> Self {
        Self {
            sunrise: astronomy.astronomy.astro.sunrise,
            sunset: astronomy.astronomy.astro.sunset,
            weather: current.current.condition.text,
            temperature: current.current.temp_c,
        }
    }
}

pub struct WeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl WeatherClient {
    pub fn new(base_url: String, api_key: String) -> Result<Self, WeatherError> {
        let http = reqwest::Client::builder().build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
        })
    }

    /// Fetches current conditions and sun times. Each upstream call is made once, without retry.
    pub async fn fetch(&self, longitude: f64, latitude: f64) -> Result<Weather, WeatherError> {
        let current: CurrentResponse = self.get("current.json", longitude, latitude).await?;
        let astronomy: AstronomyResponse = self.get("astronomy.json", longitude, latitude).await?;

        Ok(Weather::from_responses(current, astronomy))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        longitude: f64,
        latitude: f64,
    ) -> Result<T, WeatherError> {
        debug!(endpoint, longitude, latitude, "Requesting weather");

        let coordinates = format!("{latitude},{longitude}");
        let body = self
            .http
            .get(format!("{}/{endpoint}", self.base_url))
            .query(&[("key", self.api_key.as_str()), ("q", coordinates.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(body)
    }
}

impl Debug for WeatherClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"[redacted]")
            .finish_non_exhaustive()
    }
}
