use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::{
    config::{DEFAULT_BASE_URL, is_usable_api_key},
    error::FetchError,
    model::{Coordinate, WeatherRecord},
};

use super::WeatherProvider;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    units: String,
    lang: String,
    http: Client,
}

#[derive(Debug, Clone)]
pub struct OpenWeatherBuilder {
    api_key: String,
    base_url: String,
    units: String,
    lang: String,
}

impl OpenWeatherBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn build(self) -> Result<OpenWeatherProvider, FetchError> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(OpenWeatherProvider {
            api_key: self.api_key,
            base_url: self.base_url,
            units: self.units,
            lang: self.lang,
            http,
        })
    }
}

impl OpenWeatherProvider {
    pub fn builder(api_key: impl Into<String>) -> OpenWeatherBuilder {
        OpenWeatherBuilder {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            units: "metric".to_string(),
            lang: "kr".to_string(),
        }
    }

    pub fn new(api_key: impl Into<String>) -> Result<Self, FetchError> {
        Self::builder(api_key).build()
    }

    pub fn endpoint(&self) -> String {
        format!("{}/data/2.5/weather", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_weather(&self, at: Coordinate) -> Result<WeatherRecord, FetchError> {
        if !is_usable_api_key(&self.api_key) {
            return Err(FetchError::MissingApiKey);
        }

        let lat = at.latitude.to_string();
        let lon = at.longitude.to_string();
        debug!(%at, endpoint = %self.endpoint(), "requesting current weather");

        let res = self
            .http
            .get(self.endpoint())
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", self.units.as_str()),
                ("lang", self.lang.as_str()),
            ])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| FetchError::Decode { source, body })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
