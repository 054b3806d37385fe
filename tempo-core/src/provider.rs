use crate::{
    Config,
    error::FetchError,
    model::{Coordinate, WeatherRecord},
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// Source of current weather for a coordinate.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_weather(&self, at: Coordinate) -> Result<WeatherRecord, FetchError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> Result<OpenWeatherProvider, FetchError> {
    OpenWeatherProvider::builder(config.api_key.clone())
        .base_url(config.base_url.clone())
        .units(config.units.clone())
        .lang(config.lang.clone())
        .build()
}
