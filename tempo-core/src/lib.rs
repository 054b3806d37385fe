//! Core library for `tempo`.
//!
//! This crate defines:
//! - Location capture (one coordinate per run)
//! - The OpenWeather current-weather client
//! - The app-group bucket shared by the app and the widget
//! - The widget timeline provider
//!
//! The `tempo` binary drives both the app side and the widget side; each side
//! only talks to the other through the shared store.

pub mod app;
pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod provider;
pub mod store;
pub mod widget;

pub use app::{AppState, WeatherApp};
pub use config::Config;
pub use error::{FetchError, LocationError, StoreError};
pub use model::{Coordinate, SharedWeatherSnapshot, WeatherRecord};
pub use provider::{OpenWeatherProvider, WeatherProvider};
pub use store::WeatherStore;
pub use widget::{TimelineProvider, WeatherEntry};
