//! The app side: locate once, fetch once, publish into the shared store.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    location::{LocationService, locate_once},
    model::{Coordinate, WeatherRecord},
    provider::WeatherProvider,
    store::WeatherStore,
};

/// What the app currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    pub location: Option<Coordinate>,
    pub weather: Option<WeatherRecord>,
}

pub struct WeatherApp {
    provider: Arc<dyn WeatherProvider>,
    store: WeatherStore,
    state: AppState,
}

impl WeatherApp {
    pub fn new(provider: Arc<dyn WeatherProvider>, store: WeatherStore) -> Self {
        Self {
            provider,
            store,
            state: AppState::default(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Locate the device, then fetch and publish weather for that position.
    ///
    /// Every failure is logged and ends the run with whatever state was reached.
    pub async fn run<S: LocationService>(&mut self, location: &mut S) -> &AppState {
        match locate_once(location).await {
            Ok(at) => {
                self.state.location = Some(at);
                self.refresh(at).await;
            }
            Err(err) => warn!(error = %err, "no location; skipping weather fetch"),
        }
        &self.state
    }

    /// Fetch weather for `at` on a background task and publish the result here.
    pub async fn refresh(&mut self, at: Coordinate) -> Option<&WeatherRecord> {
        let provider = Arc::clone(&self.provider);
        let task = tokio::spawn(async move { provider.current_weather(at).await });

        match task.await {
            Ok(Ok(record)) => {
                info!(city = %record.name, temp = record.main.temp, "fetched weather");
                self.publish(record);
                self.state.weather.as_ref()
            }
            Ok(Err(err)) => {
                error!(error = %err, "weather fetch failed");
                None
            }
            Err(err) => {
                error!(error = %err, "weather fetch task did not complete");
                None
            }
        }
    }

    /// Replace the shown weather and write it to the shared store.
    pub fn publish(&mut self, record: WeatherRecord) {
        match self.store.save(&record) {
            Ok(_) => info!(path = %self.store.path().display(), "saved weather to shared store"),
            Err(err) => error!(error = %err, "failed to save weather to shared store"),
        }
        self.state.weather = Some(record);
    }
}
