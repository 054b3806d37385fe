//! One-shot device location.
//!
//! A [`LocationService`] produces authorization and position events; the
//! [`LocationManager`] turns them into at most one captured [`Coordinate`].

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::{error::LocationError, model::Coordinate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    NotDetermined,
    Restricted,
    Denied,
    AuthorizedWhenInUse,
    AuthorizedAlways,
}

impl AuthorizationStatus {
    pub fn is_authorized(self) -> bool {
        matches!(self, Self::AuthorizedWhenInUse | Self::AuthorizedAlways)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    AuthorizationChanged(AuthorizationStatus),
    /// Positions in the order they were observed; the last one is the newest.
    LocationsUpdated(Vec<Coordinate>),
    Failed(String),
}

/// Something that reports location events, e.g. a GPS daemon or a fixed position.
#[async_trait]
pub trait LocationService: Send {
    /// Begin delivering events. The stream ends when the sender is dropped.
    async fn start(&mut self, events: mpsc::Sender<LocationEvent>);

    /// Called once the manager no longer wants position updates.
    fn stop_updating(&mut self) {}
}

/// Captures the first authorized position and ignores the rest.
#[derive(Debug, Default)]
pub struct LocationManager {
    status: Option<AuthorizationStatus>,
    updating: bool,
    current: Option<Coordinate>,
    last_error: Option<String>,
}

impl LocationManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_location(&self) -> Option<Coordinate> {
        self.current
    }

    pub fn is_updating(&self) -> bool {
        self.updating
    }

    /// Feed one event. Returns the coordinate the first time one is captured.
    pub fn handle(&mut self, event: LocationEvent) -> Option<Coordinate> {
        match event {
            LocationEvent::AuthorizationChanged(status) => {
                self.status = Some(status);
                match status {
                    AuthorizationStatus::AuthorizedWhenInUse
                    | AuthorizationStatus::AuthorizedAlways => {
                        info!(?status, "location permission granted");
                        self.updating = true;
                    }
                    AuthorizationStatus::Denied | AuthorizationStatus::Restricted => {
                        warn!(?status, "location permission denied or restricted");
                    }
                    AuthorizationStatus::NotDetermined => {
                        info!("location permission not determined");
                    }
                }
                None
            }
            LocationEvent::LocationsUpdated(batch) => {
                let latest = *batch.last()?;
                self.updating = false;
                if self.current.is_some() {
                    return None;
                }
                if !self.status.is_some_and(AuthorizationStatus::is_authorized) {
                    warn!(%latest, "ignoring location update without permission");
                    return None;
                }
                info!(%latest, "current location");
                self.current = Some(latest);
                self.current
            }
            LocationEvent::Failed(message) => {
                warn!(%message, "failed to get location");
                self.last_error = Some(message);
                None
            }
        }
    }

    /// Why no coordinate was captured, judging by the last authorization seen.
    pub fn failure(&self) -> LocationError {
        match self.status {
            Some(AuthorizationStatus::Denied) => LocationError::Denied,
            Some(AuthorizationStatus::Restricted) => LocationError::Restricted,
            Some(AuthorizationStatus::NotDetermined) | None => {
                LocationError::Unavailable("permission not determined".into())
            }
            Some(_) => LocationError::Unavailable(
                self.last_error
                    .clone()
                    .unwrap_or_else(|| "no position reported".into()),
            ),
        }
    }
}

/// Wait for the first coordinate `service` reports.
pub async fn locate_once<S: LocationService>(service: &mut S) -> Result<Coordinate, LocationError> {
    let (tx, mut rx) = mpsc::channel(8);
    let mut manager = LocationManager::new();

    let captured = {
        let pump = service.start(tx);
        tokio::pin!(pump);
        let mut pump_done = false;
        loop {
            tokio::select! {
                _ = &mut pump, if !pump_done => pump_done = true,
                event = rx.recv() => match event {
                    Some(event) => {
                        if let Some(at) = manager.handle(event) {
                            break Some(at);
                        }
                    }
                    None => break None,
                },
            }
        }
    };

    service.stop_updating();
    captured.ok_or_else(|| manager.failure())
}

/// Reports a permission decision and then a single known coordinate.
#[derive(Debug, Clone)]
pub struct FixedLocationService {
    status: AuthorizationStatus,
    position: Option<Coordinate>,
}

impl FixedLocationService {
    pub fn new(position: Coordinate) -> Self {
        Self {
            status: AuthorizationStatus::AuthorizedWhenInUse,
            position: Some(position),
        }
    }

    /// Simulate a user refusing location access.
    pub fn denied() -> Self {
        Self {
            status: AuthorizationStatus::Denied,
            position: None,
        }
    }

    /// Permission granted but the positioning hardware has nothing to report.
    pub fn unavailable() -> Self {
        Self {
            status: AuthorizationStatus::AuthorizedWhenInUse,
            position: None,
        }
    }
}

#[async_trait]
impl LocationService for FixedLocationService {
    async fn start(&mut self, events: mpsc::Sender<LocationEvent>) {
        if events
            .send(LocationEvent::AuthorizationChanged(self.status))
            .await
            .is_err()
        {
            return;
        }
        if !self.status.is_authorized() {
            return;
        }
        let event = match self.position {
            Some(at) => LocationEvent::LocationsUpdated(vec![at]),
            None => LocationEvent::Failed("no position fix".into()),
        };
        let _ = events.send(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn granted() -> LocationEvent {
        LocationEvent::AuthorizationChanged(AuthorizationStatus::AuthorizedWhenInUse)
    }

    #[test]
    fn first_authorized_update_is_captured_once() {
        let mut manager = LocationManager::new();
        assert_eq!(manager.handle(granted()), None);
        assert!(manager.is_updating());

        let first = Coordinate::new(37.5, 127.0);
        let later = Coordinate::new(35.1, 129.0);

        assert_eq!(
            manager.handle(LocationEvent::LocationsUpdated(vec![Coordinate::new(0.0, 0.0), first])),
            Some(first)
        );
        assert!(!manager.is_updating());
        assert_eq!(manager.handle(LocationEvent::LocationsUpdated(vec![later])), None);
        assert_eq!(manager.current_location(), Some(first));
    }

    #[test]
    fn empty_batch_is_ignored() {
        let mut manager = LocationManager::new();
        manager.handle(granted());
        assert_eq!(manager.handle(LocationEvent::LocationsUpdated(vec![])), None);
        assert!(manager.is_updating());
    }

    #[test]
    fn denied_permission_never_captures() {
        let mut manager = LocationManager::new();
        manager.handle(LocationEvent::AuthorizationChanged(AuthorizationStatus::Denied));
        assert!(!manager.is_updating());
        assert_eq!(
            manager.handle(LocationEvent::LocationsUpdated(vec![Coordinate::new(1.0, 1.0)])),
            None
        );
        assert_eq!(manager.failure(), LocationError::Denied);
    }

    #[test]
    fn errors_are_ignored() {
        let mut manager = LocationManager::new();
        manager.handle(granted());
        assert_eq!(manager.handle(LocationEvent::Failed("gps off".into())), None);

        let at = Coordinate::new(2.0, 3.0);
        assert_eq!(manager.handle(LocationEvent::LocationsUpdated(vec![at])), Some(at));
    }

    #[test]
    fn failure_reports_last_service_error() {
        let mut manager = LocationManager::new();
        manager.handle(granted());
        manager.handle(LocationEvent::Failed("gps off".into()));
        manager.handle(LocationEvent::Failed("no satellites".into()));

        assert_eq!(
            manager.failure(),
            LocationError::Unavailable("no satellites".into())
        );
    }

    #[test]
    fn failure_without_service_error_is_generic() {
        let mut manager = LocationManager::new();
        manager.handle(granted());

        assert_eq!(
            manager.failure(),
            LocationError::Unavailable("no position reported".into())
        );
    }

    #[tokio::test]
    async fn fixed_service_yields_its_coordinate() {
        let at = Coordinate::new(37.5683, 126.9778);
        let found = locate_once(&mut FixedLocationService::new(at)).await;
        assert_eq!(found, Ok(at));
    }

    #[tokio::test]
    async fn denied_service_yields_denied() {
        let found = locate_once(&mut FixedLocationService::denied()).await;
        assert_eq!(found, Err(LocationError::Denied));
    }

    #[tokio::test]
    async fn unavailable_service_reports_no_position() {
        let found = locate_once(&mut FixedLocationService::unavailable()).await;
        assert_eq!(found, Err(LocationError::Unavailable("no position fix".into())));
    }
}
