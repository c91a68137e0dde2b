//! Device geolocation
//!
//! The native layer reports permission changes and position fixes into a
//! [`LocationService`]. `current_position` answers from a recent fix when one
//! exists and otherwise waits for the next one, up to a timeout.

use app_core::places::Coordinates;
use app_core::providers::{GeolocationProvider, LocationError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Location permission as reported by the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    /// Not asked yet
    #[default]
    Undetermined,
    /// Access granted
    Granted,
    /// Access denied; can be asked again
    Denied,
    /// Access denied permanently; only the system settings can change it
    Blocked,
}

impl PermissionStatus {
    /// Whether position requests must fail immediately
    pub fn is_refused(self) -> bool {
        matches!(self, PermissionStatus::Denied | PermissionStatus::Blocked)
    }
}

/// Location request configuration
#[derive(Debug, Clone)]
pub struct LocationConfig {
    /// How long to wait for a fix
    pub timeout: Duration,
    /// Oldest cached fix that may be returned
    pub maximum_age: Duration,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            maximum_age: Duration::from_secs(600),
        }
    }
}

impl LocationConfig {
    /// Set the fix timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum age of cached fixes
    pub fn with_maximum_age(mut self, maximum_age: Duration) -> Self {
        self.maximum_age = maximum_age;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Reading {
    Waiting,
    Fix { coordinates: Coordinates, at: Instant },
    Failed(String),
}

/// Position source fed by the platform
#[derive(Debug)]
pub struct LocationService {
    config: LocationConfig,
    permission: watch::Sender<PermissionStatus>,
    reading: watch::Sender<Reading>,
}

impl LocationService {
    /// Create a service with no permission decision and no fix
    pub fn new(config: LocationConfig) -> Self {
        let (permission, _) = watch::channel(PermissionStatus::Undetermined);
        let (reading, _) = watch::channel(Reading::Waiting);
        Self {
            config,
            permission,
            reading,
        }
    }

    /// Record the OS permission status
    pub fn set_permission(&self, status: PermissionStatus) {
        tracing::debug!(?status, "location permission updated");
        self.permission.send_replace(status);
    }

    /// Current permission status
    pub fn permission(&self) -> PermissionStatus {
        *self.permission.borrow()
    }

    /// Record a new position fix
    pub fn update_position(&self, coordinates: Coordinates) {
        self.reading.send_replace(Reading::Fix {
            coordinates,
            at: Instant::now(),
        });
    }

    /// Record a provider failure (hardware error, services disabled)
    pub fn report_failure(&self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!("Location provider failure: {}", reason);
        self.reading.send_replace(Reading::Failed(reason));
    }

    /// Most recent fix, regardless of age
    pub fn last_known(&self) -> Option<Coordinates> {
        match &*self.reading.borrow() {
            Reading::Fix { coordinates, .. } => Some(*coordinates),
            _ => None,
        }
    }

    fn fresh_fix(&self, reading: &Reading) -> Option<Coordinates> {
        match reading {
            Reading::Fix { coordinates, at } if at.elapsed() <= self.config.maximum_age => {
                Some(*coordinates)
            }
            _ => None,
        }
    }

    async fn next_fix(&self) -> Result<Coordinates, LocationError> {
        let mut reading = self.reading.subscribe();
        let mut permission = self.permission.subscribe();
        reading.borrow_and_update();

        loop {
            tokio::select! {
                changed = reading.changed() => {
                    if changed.is_err() {
                        return Err(LocationError::Unavailable("location service stopped".to_string()));
                    }
                    match &*reading.borrow_and_update() {
                        Reading::Fix { coordinates, .. } => return Ok(*coordinates),
                        Reading::Failed(reason) => return Err(LocationError::Unavailable(reason.clone())),
                        Reading::Waiting => {}
                    }
                }
                changed = permission.changed() => {
                    if changed.is_ok() && permission.borrow_and_update().is_refused() {
                        return Err(LocationError::PermissionDenied);
                    }
                }
            }
        }
    }
}

impl Default for LocationService {
    fn default() -> Self {
        Self::new(LocationConfig::default())
    }
}

#[async_trait]
impl GeolocationProvider for LocationService {
    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        if self.permission().is_refused() {
            return Err(LocationError::PermissionDenied);
        }
        if let Some(coordinates) = self.fresh_fix(&self.reading.borrow()) {
            return Ok(coordinates);
        }

        tokio::time::timeout(self.config.timeout, self.next_fix())
            .await
            .map_err(|_| LocationError::Timeout)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn granted_service() -> Arc<LocationService> {
        let service = LocationService::new(
            LocationConfig::default()
                .with_timeout(Duration::from_secs(5))
                .with_maximum_age(Duration::from_secs(60)),
        );
        service.set_permission(PermissionStatus::Granted);
        Arc::new(service)
    }

    #[tokio::test]
    async fn test_refused_permission_fails_fast() {
        let service = LocationService::default();
        service.update_position(Coordinates::new(1.0, 2.0));

        for status in [PermissionStatus::Denied, PermissionStatus::Blocked] {
            service.set_permission(status);
            assert_eq!(
                service.current_position().await,
                Err(LocationError::PermissionDenied)
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_fix_is_returned_immediately() {
        let service = granted_service();
        service.update_position(Coordinates::new(36.6, -121.9));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(
            service.current_position().await,
            Ok(Coordinates::new(36.6, -121.9))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_fix_waits_for_next() {
        let service = granted_service();
        service.update_position(Coordinates::new(0.0, 0.0));
        tokio::time::sleep(Duration::from_secs(120)).await;

        let feeder = Arc::clone(&service);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            feeder.update_position(Coordinates::new(12.15, -68.27));
        });

        assert_eq!(
            service.current_position().await,
            Ok(Coordinates::new(12.15, -68.27))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_without_fix() {
        let service = granted_service();
        assert_eq!(service.current_position().await, Err(LocationError::Timeout));
        assert_eq!(service.last_known(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_while_waiting() {
        let service = granted_service();
        let feeder = Arc::clone(&service);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            feeder.report_failure("location services disabled");
        });

        assert_eq!(
            service.current_position().await,
            Err(LocationError::Unavailable("location services disabled".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_denial_while_waiting() {
        let service = Arc::new(LocationService::default());
        let feeder = Arc::clone(&service);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            feeder.set_permission(PermissionStatus::Denied);
        });

        assert_eq!(
            service.current_position().await,
            Err(LocationError::PermissionDenied)
        );
    }

    #[test]
    fn test_permission_status_serde() {
        let status: PermissionStatus = serde_json::from_str("\"blocked\"").unwrap();
        assert_eq!(status, PermissionStatus::Blocked);
        assert!(status.is_refused());
        assert!(!PermissionStatus::Undetermined.is_refused());
    }
}
