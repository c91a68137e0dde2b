//! Collaborator contracts consumed by the location typeahead
//!
//! The controller never talks to platform services directly. Geolocation,
//! connectivity, remote search, and the offline dataset are injected through
//! these traits so hosts can wire real implementations and tests can use fakes.

use async_trait::async_trait;
use thiserror::Error;

use crate::places::{Coordinates, PlaceCandidate};

/// Errors from a geolocation provider
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    /// The user denied (or never granted) location access
    #[error("Location permission denied")]
    PermissionDenied,

    /// No fix arrived within the provider's timeout
    #[error("Location request timed out")]
    Timeout,

    /// Hardware or platform failure
    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

/// Errors from a remote search client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The request never completed (transport failure, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// The service answered with a non-success status or an unreadable body
    #[error("Service error ({status}): {message}")]
    Service {
        /// HTTP status code
        status: u16,
        /// Error message from the service
        message: String,
    },
}

/// Which places a free-text search should score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    /// Only dive sites (beaches)
    #[default]
    DiveSites,
    /// Every place kind the service knows
    Any,
}

/// Device position source
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    /// Resolve the current device coordinates
    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// Connectivity source
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NetworkStatusProvider: Send + Sync {
    /// Whether the device currently has a network connection
    async fn is_connected(&self) -> bool;
}

/// Remote place search service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteSearchClient: Send + Sync {
    /// Places near a coordinate, ranked by the service
    async fn search_nearby(&self, coordinates: Coordinates)
        -> Result<Vec<PlaceCandidate>, SearchError>;

    /// Places matching free text within a category
    async fn search_text(
        &self,
        query: &str,
        category: CategoryFilter,
    ) -> Result<Vec<PlaceCandidate>, SearchError>;
}

/// Local dataset used while offline
///
/// Lookups are synchronous and cannot fail; no match yields an empty list.
#[cfg_attr(test, mockall::automock)]
pub trait OfflineSearchIndex: Send + Sync {
    /// Places matching free text
    fn search(&self, query: &str) -> Vec<PlaceCandidate>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_error_display() {
        assert_eq!(
            LocationError::PermissionDenied.to_string(),
            "Location permission denied"
        );
        assert_eq!(
            LocationError::Unavailable("gps off".to_string()).to_string(),
            "Location unavailable: gps off"
        );
    }

    #[test]
    fn test_search_error_display() {
        let err = SearchError::Service {
            status: 502,
            message: "Bad Gateway".to_string(),
        };
        assert_eq!(err.to_string(), "Service error (502): Bad Gateway");
        assert_eq!(
            SearchError::Network("timed out".to_string()).to_string(),
            "Network error: timed out"
        );
    }

    #[test]
    fn test_category_filter_default() {
        assert_eq!(CategoryFilter::default(), CategoryFilter::DiveSites);
    }

    #[tokio::test]
    async fn test_mock_geolocation() {
        let mut geo = MockGeolocationProvider::new();
        geo.expect_current_position()
            .returning(|| Err(LocationError::Timeout));

        assert_eq!(geo.current_position().await, Err(LocationError::Timeout));
    }
}
