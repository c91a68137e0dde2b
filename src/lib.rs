//! Zentacle location search
//!
//! Wires the typeahead controller to the Zentacle search API, the device's
//! connectivity and location services, and the offline dive site index.
//!
//! ```no_run
//! use zentacle::{LocationSearchStack, StackConfig};
//!
//! # async fn example() -> Result<(), zentacle::StackError> {
//! let (stack, mut events) = LocationSearchStack::new(StackConfig::default())?;
//! stack.controller().activate(None);
//! stack.controller().on_text_changed("lovers point");
//! while let Some(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub use app_core;
pub use app_platform;
pub use places_client;

pub use app_core::{
    ModalEvent, PlaceCandidate, SelectedLocation, SuggestionRow, TypeaheadConfig,
    TypeaheadController,
};
pub use app_platform::{ConnectionType, NetworkState, PermissionStatus};

use app_core::offline_index::OfflineIndexError;
use app_core::{OfflinePlaceIndex, PlaceSearchService, TypeaheadProviders};
use app_platform::{ConnectivityMonitor, LocationConfig, LocationService};
use places_client::{ApiClient, ApiClientConfig, ApiError};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors while assembling the location search stack
#[derive(Debug, Error)]
pub enum StackError {
    /// HTTP client could not be built
    #[error("API client error: {0}")]
    Api(#[from] ApiError),

    /// Offline dataset could not be loaded
    #[error("Offline index error: {0}")]
    OfflineIndex(#[from] OfflineIndexError),
}

/// Configuration for [`LocationSearchStack`]
#[derive(Debug, Clone)]
pub struct StackConfig {
    /// Search API client settings
    pub api: ApiClientConfig,
    /// Debounce and category settings
    pub typeahead: TypeaheadConfig,
    /// Geolocation timeout and cache age
    pub location: LocationConfig,
    /// Connectivity assumed until the platform reports otherwise
    pub initial_network: NetworkState,
    /// JSON dataset for the offline index; empty index when unset
    pub offline_dataset: Option<PathBuf>,
    /// Maximum offline results per lookup
    pub offline_limit: Option<usize>,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            api: ApiClientConfig::default(),
            typeahead: TypeaheadConfig::default(),
            location: LocationConfig::default(),
            initial_network: NetworkState::online(ConnectionType::Unknown),
            offline_dataset: None,
            offline_limit: None,
        }
    }
}

impl StackConfig {
    /// Set the API client configuration
    pub fn with_api(mut self, api: ApiClientConfig) -> Self {
        self.api = api;
        self
    }

    /// Set the typeahead configuration
    pub fn with_typeahead(mut self, typeahead: TypeaheadConfig) -> Self {
        self.typeahead = typeahead;
        self
    }

    /// Set the geolocation configuration
    pub fn with_location(mut self, location: LocationConfig) -> Self {
        self.location = location;
        self
    }

    /// Set the initial connectivity state
    pub fn with_initial_network(mut self, state: NetworkState) -> Self {
        self.initial_network = state;
        self
    }

    /// Load the offline index from a JSON dataset
    pub fn with_offline_dataset(mut self, path: impl Into<PathBuf>) -> Self {
        self.offline_dataset = Some(path.into());
        self
    }

    /// Cap offline results per lookup
    pub fn with_offline_limit(mut self, limit: usize) -> Self {
        self.offline_limit = Some(limit);
        self
    }
}

/// A typeahead controller with production collaborators attached
///
/// The platform layer reaches [`connectivity`](Self::connectivity) and
/// [`location`](Self::location) to feed device updates in.
#[derive(Debug, Clone)]
pub struct LocationSearchStack {
    controller: TypeaheadController,
    connectivity: Arc<ConnectivityMonitor>,
    location: Arc<LocationService>,
    client: Arc<ApiClient>,
}

impl LocationSearchStack {
    /// Build the stack and return the receiver for host events
    pub fn new(
        config: StackConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ModalEvent>), StackError> {
        let client = Arc::new(ApiClient::new(config.api)?);
        let connectivity = Arc::new(ConnectivityMonitor::new(config.initial_network));
        let location = Arc::new(LocationService::new(config.location));

        let mut offline = match &config.offline_dataset {
            Some(path) => OfflinePlaceIndex::load(path)?,
            None => OfflinePlaceIndex::new(Vec::new()),
        };
        if let Some(limit) = config.offline_limit {
            offline = offline.with_limit(limit);
        }

        let providers = TypeaheadProviders {
            geolocation: location.clone(),
            network: connectivity.clone(),
            remote: Arc::new(PlaceSearchService::new(client.clone())),
            offline: Arc::new(offline),
        };
        let (controller, events) = TypeaheadController::new(providers, config.typeahead);

        tracing::debug!(base_url = %client.base_url(), "location search stack ready");

        Ok((
            Self {
                controller,
                connectivity,
                location,
                client,
            },
            events,
        ))
    }

    /// The typeahead controller
    pub fn controller(&self) -> &TypeaheadController {
        &self.controller
    }

    /// Connectivity state fed by the platform
    pub fn connectivity(&self) -> &ConnectivityMonitor {
        &self.connectivity
    }

    /// Location service fed by the platform
    pub fn location(&self) -> &LocationService {
        &self.location
    }

    /// Search API client
    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}
