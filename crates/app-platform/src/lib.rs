//! Device services for Zentacle
//!
//! The native shell feeds connectivity and location updates into the types
//! here; they implement the provider traits the typeahead controller consumes.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod connectivity;
pub mod geolocation;

pub use connectivity::{ConnectionType, ConnectivityMonitor, NetworkState};
pub use geolocation::{LocationConfig, LocationService, PermissionStatus};
