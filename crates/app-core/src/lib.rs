//! Core application logic for Zentacle
//!
//! This crate contains the dive site location picker: place candidates,
//! the collaborator contracts it consumes, the offline place index, and
//! the typeahead controller that ties them together.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod debounce;
pub mod offline_index;
pub mod places;
pub mod providers;
pub mod suggestion_list;
pub mod typeahead;

pub use offline_index::OfflinePlaceIndex;
pub use places::{Coordinates, PlaceCandidate, PlaceSearchService, SelectedLocation};
pub use providers::{
    CategoryFilter, GeolocationProvider, LocationError, NetworkStatusProvider,
    OfflineSearchIndex, RemoteSearchClient, SearchError,
};
pub use suggestion_list::{SuggestionRow, SENTINEL_KEY};
pub use typeahead::{
    ModalEvent, QueryState, TypeaheadConfig, TypeaheadController, TypeaheadError,
    TypeaheadProviders,
};
