//! Zentacle place search API client
//!
//! This crate provides the HTTP client used to query dive sites and other
//! places by free text or by coordinates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod typeahead;

pub use api::{ApiClient, ApiClientConfig, ApiError, ApiRequest, ApiResponse};
pub use typeahead::{PlaceData, PlaceId, TypeaheadQuery, TypeaheadResponse};
