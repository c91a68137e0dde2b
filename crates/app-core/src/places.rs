//! Place candidates and the remote place search service
//!
//! This module defines the values that flow through the location typeahead
//! (search candidates and the confirmed selection) and adapts the place
//! search API client to the [`RemoteSearchClient`] contract.

use async_trait::async_trait;
use places_client::{ApiClient, ApiError, TypeaheadQuery, TypeaheadResponse};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::providers::{CategoryFilter, RemoteSearchClient, SearchError};
use crate::suggestion_list::SENTINEL_KEY;

/// Latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude
    pub latitude: f64,
    /// Longitude
    pub longitude: f64,
}

impl Coordinates {
    /// Create a coordinate pair
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A single search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceCandidate {
    /// Opaque id, unique per source
    pub id: String,
    /// Main display text
    pub primary_text: String,
    /// Secondary display text (city, region)
    #[serde(default)]
    pub secondary_text: String,
    /// Position, when the place is resolvable
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    /// Stable list identity (the source URL)
    pub key: String,
}

impl PlaceCandidate {
    /// Create a candidate without secondary text or coordinates
    pub fn new(
        id: impl Into<String>,
        primary_text: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            primary_text: primary_text.into(),
            secondary_text: String::new(),
            coordinates: None,
            key: key.into(),
        }
    }

    /// Set the secondary display text
    pub fn with_secondary_text(mut self, text: impl Into<String>) -> Self {
        self.secondary_text = text.into();
        self
    }

    /// Set the coordinates
    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.coordinates = Some(Coordinates::new(latitude, longitude));
        self
    }
}

impl From<TypeaheadResponse> for PlaceCandidate {
    fn from(row: TypeaheadResponse) -> Self {
        let id = row.id.to_string();
        let key = match row.url {
            Some(url) if !url.trim().is_empty() => url,
            _ => format!("{}:{}", row.kind.as_deref().unwrap_or("place"), id),
        };
        let coordinates = row
            .data
            .and_then(|data| Some(Coordinates::new(data.latitude?, data.longitude?)));

        Self {
            id,
            primary_text: row.text,
            secondary_text: row.subtext.unwrap_or_default(),
            coordinates,
            key,
        }
    }
}

/// The confirmed location handed back to the dive log form
///
/// Serialized with the field names the dive log form stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedLocation {
    /// Id of the selected place
    #[serde(rename = "beach_id")]
    pub external_id: String,
    /// Place name
    #[serde(rename = "desc")]
    pub description: String,
    /// City/region label
    #[serde(rename = "location_city")]
    pub city_label: String,
    /// Latitude
    #[serde(rename = "lat")]
    pub latitude: f64,
    /// Longitude
    #[serde(rename = "lng")]
    pub longitude: f64,
}

impl SelectedLocation {
    /// Build a selection from a candidate, if it carries coordinates
    pub fn from_candidate(candidate: &PlaceCandidate) -> Option<Self> {
        let coordinates = candidate.coordinates?;
        Some(Self {
            external_id: candidate.id.clone(),
            description: candidate.primary_text.clone(),
            city_label: candidate.secondary_text.clone(),
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
        })
    }
}

/// Drop candidates that cannot be rendered as list rows
///
/// Removes blank primary text, repeated keys (first wins), and keys that
/// would collide with the sentinel row. Order is otherwise preserved.
pub fn normalize_candidates(candidates: Vec<PlaceCandidate>) -> Vec<PlaceCandidate> {
    let mut seen = HashSet::with_capacity(candidates.len());
    let before = candidates.len();

    let normalized: Vec<PlaceCandidate> = candidates
        .into_iter()
        .filter(|c| {
            !c.primary_text.trim().is_empty()
                && !c.key.is_empty()
                && c.key != SENTINEL_KEY
                && seen.insert(c.key.clone())
        })
        .collect();

    if normalized.len() != before {
        tracing::debug!(
            dropped = before - normalized.len(),
            "dropped unrenderable place candidates"
        );
    }

    normalized
}

impl From<ApiError> for SearchError {
    fn from(err: ApiError) -> Self {
        if err.is_transport_error() {
            SearchError::Network(err.message().to_string())
        } else {
            SearchError::Service {
                status: err.status(),
                message: err.message().to_string(),
            }
        }
    }
}

/// Remote place search backed by the Zentacle API
#[derive(Debug, Clone)]
pub struct PlaceSearchService {
    client: Arc<ApiClient>,
}

impl PlaceSearchService {
    /// Create a new place search service
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RemoteSearchClient for PlaceSearchService {
    async fn search_nearby(
        &self,
        coordinates: Coordinates,
    ) -> Result<Vec<PlaceCandidate>, SearchError> {
        let rows = self
            .client
            .typeahead_nearby(coordinates.latitude, coordinates.longitude)
            .await?;

        Ok(rows.into_iter().map(PlaceCandidate::from).collect())
    }

    async fn search_text(
        &self,
        query: &str,
        category: CategoryFilter,
    ) -> Result<Vec<PlaceCandidate>, SearchError> {
        let rows = self
            .client
            .typeahead(TypeaheadQuery {
                query: query.trim(),
                beach_only: category == CategoryFilter::DiveSites,
            })
            .await?;

        Ok(rows.into_iter().map(PlaceCandidate::from).collect())
    }
}
