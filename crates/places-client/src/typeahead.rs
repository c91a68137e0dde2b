//! Typeahead endpoints of the place search API
//!
//! Both endpoints return a bare JSON array of [`TypeaheadResponse`] rows.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::{ApiClient, ApiError, ApiRequest};

/// Free-text typeahead endpoint
pub const TYPEAHEAD_PATH: &str = "search/typeahead";

/// Coordinate-based typeahead endpoint
pub const TYPEAHEAD_NEARBY_PATH: &str = "search/typeahead/nearby";

/// Identifier of a typeahead row
///
/// The API returns numeric ids for beaches and string ids for other
/// place kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PlaceId {
    /// Numeric id
    Int(i64),
    /// String id
    Text(String),
}

impl fmt::Display for PlaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceId::Int(id) => write!(f, "{}", id),
            PlaceId::Text(id) => f.write_str(id),
        }
    }
}

/// Location payload attached to a typeahead row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceData {
    /// Latitude in degrees
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude in degrees
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// One row returned by the typeahead endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeaheadResponse {
    /// Place id
    pub id: PlaceId,
    /// Main display text (site name)
    #[serde(default)]
    pub text: String,
    /// Secondary display text (city, region)
    #[serde(default)]
    pub subtext: Option<String>,
    /// Canonical page URL of the place
    #[serde(default)]
    pub url: Option<String>,
    /// Place kind (e.g., "site", "locality")
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Coordinates
    #[serde(default)]
    pub data: Option<PlaceData>,
}

/// Search scope for free-text typeahead queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeaheadQuery<'a> {
    /// User-entered text
    pub query: &'a str,
    /// Restrict results to dive sites (beaches)
    pub beach_only: bool,
}

fn python_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

impl ApiClient {
    /// Free-text typeahead search
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use places_client::{ApiClient, ApiClientConfig, TypeaheadQuery};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = ApiClient::new(ApiClientConfig::default())?;
    /// let rows = client
    ///     .typeahead(TypeaheadQuery { query: "blue heron", beach_only: true })
    ///     .await?;
    /// for row in rows {
    ///     println!("{}", row.text);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn typeahead(
        &self,
        query: TypeaheadQuery<'_>,
    ) -> Result<Vec<TypeaheadResponse>, ApiError> {
        let request = ApiRequest::get(TYPEAHEAD_PATH)
            .param("query", query.query)
            .param("beach_only", python_bool(query.beach_only));

        Ok(self.get::<Vec<TypeaheadResponse>>(request).await?.data)
    }

    /// Typeahead rows near a coordinate
    pub async fn typeahead_nearby(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<TypeaheadResponse>, ApiError> {
        let request = ApiRequest::get(TYPEAHEAD_NEARBY_PATH)
            .param("latitude", latitude.to_string())
            .param("longitude", longitude.to_string());

        Ok(self.get::<Vec<TypeaheadResponse>>(request).await?.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_row() {
        let json = r#"{
            "id": 42,
            "text": "Blue Heron Bridge",
            "subtext": "Riviera Beach, Florida",
            "url": "/Beach/42/blue-heron-bridge",
            "type": "site",
            "data": {"latitude": 26.7839, "longitude": -80.0419}
        }"#;

        let row: TypeaheadResponse = serde_json::from_str(json).unwrap();
        assert_eq!(row.id, PlaceId::Int(42));
        assert_eq!(row.text, "Blue Heron Bridge");
        assert_eq!(row.subtext.as_deref(), Some("Riviera Beach, Florida"));
        assert_eq!(row.url.as_deref(), Some("/Beach/42/blue-heron-bridge"));
        assert_eq!(row.kind.as_deref(), Some("site"));
        let data = row.data.unwrap();
        assert_eq!(data.latitude, Some(26.7839));
        assert_eq!(data.longitude, Some(-80.0419));
    }

    #[test]
    fn test_parse_sparse_row() {
        let row: TypeaheadResponse =
            serde_json::from_str(r#"{"id": "ChIJ123", "text": "Monterey"}"#).unwrap();
        assert_eq!(row.id, PlaceId::Text("ChIJ123".to_string()));
        assert!(row.subtext.is_none());
        assert!(row.url.is_none());
        assert!(row.data.is_none());
    }

    #[test]
    fn test_place_id_display() {
        assert_eq!(PlaceId::Int(7).to_string(), "7");
        assert_eq!(PlaceId::Text("abc".to_string()).to_string(), "abc");
    }

    #[test]
    fn test_python_bool() {
        assert_eq!(python_bool(true), "True");
        assert_eq!(python_bool(false), "False");
    }
}
