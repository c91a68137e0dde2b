//! Integration tests for the typeahead endpoints
//!
//! These tests use wiremock to stand in for the place search API and cover
//! query encoding, response decoding, and error mapping.

use places_client::{ApiClient, ApiClientConfig, PlaceId, TypeaheadQuery};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    let config = ApiClientConfig::new(server.uri())
        .with_timeout(Duration::from_secs(5))
        .with_max_retries(0);
    ApiClient::new(config).unwrap()
}

// =============================================================================
// Successful Request Tests
// =============================================================================

#[tokio::test]
async fn test_typeahead_sends_query_and_beach_filter() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/typeahead"))
        .and(query_param("query", "blue heron"))
        .and(query_param("beach_only", "True"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 42,
                "text": "Blue Heron Bridge",
                "subtext": "Riviera Beach, Florida",
                "url": "/Beach/42/blue-heron-bridge",
                "type": "site",
                "data": {"latitude": 26.7839, "longitude": -80.0419}
            }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let rows = client
        .typeahead(TypeaheadQuery { query: "blue heron", beach_only: true })
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, PlaceId::Int(42));
    assert_eq!(rows[0].text, "Blue Heron Bridge");
}

#[tokio::test]
async fn test_typeahead_nearby_sends_coordinates() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/typeahead/nearby"))
        .and(query_param("latitude", "36.6"))
        .and(query_param("longitude", "-121.9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "text": "Lovers Point", "url": "/Beach/1/lovers-point"},
            {"id": 2, "text": "Breakwater", "url": "/Beach/2/breakwater"}
        ])))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let rows = client.typeahead_nearby(36.6, -121.9).await.unwrap();

    let names: Vec<&str> = rows.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(names, vec!["Lovers Point", "Breakwater"]);
}

#[tokio::test]
async fn test_empty_result_set() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/typeahead"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let rows = client
        .typeahead(TypeaheadQuery { query: "zzz", beach_only: true })
        .await
        .unwrap();

    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_default_headers_are_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/typeahead"))
        .and(wiremock::matchers::header("X-Client", "mobile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ApiClientConfig::new(mock_server.uri())
        .with_header("X-Client", "mobile")
        .with_max_retries(0);
    let client = ApiClient::new(config).unwrap();

    client
        .typeahead(TypeaheadQuery { query: "reef", beach_only: false })
        .await
        .unwrap();
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[tokio::test]
async fn test_server_error_maps_status_and_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/typeahead"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "BadRequest",
            "message": "query is required"
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .typeahead(TypeaheadQuery { query: "", beach_only: true })
        .await
        .unwrap_err();

    assert_eq!(err.status(), 400);
    assert_eq!(err.error(), "BadRequest");
    assert_eq!(err.message(), "query is required");
}

#[tokio::test]
async fn test_non_json_error_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/typeahead"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .typeahead(TypeaheadQuery { query: "reef", beach_only: true })
        .await
        .unwrap_err();

    assert_eq!(err.status(), 404);
    assert_eq!(err.error(), "Unknown");
    assert!(err.message().contains("Not Found"));
}

#[tokio::test]
async fn test_malformed_success_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/typeahead"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .typeahead(TypeaheadQuery { query: "reef", beach_only: true })
        .await
        .unwrap_err();

    assert_eq!(err.error(), "ParseError");
}

#[tokio::test]
async fn test_service_unavailable_is_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/typeahead"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = ApiClientConfig::new(mock_server.uri())
        .with_max_retries(2)
        .with_retry_delay(Duration::from_millis(10));
    let client = ApiClient::new(config).unwrap();

    let err = client
        .typeahead(TypeaheadQuery { query: "reef", beach_only: true })
        .await
        .unwrap_err();

    assert_eq!(err.status(), 503);
    assert!(err.is_network_error());
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    let config = ApiClientConfig::new("http://127.0.0.1:1")
        .with_timeout(Duration::from_secs(2))
        .with_max_retries(0);
    let client = ApiClient::new(config).unwrap();

    let err = client.typeahead_nearby(0.0, 0.0).await.unwrap_err();

    assert!(err.is_transport_error());
    assert_eq!(err.error(), "NetworkError");
}
