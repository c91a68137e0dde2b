//! HTTP client for the Zentacle REST API
//!
//! This module provides request/response types, error handling, and the core
//! HTTP client with retry logic used by the place search endpoints.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

// =============================================================================
// Error Types
// =============================================================================

/// API error with HTTP status and message
///
/// Transport failures (no response at all) use status `0`.
///
/// # Examples
/// ```
/// use places_client::api::ApiError;
///
/// let error = ApiError::new(404, "NotFound", "Beach not found");
/// assert_eq!(error.status(), 404);
/// assert!(!error.is_network_error());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code
    status: u16,
    /// Error code (e.g., "NotFound", "NetworkError")
    error: String,
    /// Human-readable error message
    message: String,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: u16, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            message: message.into(),
        }
    }

    /// Create a transport-level error (no HTTP response was received)
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(0, "NetworkError", message)
    }

    /// Get the HTTP status code
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Get the error code
    pub fn error(&self) -> &str {
        &self.error
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check if this is a network-related error that should be retried
    ///
    /// Network failure statuses: 0, 408, 425, 429, 500, 502, 503, 504, 522, 524
    pub fn is_network_error(&self) -> bool {
        matches!(
            self.status,
            0 | 408 | 425 | 429 | 500 | 502 | 503 | 504 | 522 | 524
        )
    }

    /// Check if the request never reached the server
    pub fn is_transport_error(&self) -> bool {
        self.status == 0
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "API error {}: {} - {}",
            self.status, self.error, self.message
        )
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Request Types
// =============================================================================

/// GET request against a path below the API base URL
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Path relative to the base URL (e.g., "search/typeahead")
    pub path: String,
    /// Query parameters, in insertion order
    pub params: Vec<(String, String)>,
    /// Request headers
    pub headers: HashMap<String, String>,
}

impl ApiRequest {
    /// Create a new GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            params: Vec::new(),
            headers: HashMap::new(),
        }
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Add a header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Look up a query parameter by name
    pub fn param_value(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// API response with status, headers, and decoded body
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HashMap<String, String>,
    /// Response data
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Create a new response
    pub fn new(status: u16, headers: HashMap<String, String>, data: T) -> Self {
        Self {
            status,
            headers,
            data,
        }
    }

    /// Get a header value
    pub fn header(&self, key: &str) -> Option<&String> {
        self.headers.get(key)
    }
}

/// Error body returned by the API on failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Error code
    #[serde(default)]
    pub error: String,
    /// Error message
    #[serde(default, alias = "msg")]
    pub message: String,
}

// =============================================================================
// Client Configuration
// =============================================================================

/// Configuration for the API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base service URL (e.g., "https://www.zentacle.com/api")
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
    /// Custom headers to include in all requests
    pub default_headers: HashMap<String, String>,
    /// Retries for network-class failures (0 disables retrying)
    pub max_retries: usize,
    /// Pause before the first retry; doubles on each further retry
    pub retry_delay: Duration,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.zentacle.com/api".to_string(),
            timeout: Duration::from_secs(15),
            user_agent: format!("Zentacle/{}", env!("CARGO_PKG_VERSION")),
            default_headers: HashMap::new(),
            max_retries: 1,
            retry_delay: Duration::from_millis(200),
        }
    }
}

impl ApiClientConfig {
    /// Create a new config with a base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a default header
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set the retry count for network-class failures
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the pause before the first retry
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }
}


// =============================================================================
// Retries
// =============================================================================

use std::future::Future;

/// Longest pause between two attempts
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Pause before retry number `retry` (0-based)
///
/// Doubles from `base` on each retry and never exceeds [`MAX_RETRY_DELAY`].
pub fn backoff_delay(base: Duration, retry: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(retry))
        .min(MAX_RETRY_DELAY)
}

/// Run `attempt`, retrying network-class [`ApiError`]s
///
/// Client errors (4xx other than 408/425/429) and parse errors are returned
/// on the first failure.
pub async fn with_retries<T, F, Fut>(
    max_retries: usize,
    base_delay: Duration,
    mut attempt: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut retries = 0u32;
    loop {
        match attempt().await {
            Err(err) if err.is_network_error() && (retries as usize) < max_retries => {
                let delay = backoff_delay(base_delay, retries);
                tracing::debug!(status = err.status(), ?delay, "retrying place search request");
                tokio::time::sleep(delay).await;
                retries += 1;
            }
            outcome => return outcome,
        }
    }
}


// =============================================================================
// API Client Implementation
// =============================================================================

use reqwest::{Client as ReqwestClient, Response as ReqwestResponse};

/// Client for GET endpoints of the Zentacle API
///
/// # Examples
/// ```no_run
/// use places_client::api::{ApiClient, ApiClientConfig, ApiRequest};
///
/// async fn example() -> Result<(), Box<dyn std::error::Error>> {
///     let client = ApiClient::new(ApiClientConfig::default())?;
///     let request = ApiRequest::get("search/typeahead").param("query", "reef");
///     let response = client.get::<serde_json::Value>(request).await?;
///     println!("{}", response.data);
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: ReqwestClient,
    config: ApiClientConfig,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(config: ApiClientConfig) -> Result<Self, ApiError> {
        let client = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| ApiError::new(0, "ClientError", format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Issue a GET request, retrying network-class failures per the config
    pub async fn get<T>(&self, request: ApiRequest) -> Result<ApiResponse<T>, ApiError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let request = &request;
        with_retries(self.config.max_retries, self.config.retry_delay, || {
            self.execute_request(request)
        })
        .await
    }

    fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn execute_request<T>(&self, request: &ApiRequest) -> Result<ApiResponse<T>, ApiError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = self.url_for(&request.path);
        let mut req = self.client.get(&url).query(&request.params);

        for (key, value) in &self.config.default_headers {
            req = req.header(key, value);
        }
        for (key, value) in &request.headers {
            req = req.header(key, value);
        }

        let response = req
            .send()
            .await
            .map_err(|e| ApiError::transport(format!("Request failed: {}", e)))?;

        self.parse_response(response).await
    }

    async fn parse_response<T>(&self, response: ReqwestResponse) -> Result<ApiResponse<T>, ApiError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let status = response.status().as_u16();

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                headers.insert(key.to_string(), value_str.to_string());
            }
        }

        if !response.status().is_success() {
            let error_body = response.text().await.unwrap_or_default();

            return Err(match serde_json::from_str::<ApiErrorResponse>(&error_body) {
                Ok(body) if !body.error.is_empty() || !body.message.is_empty() => {
                    let code = if body.error.is_empty() { "Unknown".to_string() } else { body.error };
                    ApiError::new(status, code, body.message)
                }
                _ => ApiError::new(status, "Unknown", format!("HTTP {}: {}", status, error_body)),
            });
        }

        let body = response.text().await.map_err(|e| {
            ApiError::new(0, "ParseError", format!("Failed to read response: {}", e))
        })?;

        let data: T = serde_json::from_str(&body).map_err(|e| {
            ApiError::new(status, "ParseError", format!("Failed to parse JSON: {}", e))
        })?;

        Ok(ApiResponse::new(status, headers, data))
    }

    /// Get the client configuration
    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }
}

#[cfg(test)]
mod client_tests {
    use super::*;

    #[test]
    fn test_api_client_new() {
        let config = ApiClientConfig::new("https://staging.example/")
            .with_timeout(Duration::from_secs(3))
            .with_user_agent("Zentacle-Test/0.0");

        let client = ApiClient::new(config).unwrap();
        assert_eq!(client.base_url(), "https://staging.example/");
        assert_eq!(client.config().timeout, Duration::from_secs(3));
        assert_eq!(client.config().user_agent, "Zentacle-Test/0.0");
    }

    #[test]
    fn test_url_for_joins_slashes() {
        let client = ApiClient::new(ApiClientConfig::new("https://staging.example/api/")).unwrap();
        assert_eq!(
            client.url_for("/search/typeahead"),
            "https://staging.example/api/search/typeahead"
        );
        assert_eq!(
            client.url_for("search/typeahead/nearby"),
            "https://staging.example/api/search/typeahead/nearby"
        );
    }
}
