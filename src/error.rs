//! Error types for the weather pipeline.
//!
//! `FetchError` is what the fetch client reports to the dashboard panel.
//! `ProxyError` is what the proxy endpoint turns into an HTTP response.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::ProviderKind;

// ---

/// Failures of a single fetch cycle in the weather fetch client.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The host location capability is absent or refused.
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    #[error("Invalid coordinates: latitude must be -90 to 90, longitude must be -180 to 180")]
    InvalidCoordinates,

    #[error("City name must not be empty")]
    EmptyCity,

    /// The proxy endpoint only accepts coordinates.
    #[error("Lookup by city name is not supported by the {0} provider")]
    CityLookupUnsupported(ProviderKind),

    /// Upstream answered with a non-2xx status.
    #[error("Upstream request failed with status {status}: {}", truncate_body(.body))]
    UpstreamRequestFailed { status: u16, body: String },

    /// Upstream answered 2xx but a block the record needs is missing.
    #[error("Upstream payload incomplete: missing `{0}`")]
    UpstreamPayloadIncomplete(String),

    #[error("Upstream payload could not be decoded: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// Transport failure. Built from errors with the URL stripped, since the
    /// query string may carry a credential.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl FetchError {
    pub fn incomplete(field: &str) -> Self {
        FetchError::UpstreamPayloadIncomplete(field.to_string())
    }
}

/// Failures of the proxy endpoint, one variant per HTTP outcome.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Weather API key is not configured")]
    Configuration,

    #[error("{0}")]
    Validation(String),

    #[error("Weather API request failed")]
    Upstream { status: StatusCode, details: Value },

    #[error("Failed to fetch weather data")]
    Internal(String),

    #[error("Method Not Allowed")]
    MethodNotAllowed,
}

/// JSON error body: `{ "error": ..., "details": ... }`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Configuration | ProxyError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProxyError::Validation(_) => StatusCode::BAD_REQUEST,
            ProxyError::Upstream { status, .. } => *status,
            ProxyError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        }
    }

    fn body(self) -> ErrorBody {
        let error = self.to_string();
        let details = match self {
            ProxyError::Upstream { details, .. } => Some(details),
            ProxyError::Internal(msg) => Some(Value::String(msg)),
            _ => None,
        };
        ErrorBody { error, details }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        // ---
        let status = self.status();
        (status, Json(self.body())).into_response()
    }
}

/// Keep upstream bodies readable in log lines and error messages.
pub fn truncate_body(body: &str) -> String {
    // ---
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_proxy_error_status_mapping() {
        // ---
        assert_eq!(
            ProxyError::Configuration.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ProxyError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ProxyError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );

        let upstream = ProxyError::Upstream {
            status: StatusCode::SERVICE_UNAVAILABLE,
            details: Value::Null,
        };
        assert_eq!(upstream.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_error_body_details() {
        // ---
        let body = ProxyError::Internal("connection reset".into()).body();
        assert_eq!(body.error, "Failed to fetch weather data");
        assert_eq!(body.details, Some(Value::String("connection reset".into())));

        let body = ProxyError::Validation("Missing required parameters: lat and lon".into()).body();
        assert!(body.details.is_none());
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_truncate_body() {
        // ---
        assert_eq!(truncate_body("short"), "short");

        let long = "é".repeat(150);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= 203);
    }
}
