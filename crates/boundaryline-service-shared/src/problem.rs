//! RFC 9457 Problem Details for HTTP APIs.
//!
//! Provides structured error responses following the Problem Details
//! standard. See: <https://www.rfc-editor.org/rfc/rfc9457.html>

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use boundaryline_lib::Error as LibError;

/// Problem type URI for malformed filter parameters.
pub const PROBLEM_INVALID_FILTER: &str = "/problems/invalid-filter";

/// Problem type URI for unknown slugs and external ids.
pub const PROBLEM_NOT_FOUND: &str = "/problems/not-found";

/// Problem type URI for throttled requests.
pub const PROBLEM_RATE_LIMITED: &str = "/problems/rate-limited";

/// Problem type URI for internal server errors.
pub const PROBLEM_INTERNAL_ERROR: &str = "/problems/internal-error";

/// Problem type URI for deployments without a spatial backend.
pub const PROBLEM_SPATIAL_UNAVAILABLE: &str = "/problems/spatial-backend-unavailable";

/// RFC 9457 Problem Details response structure.
///
/// Provides a consistent format for error responses across all endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// URI reference identifying the problem type (relative).
    #[serde(rename = "type")]
    pub type_uri: String,

    /// Short, human-readable summary of the problem.
    pub title: String,

    /// HTTP status code for this problem.
    pub status: u16,

    /// Human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// URI reference identifying the specific occurrence (e.g., request ID).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// Seconds until a throttled client may retry. Also emitted as the
    /// `Retry-After` response header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl ProblemDetails {
    /// Create a new ProblemDetails with required fields.
    pub fn new(type_uri: impl Into<String>, title: impl Into<String>, status: StatusCode) -> Self {
        Self {
            type_uri: type_uri.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
            retry_after: None,
        }
    }

    /// Add a detailed explanation of this specific problem occurrence.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Add the request identifier for tracing.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.instance = Some(request_id.into());
        self
    }

    /// Create a 400 Bad Request problem for an unparseable filter.
    pub fn invalid_filter(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INVALID_FILTER,
            "Invalid Filter",
            StatusCode::BAD_REQUEST,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// Create a 404 Not Found problem.
    pub fn not_found(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(PROBLEM_NOT_FOUND, "Not Found", StatusCode::NOT_FOUND)
            .with_detail(detail)
            .with_request_id(request_id)
    }

    /// Create a 429 Too Many Requests problem with retry guidance.
    pub fn rate_limited(retry_after_secs: u64, request_id: impl Into<String>) -> Self {
        let mut problem = Self::new(
            PROBLEM_RATE_LIMITED,
            "Rate Limit Exceeded",
            StatusCode::TOO_MANY_REQUESTS,
        )
        .with_detail(format!(
            "Anonymous request limit reached; retry in {} seconds",
            retry_after_secs
        ))
        .with_request_id(request_id);
        problem.retry_after = Some(retry_after_secs);
        problem
    }

    /// Create a 500 Internal Server Error problem.
    pub fn internal_error(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INTERNAL_ERROR,
            "Internal Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// Create a 503 problem for spatial filters without a spatial backend.
    pub fn spatial_unavailable(request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_SPATIAL_UNAVAILABLE,
            "Spatial Backend Unavailable",
            StatusCode::SERVICE_UNAVAILABLE,
        )
        .with_detail("This deployment has no spatial backend; contains, near and intersects filters are unsupported")
        .with_request_id(request_id)
    }
}

impl std::fmt::Display for ProblemDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.title,
            self.detail.as_deref().unwrap_or("")
        )
    }
}

impl std::error::Error for ProblemDetails {}

/// Implement IntoResponse for axum to return ProblemDetails as HTTP responses.
impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let retry_after = self.retry_after;

        let mut response = Json(&self).into_response();
        response.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("application/problem+json"),
        );
        if let Some(secs) = retry_after {
            if let Ok(value) = axum::http::HeaderValue::from_str(&secs.to_string()) {
                response
                    .headers_mut()
                    .insert(axum::http::header::RETRY_AFTER, value);
            }
        }

        *response.status_mut() = status;
        response
    }
}

/// Convert library errors to ProblemDetails.
///
/// Filter and lookup failures map to client errors; everything else is a
/// 500 whose internal detail is logged by the caller, not leaked here.
pub fn from_lib_error(error: &LibError, request_id: &str) -> ProblemDetails {
    match error {
        LibError::InvalidFilter { .. } => {
            ProblemDetails::invalid_filter(error.to_string(), request_id)
        }
        LibError::UnknownSlug { .. } | LibError::ExternalIdNotFound { .. } => {
            ProblemDetails::not_found(error.to_string(), request_id)
        }
        LibError::SpatialBackendUnavailable => ProblemDetails::spatial_unavailable(request_id),
        _ => ProblemDetails::internal_error("An internal error occurred", request_id),
    }
}
