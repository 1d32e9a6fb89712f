//! Health check handlers for liveness and readiness probes.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Health status response for liveness and readiness probes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Status indicator: "ok" or "not_ready: <reason>".
    pub status: String,

    /// Service name for identification.
    pub service: String,

    /// Service version from build-time.
    pub version: String,

    /// Number of boundary sets loaded (readiness only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sets_loaded: Option<usize>,

    /// Number of boundaries loaded (readiness only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boundaries_loaded: Option<usize>,
}

impl HealthStatus {
    /// Create a healthy liveness status.
    pub fn alive(service: &str, version: &str) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            sets_loaded: None,
            boundaries_loaded: None,
        }
    }

    /// Create a ready status with catalog counts.
    pub fn ready(service: &str, version: &str, sets: usize, boundaries: usize) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            sets_loaded: Some(sets),
            boundaries_loaded: Some(boundaries),
        }
    }

    /// Create a not-ready status.
    pub fn not_ready(service: &str, version: &str, reason: &str) -> Self {
        Self {
            status: format!("not_ready: {}", reason),
            service: service.to_string(),
            version: version.to_string(),
            sets_loaded: None,
            boundaries_loaded: None,
        }
    }
}

/// Liveness probe handler: 200 OK whenever the process is running.
pub async fn health_live() -> impl IntoResponse {
    let status = HealthStatus::alive(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    (StatusCode::OK, Json(status))
}

/// Readiness probe handler: 200 OK once the catalog is loaded.
pub async fn health_ready(State(state): State<AppState>) -> Response {
    let service = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    let sets = state.catalog().sets().len();
    let boundaries = state.catalog().boundaries().len();

    if sets == 0 {
        let status = HealthStatus::not_ready(service, version, "no boundary sets loaded");
        return (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response();
    }

    let status = HealthStatus::ready(service, version, sets, boundaries);
    (StatusCode::OK, Json(status)).into_response()
}
