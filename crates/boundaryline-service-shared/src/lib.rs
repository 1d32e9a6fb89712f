//! Shared infrastructure for the boundaryline HTTP API.
//!
//! This crate provides the HTTP glue around `boundaryline-lib`:
//!
//! - [`AppState`]: pre-loaded catalog and geometry store for handlers
//! - [`ProblemDetails`]: RFC 9457 Problem Details for error responses
//! - [`ThrottleGate`]: per-client request throttling for anonymous access
//! - [`ResponseCache`]: read-through cache for serialized responses
//! - [`pagination`]: list metadata with next/previous links
//! - [`logging`] / [`metrics`] / [`middleware`]: observability setup
//! - [`health`]: liveness and readiness probes
//!
//! The service follows a thin-handler pattern: all query semantics live in
//! `boundaryline-lib`, and this crate only parses, dispatches and shapes
//! HTTP traffic.
//!
//! # Testing Support
//!
//! The [`test_utils`] module provides an in-memory fixture catalog and state
//! for handler testing. Enable the `test-utils` feature to use it from
//! dependent crates.

#![deny(warnings)]

mod cache;
mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod pagination;
mod problem;
mod state;
pub mod throttle;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use cache::{CachedResponse, ResponseCache, DEFAULT_CACHE_TTL};
pub use health::{health_live, health_ready, HealthStatus};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{
    init_metrics, metrics_handler, record_boundaries_matched, record_boundary_query,
    record_cache_lookup, record_request_throttled, MetricsConfig, MetricsError,
};
pub use middleware::{extract_or_generate_request_id, RequestId, RequestLayer};
pub use pagination::{build_meta, PageMeta, PageParams};
pub use problem::{
    from_lib_error, ProblemDetails, PROBLEM_INTERNAL_ERROR, PROBLEM_INVALID_FILTER,
    PROBLEM_NOT_FOUND, PROBLEM_RATE_LIMITED, PROBLEM_SPATIAL_UNAVAILABLE,
};
pub use state::{AppState, AppStateError, ServiceConfig, SpatialBackend};
pub use throttle::{client_identity, throttle_requests, Decision, ThrottleGate};
