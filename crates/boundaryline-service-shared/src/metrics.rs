//! Prometheus metrics infrastructure for the API service.
//!
//! [`init_metrics`] installs the Prometheus recorder at startup and
//! [`metrics_handler`] serves the exposition text on `/metrics`. Business
//! helpers cover the read path: query filters used, result counts, cache
//! and throttle outcomes.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Configuration for the metrics system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Whether metrics collection is enabled.
    pub enabled: bool,
    /// Path for the metrics endpoint.
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl MetricsConfig {
    /// Create configuration from `METRICS_ENABLED` / `METRICS_PATH`.
    pub fn from_env() -> Self {
        let enabled = std::env::var("METRICS_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);
        let path = std::env::var("METRICS_PATH").unwrap_or_else(|_| "/metrics".to_string());

        Self { enabled, path }
    }
}

/// Errors that can occur during metrics initialization.
#[derive(Debug, Clone)]
pub enum MetricsError {
    /// Metrics are disabled in configuration.
    Disabled,
    /// The recorder has already been installed.
    AlreadyInitialized,
    /// The Prometheus builder failed to install.
    InstallFailed(String),
}

impl std::fmt::Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::Disabled => write!(f, "metrics are disabled"),
            MetricsError::AlreadyInitialized => write!(f, "metrics recorder already initialized"),
            MetricsError::InstallFailed(e) => {
                write!(f, "failed to install metrics recorder: {}", e)
            }
        }
    }
}

impl std::error::Error for MetricsError {}

/// Install the Prometheus metrics recorder. Call once at startup.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Err(MetricsError::Disabled);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::InstallFailed(e.to_string()))?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)?;

    Ok(())
}

/// Axum handler for the metrics endpoint, in Prometheus exposition format.
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_else(|| "# Metrics not initialized\n".to_string())
}

// =============================================================================
// Business metrics helpers
// =============================================================================

/// Record one executed boundary query, labeled by the filter that drove it.
pub fn record_boundary_query(filter: &str) {
    metrics::counter!(
        "boundaryline_queries_total",
        "filter" => filter.to_string()
    )
    .increment(1);
}

/// Record the number of boundaries a query matched.
pub fn record_boundaries_matched(count: usize, filter: &str) {
    metrics::histogram!(
        "boundaryline_boundaries_matched",
        "filter" => filter.to_string()
    )
    .record(count as f64);
}

/// Record a response cache hit or miss for an endpoint.
pub fn record_cache_lookup(endpoint: &str, hit: bool) {
    metrics::counter!(
        "boundaryline_cache_lookups_total",
        "endpoint" => endpoint.to_string(),
        "outcome" => if hit { "hit" } else { "miss" }
    )
    .increment(1);
}

/// Record a request rejected by the throttle gate.
pub fn record_request_throttled() {
    metrics::counter!("boundaryline_requests_throttled_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_config_default() {
        let config = MetricsConfig::default();
        assert!(config.enabled);
        assert_eq!(config.path, "/metrics");
    }

    #[test]
    fn test_metrics_handler_uninitialized_output() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let output = rt.block_on(async { metrics_handler().await });
        assert!(output.contains('#') || output.is_empty());
    }

    #[test]
    fn test_business_metric_helpers_do_not_panic() {
        record_boundary_query("contains");
        record_boundaries_matched(3, "near");
        record_cache_lookup("boundary_list", true);
        record_cache_lookup("boundary_list", false);
        record_request_throttled();
    }

    #[test]
    fn test_metrics_error_display() {
        assert_eq!(MetricsError::Disabled.to_string(), "metrics are disabled");
        assert!(MetricsError::InstallFailed("boom".to_string())
            .to_string()
            .contains("boom"));
    }
}
