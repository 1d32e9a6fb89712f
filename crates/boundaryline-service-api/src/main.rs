//! Boundaryline HTTP API service.
//!
//! Serves the read-only boundary REST API over a prepared dataset.
//!
//! # Configuration
//!
//! - `BOUNDARYLINE_DATA_PATH` - Path to the boundaries.db file (required)
//! - `BOUNDARYLINE_SITE_ROOT` - URL root for response links
//! - `SERVICE_PORT` - HTTP port (default: 8080)
//! - `RUST_LOG` - Log level (default: info)
//! - `LOG_FORMAT` - Log format: json (default) or text

use std::env;
use std::net::SocketAddr;

use tracing::{error, info};

use boundaryline_service_api::build_router;
use boundaryline_service_shared::{
    init_logging, init_metrics, AppState, LoggingConfig, MetricsConfig, ServiceConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (reads LOG_FORMAT from environment)
    let logging_config = LoggingConfig::from_env().with_service("api");
    init_logging(&logging_config);

    // Initialize metrics; the service runs fine without them
    let metrics_config = MetricsConfig::from_env();
    if let Err(e) = init_metrics(&metrics_config) {
        tracing::warn!(error = %e, "failed to initialize metrics, continuing without metrics");
    }

    // Load configuration from environment
    let data_path =
        env::var("BOUNDARYLINE_DATA_PATH").unwrap_or_else(|_| "/data/boundaries.db".to_string());
    let port: u16 = env::var("SERVICE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let config = ServiceConfig::from_env();

    info!(data_path = %data_path, port = port, "starting boundaryline api service");

    // Load application state
    let state = AppState::load(&data_path, config).map_err(|e| {
        error!(error = %e, path = %data_path, "failed to load application state");
        e
    })?;

    info!(
        sets = state.catalog().sets().len(),
        boundaries = state.catalog().boundaries().len(),
        "application state loaded"
    );

    let app = build_router(state);

    // Bind and serve; connect info feeds the throttle gate's client identity
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(addr = %addr, "listening on");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
