//! Application state and configuration for the HTTP service.
//!
//! [`AppState`] bundles the loaded catalog, the geometry store, the throttle
//! gate and the response cache behind one cheaply-cloneable handle for axum's
//! `State` extractor. Everything except the throttle counters and cache is
//! immutable after load.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use boundaryline_lib::{Catalog, Error as LibError, GeometryStore, SpatialStore, UnsupportedStore};

use crate::cache::{ResponseCache, DEFAULT_CACHE_TTL};
use crate::throttle::{ThrottleGate, DEFAULT_THROTTLE_LIMIT, DEFAULT_THROTTLE_WINDOW};

/// Which geometry store backs spatial filters.
///
/// Chosen at configuration time; there is no runtime fallback between the
/// two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpatialBackend {
    /// In-memory spatial store built from the catalog at startup.
    #[default]
    Native,
    /// No spatial backend; spatial filters fail with a 503-class error.
    Unsupported,
}

/// Service configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Root for fully-qualified URLs in responses (`next`/`previous` links,
    /// redirect targets). Explicit configuration, not ambient state.
    pub site_root: String,
    /// Default page size for list endpoints.
    pub default_limit: usize,
    /// Largest page size a client may request.
    pub max_limit: usize,
    /// Requests admitted per anonymous identity per throttle window.
    pub throttle_limit: u32,
    /// Throttle window length.
    pub throttle_window: Duration,
    /// Response cache entry lifetime. Zero disables caching.
    pub cache_ttl: Duration,
    /// Geometry store implementation to build at startup.
    pub spatial_backend: SpatialBackend,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            site_root: "http://localhost:8080".to_string(),
            default_limit: 20,
            max_limit: 1000,
            throttle_limit: DEFAULT_THROTTLE_LIMIT,
            throttle_window: DEFAULT_THROTTLE_WINDOW,
            cache_ttl: DEFAULT_CACHE_TTL,
            spatial_backend: SpatialBackend::Native,
        }
    }
}

impl ServiceConfig {
    /// Create configuration from environment variables.
    ///
    /// - `BOUNDARYLINE_SITE_ROOT`: URL root for response links
    /// - `BOUNDARYLINE_DEFAULT_LIMIT` / `BOUNDARYLINE_MAX_LIMIT`: page sizes
    /// - `BOUNDARYLINE_THROTTLE_LIMIT` / `BOUNDARYLINE_THROTTLE_WINDOW_SECS`
    /// - `BOUNDARYLINE_CACHE_TTL_SECS`: 0 disables the response cache
    /// - `BOUNDARYLINE_SPATIAL_BACKEND`: `native` (default) or `off`
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let site_root = std::env::var("BOUNDARYLINE_SITE_ROOT")
            .map(|root| root.trim_end_matches('/').to_string())
            .unwrap_or(defaults.site_root);

        let default_limit = env_parse("BOUNDARYLINE_DEFAULT_LIMIT", defaults.default_limit);
        let max_limit = env_parse("BOUNDARYLINE_MAX_LIMIT", defaults.max_limit);
        let throttle_limit = env_parse("BOUNDARYLINE_THROTTLE_LIMIT", defaults.throttle_limit);
        let throttle_window = Duration::from_secs(env_parse(
            "BOUNDARYLINE_THROTTLE_WINDOW_SECS",
            defaults.throttle_window.as_secs(),
        ));
        let cache_ttl = Duration::from_secs(env_parse(
            "BOUNDARYLINE_CACHE_TTL_SECS",
            defaults.cache_ttl.as_secs(),
        ));

        let spatial_backend = match std::env::var("BOUNDARYLINE_SPATIAL_BACKEND").as_deref() {
            Ok("off") => SpatialBackend::Unsupported,
            _ => SpatialBackend::Native,
        };

        Self {
            site_root,
            default_limit,
            max_limit,
            throttle_limit,
            throttle_window,
            cache_ttl,
            spatial_backend,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Error during application state initialization.
#[derive(Debug)]
pub enum AppStateError {
    /// Failed to load the boundary catalog.
    CatalogLoad(LibError),

    /// Dataset file not found.
    DatasetNotFound(String),
}

impl std::fmt::Display for AppStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CatalogLoad(e) => write!(f, "failed to load catalog: {}", e),
            Self::DatasetNotFound(path) => write!(f, "dataset not found: {}", path),
        }
    }
}

impl std::error::Error for AppStateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CatalogLoad(e) => Some(e),
            Self::DatasetNotFound(_) => None,
        }
    }
}

impl From<LibError> for AppStateError {
    fn from(err: LibError) -> Self {
        Self::CatalogLoad(err)
    }
}

/// Shared application state for all axum handlers.
///
/// Cheaply cloneable (`Arc` internally); share via axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    catalog: Catalog,
    store: Arc<dyn GeometryStore>,
    config: ServiceConfig,
    throttle: ThrottleGate,
    cache: ResponseCache,
}

impl AppState {
    /// Load application state from a dataset file.
    ///
    /// Loads the catalog and builds the configured geometry store from it.
    pub fn load(db_path: impl AsRef<Path>, config: ServiceConfig) -> Result<Self, AppStateError> {
        let db_path = db_path.as_ref();

        if !db_path.exists() {
            return Err(AppStateError::DatasetNotFound(
                db_path.display().to_string(),
            ));
        }

        tracing::info!(path = %db_path.display(), "loading boundary catalog");
        let catalog = Catalog::load(db_path)?;
        tracing::info!(
            sets = catalog.sets().len(),
            boundaries = catalog.boundaries().len(),
            "catalog loaded successfully"
        );

        let store: Arc<dyn GeometryStore> = match config.spatial_backend {
            SpatialBackend::Native => {
                let store = SpatialStore::build(&catalog);
                tracing::info!(indexed = store.len(), "spatial store built");
                Arc::new(store)
            }
            SpatialBackend::Unsupported => {
                tracing::warn!("spatial backend disabled; spatial filters will be rejected");
                Arc::new(UnsupportedStore)
            }
        };

        Ok(Self::from_components(catalog, store, config))
    }

    /// Create application state from pre-loaded components.
    ///
    /// This is useful for testing or embedding.
    pub fn from_components(
        catalog: Catalog,
        store: Arc<dyn GeometryStore>,
        config: ServiceConfig,
    ) -> Self {
        let throttle = ThrottleGate::new(config.throttle_limit, config.throttle_window);
        let cache = ResponseCache::new(config.cache_ttl);
        Self {
            inner: Arc::new(AppStateInner {
                catalog,
                store,
                config,
                throttle,
                cache,
            }),
        }
    }

    /// Access the loaded catalog.
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Access the geometry store.
    pub fn store(&self) -> &dyn GeometryStore {
        self.inner.store.as_ref()
    }

    /// Access the service configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.inner.config
    }

    /// Access the throttle gate.
    pub fn throttle(&self) -> &ThrottleGate {
        &self.inner.throttle
    }

    /// Access the response cache.
    pub fn cache(&self) -> &ResponseCache {
        &self.inner.cache
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("sets", &self.inner.catalog.sets().len())
            .field("boundaries", &self.inner.catalog.boundaries().len())
            .finish()
    }
}
