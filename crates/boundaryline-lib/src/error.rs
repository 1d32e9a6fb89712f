use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the boundaryline library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Dataset could not be located at the resolved path.
    #[error("dataset not found at {path}")]
    DatasetNotFound { path: PathBuf },

    /// Raised when the dataset does not contain the expected tables.
    #[error("unsupported dataset schema; expected boundary_sets and boundaries tables")]
    UnsupportedSchema,

    /// Raised when a filter parameter cannot be parsed.
    #[error("invalid '{filter}' filter: {message}")]
    InvalidFilter {
        filter: &'static str,
        message: String,
    },

    /// Raised when a slug does not resolve to a known entity.
    #[error("unknown {kind} slug: {slug}")]
    UnknownSlug { kind: &'static str, slug: String },

    /// Raised when no boundary in a set matches a requested external id.
    #[error("no boundary in set {set_slug} with external id {external_id}")]
    ExternalIdNotFound {
        set_slug: String,
        external_id: String,
    },

    /// Raised when slug source text normalizes to an empty slug.
    #[error("slug text {text:?} normalized to an empty slug")]
    EmptySlug { text: String },

    /// Raised when the dataset carries two entities with the same slug.
    #[error("duplicate {kind} slug encountered: {slug}")]
    DuplicateSlug { kind: &'static str, slug: String },

    /// Raised when stored geometry text cannot be parsed.
    #[error("failed to parse geometry for {context}: {message}")]
    GeometryParse { context: String, message: String },

    /// Raised when a non-geometry dataset column cannot be decoded.
    #[error("invalid dataset row for {context}: {message}")]
    DatasetRow { context: String, message: String },

    /// Raised when a spatial filter is used without a spatial backend.
    #[error("spatial backend unavailable; contains, near and intersects filters are unsupported")]
    SpatialBackendUnavailable,

    /// Wrapper for SQLite errors.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
