//! Boundaryline library entry points.
//!
//! This crate exposes the boundary catalog (sets and their polygon
//! features), slug resolution, spatial predicate evaluation, filter
//! translation, and response shaping. Higher-level consumers (the HTTP
//! service) should only depend on the functions exported here instead of
//! reimplementing behavior.

#![deny(warnings)]

pub mod catalog;
pub mod error;
pub mod geometry;
pub mod model;
pub mod query;
pub mod shaper;
pub mod slug;
pub mod store;

pub use catalog::Catalog;
pub use error::{Error, Result};
pub use model::{display_name, Boundary, BoundaryId, BoundarySet, SetId};
pub use query::{execute, translate, ExternalIdMatch, QueryPlan};
pub use shaper::{parse_excludes, shape_record, shape_records, ShapeDetail};
pub use slug::{resolve_slug, slugify, SlugSource};
pub use store::{GeometryStore, SpatialStore, UnsupportedStore};
