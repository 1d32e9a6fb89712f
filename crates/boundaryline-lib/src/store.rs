//! Spatial predicate evaluation over stored boundary geometry.
//!
//! [`GeometryStore`] is the interface the query translator consumes:
//! point-in-polygon, within-distance, and intersection predicates plus
//! full-shape retrieval by id. [`SpatialStore`] answers them in memory with
//! a bounding-box prefilter and an exact refine step; [`UnsupportedStore`]
//! is the configuration-time stub for deployments without a spatial backend.
//!
//! All predicate results come back in catalog order, so downstream
//! pagination stays stable across requests.

use std::collections::HashMap;

use geo::{Contains, Intersects};
use geo_types::{MultiPolygon, Point};
use tracing::info;

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::geometry::{min_distance_to_bbox, min_distance_to_multi_polygon, BBox};
use crate::model::BoundaryId;

/// Spatial predicates over a boundary collection.
///
/// Inputs are EPSG:4269 lon/lat; callers reproject before querying.
/// Distances are meters.
pub trait GeometryStore: Send + Sync {
    /// Boundaries whose full shape contains the point.
    fn find_containing(&self, point: Point<f64>) -> Result<Vec<BoundaryId>>;

    /// Boundaries whose full shape lies within `meters` of the point.
    fn find_within_distance(&self, point: Point<f64>, meters: f64) -> Result<Vec<BoundaryId>>;

    /// Boundaries whose full shape intersects the given geometry.
    fn find_intersecting(&self, shape: &MultiPolygon<f64>) -> Result<Vec<BoundaryId>>;

    /// Retrieve a boundary's full shape by id.
    fn full_shape(&self, id: BoundaryId) -> Option<&MultiPolygon<f64>>;
}

struct StoreEntry {
    id: BoundaryId,
    shape: MultiPolygon<f64>,
    bbox: Option<BBox>,
}

/// In-memory spatial-native [`GeometryStore`].
///
/// Holds each boundary's full shape plus its bounding box; predicates run a
/// bbox prefilter and then refine with exact geometry tests.
pub struct SpatialStore {
    entries: Vec<StoreEntry>,
    id_to_index: HashMap<BoundaryId, usize>,
}

impl SpatialStore {
    /// Build a store from a loaded catalog, preserving catalog order.
    pub fn build(catalog: &Catalog) -> Self {
        let mut entries = Vec::with_capacity(catalog.boundaries().len());
        let mut id_to_index = HashMap::with_capacity(catalog.boundaries().len());

        for boundary in catalog.boundaries() {
            let bbox = BBox::from_multi_polygon(&boundary.shape);
            id_to_index.insert(boundary.id, entries.len());
            entries.push(StoreEntry {
                id: boundary.id,
                shape: boundary.shape.clone(),
                bbox,
            });
        }

        info!(indexed = entries.len(), "built spatial store");

        Self {
            entries,
            id_to_index,
        }
    }

    /// Number of indexed boundaries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GeometryStore for SpatialStore {
    fn find_containing(&self, point: Point<f64>) -> Result<Vec<BoundaryId>> {
        let (lng, lat) = (point.x(), point.y());
        Ok(self
            .entries
            .iter()
            .filter(|entry| {
                entry
                    .bbox
                    .is_some_and(|bbox| bbox.contains_point(lat, lng))
                    && entry.shape.contains(&point)
            })
            .map(|entry| entry.id)
            .collect())
    }

    fn find_within_distance(&self, point: Point<f64>, meters: f64) -> Result<Vec<BoundaryId>> {
        if meters < 0.0 {
            return Ok(Vec::new());
        }

        let (lng, lat) = (point.x(), point.y());
        Ok(self
            .entries
            .iter()
            .filter(|entry| {
                // Bbox distance is a lower bound, so this never drops a
                // boundary that the exact test would keep.
                let Some(bbox) = entry.bbox else {
                    return false;
                };
                if min_distance_to_bbox(lat, lng, &bbox) > meters {
                    return false;
                }
                min_distance_to_multi_polygon(lat, lng, &entry.shape) <= meters
            })
            .map(|entry| entry.id)
            .collect())
    }

    fn find_intersecting(&self, shape: &MultiPolygon<f64>) -> Result<Vec<BoundaryId>> {
        let query_bbox = BBox::from_multi_polygon(shape);
        Ok(self
            .entries
            .iter()
            .filter(|entry| {
                let bbox_hit = match (entry.bbox, query_bbox) {
                    (Some(a), Some(b)) => a.intersects(&b),
                    _ => false,
                };
                bbox_hit && entry.shape.intersects(shape)
            })
            .map(|entry| entry.id)
            .collect())
    }

    fn full_shape(&self, id: BoundaryId) -> Option<&MultiPolygon<f64>> {
        self.id_to_index.get(&id).map(|&i| &self.entries[i].shape)
    }
}

/// Stub [`GeometryStore`] for deployments without a spatial backend.
///
/// Keyed lookups still work through the catalog; every spatial predicate
/// fails with [`Error::SpatialBackendUnavailable`].
#[derive(Debug, Default)]
pub struct UnsupportedStore;

impl GeometryStore for UnsupportedStore {
    fn find_containing(&self, _point: Point<f64>) -> Result<Vec<BoundaryId>> {
        Err(Error::SpatialBackendUnavailable)
    }

    fn find_within_distance(&self, _point: Point<f64>, _meters: f64) -> Result<Vec<BoundaryId>> {
        Err(Error::SpatialBackendUnavailable)
    }

    fn find_intersecting(&self, _shape: &MultiPolygon<f64>) -> Result<Vec<BoundaryId>> {
        Err(Error::SpatialBackendUnavailable)
    }

    fn full_shape(&self, _id: BoundaryId) -> Option<&MultiPolygon<f64>> {
        None
    }
}
