//! Geometry parsing, bounding boxes, and distance math.
//!
//! Stored geometry is WKT text (the import pipeline's source of truth);
//! this module parses it into `geo-types` values, precomputes bounding boxes
//! for cheap prefiltering, and provides the haversine distance helpers used
//! by the `near` predicate. All coordinates are EPSG:4269 lon/lat; callers
//! reproject before querying.

use std::str::FromStr;

use geo::BoundingRect;
use geo_types::{Geometry, LineString, MultiPolygon, Point, Polygon};
use serde_json::{json, Value};

use crate::error::{Error, Result};

/// Axis-aligned bounding box in lon/lat degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BBox {
    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BBox) -> bool {
        self.min_lat <= other.max_lat
            && self.max_lat >= other.min_lat
            && self.min_lng <= other.max_lng
            && self.max_lng >= other.min_lng
    }

    /// Check if this bbox contains a point.
    pub fn contains_point(&self, lat: f64, lng: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lng >= self.min_lng && lng <= self.max_lng
    }

    /// Compute from a multi-polygon. Empty geometry has no bbox.
    pub fn from_multi_polygon(shape: &MultiPolygon<f64>) -> Option<Self> {
        let rect = shape.bounding_rect()?;
        Some(Self {
            min_lat: rect.min().y,
            max_lat: rect.max().y,
            min_lng: rect.min().x,
            max_lng: rect.max().x,
        })
    }
}

/// Parse WKT text into a multi-polygon.
///
/// Accepts `MULTIPOLYGON` directly and promotes a bare `POLYGON`; any other
/// geometry type is rejected. `context` names the owning record in errors.
pub fn parse_multi_polygon(text: &str, context: &str) -> Result<MultiPolygon<f64>> {
    match parse_wkt(text, context)? {
        Geometry::MultiPolygon(mp) => Ok(mp),
        Geometry::Polygon(poly) => Ok(MultiPolygon(vec![poly])),
        other => Err(Error::GeometryParse {
            context: context.to_string(),
            message: format!("expected a multi-polygon, got {}", geometry_kind(&other)),
        }),
    }
}

/// Parse WKT text into a point.
pub fn parse_point(text: &str, context: &str) -> Result<Point<f64>> {
    match parse_wkt(text, context)? {
        Geometry::Point(p) => Ok(p),
        other => Err(Error::GeometryParse {
            context: context.to_string(),
            message: format!("expected a point, got {}", geometry_kind(&other)),
        }),
    }
}

/// Parse WKT text into a geo-types Geometry.
fn parse_wkt(text: &str, context: &str) -> Result<Geometry<f64>> {
    wkt::Wkt::from_str(text)
        .map_err(|e| Error::GeometryParse {
            context: context.to_string(),
            message: format!("{:?}", e),
        })
        .and_then(|w| {
            Geometry::try_from(w).map_err(|e| Error::GeometryParse {
                context: context.to_string(),
                message: format!("{:?}", e),
            })
        })
}

fn geometry_kind(geom: &Geometry<f64>) -> &'static str {
    match geom {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
        #[allow(unreachable_patterns)]
        _ => "Geometry",
    }
}

/// Emit a multi-polygon as a GeoJSON-style geometry object.
pub fn multi_polygon_geojson(shape: &MultiPolygon<f64>) -> Value {
    let coordinates: Vec<Value> = shape.iter().map(polygon_coordinates).collect();
    json!({
        "type": "MultiPolygon",
        "coordinates": coordinates,
    })
}

/// Emit a point as a GeoJSON-style geometry object.
pub fn point_geojson(point: &Point<f64>) -> Value {
    json!({
        "type": "Point",
        "coordinates": [point.x(), point.y()],
    })
}

fn polygon_coordinates(poly: &Polygon<f64>) -> Value {
    let mut rings: Vec<Value> = Vec::with_capacity(1 + poly.interiors().len());
    rings.push(ring_coordinates(poly.exterior()));
    for interior in poly.interiors() {
        rings.push(ring_coordinates(interior));
    }
    Value::Array(rings)
}

fn ring_coordinates(ring: &LineString<f64>) -> Value {
    Value::Array(
        ring.coords()
            .map(|c| json!([c.x, c.y]))
            .collect(),
    )
}

/// Haversine distance between two points in meters.
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Minimum distance from a point to a bounding box, in meters.
///
/// Returns 0 if the point is inside the bbox. This is a conservative lower
/// bound: the distance to any geometry within the bbox is >= this value, so
/// it never excludes a geometry that should be included.
pub fn min_distance_to_bbox(lat: f64, lng: f64, bbox: &BBox) -> f64 {
    let closest_lat = lat.clamp(bbox.min_lat, bbox.max_lat);
    let closest_lng = lng.clamp(bbox.min_lng, bbox.max_lng);

    if closest_lat == lat && closest_lng == lng {
        return 0.0;
    }

    haversine_distance(lat, lng, closest_lat, closest_lng)
}

/// Minimum distance from a point to a multi-polygon, in meters.
///
/// Returns 0 when the point lies inside any member polygon. Otherwise takes
/// the minimum distance to all rings, exterior and interior: if the point
/// sits in a hole, the hole boundary is the true nearest edge.
pub fn min_distance_to_multi_polygon(lat: f64, lng: f64, shape: &MultiPolygon<f64>) -> f64 {
    use geo::Contains;

    let point = Point::new(lng, lat);
    shape
        .iter()
        .map(|poly| {
            if poly.contains(&point) {
                return 0.0;
            }
            let mut min_dist = min_distance_to_linestring(lat, lng, poly.exterior());
            for interior in poly.interiors() {
                min_dist = min_dist.min(min_distance_to_linestring(lat, lng, interior));
            }
            min_dist
        })
        .fold(f64::INFINITY, f64::min)
}

/// Minimum distance from a point to a linestring, in meters.
fn min_distance_to_linestring(lat: f64, lng: f64, ls: &LineString<f64>) -> f64 {
    if ls.0.is_empty() {
        return f64::INFINITY;
    }

    let mut min_dist = f64::INFINITY;
    for window in ls.0.windows(2) {
        let (p1, p2) = (&window[0], &window[1]);
        let dist = min_distance_to_segment(lat, lng, p1.y, p1.x, p2.y, p2.x);
        min_dist = min_dist.min(dist);
    }

    min_dist
}

/// Minimum distance from a point to a line segment, in meters.
///
/// Projects the point onto the segment in degree space (adequate for the
/// short segments boundary rings are built from), then measures haversine
/// distance to the clamped projection.
fn min_distance_to_segment(lat: f64, lng: f64, lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let dx = lng2 - lng1;
    let dy = lat2 - lat1;

    if dx == 0.0 && dy == 0.0 {
        return haversine_distance(lat, lng, lat1, lng1);
    }

    let t = ((lng - lng1) * dx + (lat - lat1) * dy) / (dx * dx + dy * dy);
    let t = t.clamp(0.0, 1.0);

    let proj_lat = lat1 + t * dy;
    let proj_lng = lng1 + t * dx;
    haversine_distance(lat, lng, proj_lat, proj_lng)
}
