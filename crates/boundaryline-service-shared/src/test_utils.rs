//! Test fixtures for handler and service testing.
//!
//! Builds a small in-memory catalog — two boundary sets around Chicago with
//! overlapping square geometries — so tests never touch the filesystem.

use std::sync::Arc;

use boundaryline_lib::geometry::{parse_multi_polygon, parse_point};
use boundaryline_lib::model::display_name;
use boundaryline_lib::{Boundary, BoundarySet, Catalog, SpatialStore};
use chrono::NaiveDate;

use crate::state::{AppState, ServiceConfig};

/// Ward 1: square from (-87.70, 41.80) to (-87.60, 41.90).
pub const WARD_1_SHAPE: &str =
    "MULTIPOLYGON(((-87.70 41.80, -87.60 41.80, -87.60 41.90, -87.70 41.90, -87.70 41.80)))";

/// Ward 2: square from (-87.60, 41.80) to (-87.50, 41.90).
pub const WARD_2_SHAPE: &str =
    "MULTIPOLYGON(((-87.60 41.80, -87.50 41.80, -87.50 41.90, -87.60 41.90, -87.60 41.80)))";

/// Austin: square overlapping the western half of Ward 1.
pub const AUSTIN_SHAPE: &str =
    "MULTIPOLYGON(((-87.75 41.82, -87.65 41.82, -87.65 41.92, -87.75 41.92, -87.75 41.82)))";

/// A point inside both Ward 1 and Austin, as a `contains` filter value.
pub const OVERLAP_POINT: &str = "41.85,-87.66";

/// Build the fixture catalog.
pub fn fixture_catalog() -> Catalog {
    let wards = BoundarySet {
        id: 1,
        name: "Wards".to_string(),
        singular: "Ward".to_string(),
        kind_first: true,
        authority: "City of Chicago".to_string(),
        domain: "Chicago".to_string(),
        last_updated: NaiveDate::from_ymd_opt(2010, 12, 12).unwrap(),
        href: "https://data.cityofchicago.org/".to_string(),
        notes: String::new(),
        count: 2,
        metadata_fields: vec!["WARD".to_string(), "ALDERMAN".to_string()],
        slug: "wards".to_string(),
    };
    let areas = BoundarySet {
        id: 2,
        name: "Community Areas".to_string(),
        singular: "Community Area".to_string(),
        kind_first: false,
        authority: "City of Chicago".to_string(),
        domain: "Chicago".to_string(),
        last_updated: NaiveDate::from_ymd_opt(2010, 10, 1).unwrap(),
        href: String::new(),
        notes: "Merged from source tracts.".to_string(),
        count: 1,
        metadata_fields: vec!["COMMUNITY".to_string()],
        slug: "community-areas".to_string(),
    };

    let boundaries = vec![
        fixture_boundary(1, &wards, "1", "0100", WARD_1_SHAPE, Some("POINT(-87.65 41.85)")),
        fixture_boundary(2, &wards, "2", "0200", WARD_2_SHAPE, Some("POINT(-87.55 41.85)")),
        fixture_boundary(3, &areas, "Austin", "AUSTIN", AUSTIN_SHAPE, None),
    ];

    Catalog::from_components(vec![wards, areas], boundaries).expect("fixture catalog is valid")
}

fn fixture_boundary(
    id: i64,
    set: &BoundarySet,
    name: &str,
    external_id: &str,
    shape_wkt: &str,
    centroid_wkt: Option<&str>,
) -> Boundary {
    let display = display_name(name, &set.singular, set.kind_first);
    let slug = boundaryline_lib::slugify(&display);
    let shape = parse_multi_polygon(shape_wkt, &slug).expect("fixture shape is valid");
    Boundary {
        id,
        set_id: set.id,
        kind: set.singular.clone(),
        external_id: external_id.to_string(),
        name: name.to_string(),
        display_name: display,
        metadata: serde_json::json!({ "SOURCE_ID": external_id }),
        simple_shape: shape.clone(),
        shape,
        centroid: centroid_wkt.map(|w| parse_point(w, &slug).expect("fixture centroid is valid")),
        slug,
    }
}

/// A service configuration suitable for tests: deterministic site root and
/// no throttling surprises.
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        site_root: "http://testserver".to_string(),
        throttle_limit: 10_000,
        ..ServiceConfig::default()
    }
}

/// Build an AppState over the fixture catalog with a native spatial store.
pub fn fixture_state() -> AppState {
    fixture_state_with_config(test_config())
}

/// Build an AppState over the fixture catalog with a custom configuration.
pub fn fixture_state_with_config(config: ServiceConfig) -> AppState {
    let catalog = fixture_catalog();
    let store = Arc::new(SpatialStore::build(&catalog));
    AppState::from_components(catalog, store, config)
}

/// Generate a unique request ID for testing.
pub fn test_request_id() -> String {
    crate::middleware::RequestId::generate().0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_catalog_shape() {
        let catalog = fixture_catalog();
        assert_eq!(catalog.sets().len(), 2);
        assert_eq!(catalog.boundaries().len(), 3);
        assert!(catalog.boundary_by_slug("ward-1").is_some());
        assert!(catalog.boundary_by_slug("austin-community-area").is_some());
    }

    #[test]
    fn test_fixture_state_builds() {
        let state = fixture_state();
        assert_eq!(state.catalog().boundaries().len(), 3);
        assert_eq!(state.config().site_root, "http://testserver");
    }

    #[test]
    fn test_request_ids_unique() {
        assert_ne!(test_request_id(), test_request_id());
    }
}
