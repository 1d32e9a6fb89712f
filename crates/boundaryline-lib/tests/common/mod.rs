//! Shared fixture dataset for integration tests.
//!
//! Builds a small SQLite dataset the way the import pipeline would: two
//! boundary sets (Wards, Community Areas) around Chicago with overlapping
//! square geometries, WKT columns, and JSON metadata.

use std::path::Path;

use rusqlite::Connection;

pub struct FixtureBoundary {
    pub id: i64,
    pub set_id: i64,
    pub kind: &'static str,
    pub external_id: &'static str,
    pub name: &'static str,
    pub display_name: &'static str,
    pub metadata: &'static str,
    pub shape: &'static str,
    pub simple_shape: &'static str,
    pub centroid: Option<&'static str>,
    pub slug: &'static str,
}

/// Ward 1: square from (-87.70, 41.80) to (-87.60, 41.90).
pub const WARD_1_SHAPE: &str =
    "MULTIPOLYGON(((-87.70 41.80, -87.60 41.80, -87.60 41.90, -87.70 41.90, -87.70 41.80)))";

/// Ward 2: square from (-87.60, 41.80) to (-87.50, 41.90), sharing an edge
/// with Ward 1.
pub const WARD_2_SHAPE: &str =
    "MULTIPOLYGON(((-87.60 41.80, -87.50 41.80, -87.50 41.90, -87.60 41.90, -87.60 41.80)))";

/// Austin: square overlapping the western half of Ward 1.
pub const AUSTIN_SHAPE: &str =
    "MULTIPOLYGON(((-87.75 41.82, -87.65 41.82, -87.65 41.92, -87.75 41.92, -87.75 41.82)))";

pub fn fixture_boundaries() -> Vec<FixtureBoundary> {
    vec![
        FixtureBoundary {
            id: 1,
            set_id: 1,
            kind: "Ward",
            external_id: "0100",
            name: "1",
            display_name: "Ward 1",
            metadata: r#"{"WARD": "1", "ALDERMAN": "Example"}"#,
            shape: WARD_1_SHAPE,
            simple_shape: WARD_1_SHAPE,
            centroid: Some("POINT(-87.65 41.85)"),
            slug: "ward-1",
        },
        FixtureBoundary {
            id: 2,
            set_id: 1,
            kind: "Ward",
            external_id: "0200",
            name: "2",
            display_name: "Ward 2",
            metadata: r#"{"WARD": "2"}"#,
            shape: WARD_2_SHAPE,
            simple_shape: WARD_2_SHAPE,
            centroid: Some("POINT(-87.55 41.85)"),
            slug: "ward-2",
        },
        FixtureBoundary {
            id: 3,
            set_id: 2,
            kind: "Community Area",
            external_id: "AUSTIN",
            name: "Austin",
            display_name: "Austin Community Area",
            metadata: r#"{"COMMUNITY": "AUSTIN"}"#,
            shape: AUSTIN_SHAPE,
            simple_shape: AUSTIN_SHAPE,
            centroid: None,
            slug: "austin-community-area",
        },
    ]
}

/// Write the fixture dataset to `path`.
pub fn write_fixture_db(path: &Path) {
    let conn = Connection::open(path).expect("open fixture db");

    conn.execute_batch(
        "CREATE TABLE boundary_sets (
             id INTEGER PRIMARY KEY,
             name TEXT NOT NULL UNIQUE,
             singular TEXT NOT NULL,
             kind_first INTEGER NOT NULL,
             authority TEXT NOT NULL,
             domain TEXT NOT NULL,
             last_updated TEXT NOT NULL,
             href TEXT NOT NULL DEFAULT '',
             notes TEXT NOT NULL DEFAULT '',
             count INTEGER NOT NULL,
             metadata_fields TEXT NOT NULL DEFAULT '',
             slug TEXT NOT NULL UNIQUE
         );
         CREATE TABLE boundaries (
             id INTEGER PRIMARY KEY,
             set_id INTEGER NOT NULL REFERENCES boundary_sets(id),
             kind TEXT NOT NULL,
             external_id TEXT NOT NULL,
             name TEXT NOT NULL,
             display_name TEXT NOT NULL,
             metadata TEXT NOT NULL DEFAULT '{}',
             shape TEXT NOT NULL,
             simple_shape TEXT NOT NULL,
             centroid TEXT,
             slug TEXT NOT NULL UNIQUE
         );",
    )
    .expect("create fixture schema");

    conn.execute(
        "INSERT INTO boundary_sets
             (id, name, singular, kind_first, authority, domain, last_updated,
              href, notes, count, metadata_fields, slug)
         VALUES
             (1, 'Wards', 'Ward', 1, 'City of Chicago', 'Chicago', '2010-12-12',
              'https://data.cityofchicago.org/', '', 2, 'WARD|ALDERMAN', 'wards')",
        [],
    )
    .expect("insert wards set");

    conn.execute(
        "INSERT INTO boundary_sets
             (id, name, singular, kind_first, authority, domain, last_updated,
              href, notes, count, metadata_fields, slug)
         VALUES
             (2, 'Community Areas', 'Community Area', 0, 'City of Chicago', 'Chicago',
              '2010-10-01', '', 'Merged from source tracts.', 1, 'COMMUNITY', 'community-areas')",
        [],
    )
    .expect("insert community areas set");

    for b in fixture_boundaries() {
        conn.execute(
            "INSERT INTO boundaries
                 (id, set_id, kind, external_id, name, display_name, metadata,
                  shape, simple_shape, centroid, slug)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                b.id,
                b.set_id,
                b.kind,
                b.external_id,
                b.name,
                b.display_name,
                b.metadata,
                b.shape,
                b.simple_shape,
                b.centroid,
                b.slug,
            ],
        )
        .expect("insert fixture boundary");
    }
}
