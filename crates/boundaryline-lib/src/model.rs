//! Domain entities for the boundary catalog.
//!
//! A [`BoundarySet`] is a named collection of related boundaries ("Wards",
//! "Community Areas"). A [`Boundary`] is a single polygon feature belonging to
//! exactly one set. Both carry a unique slug assigned once at import time.

use chrono::NaiveDate;
use geo_types::{MultiPolygon, Point};

use crate::slug::SlugSource;

/// Numeric identifier for a boundary set.
pub type SetId = i64;

/// Numeric identifier for a boundary.
pub type BoundaryId = i64;

/// A set of related boundaries, such as all Wards or Neighborhoods.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundarySet {
    pub id: SetId,
    /// Plural category name, e.g. "Community Areas". Unique.
    pub name: String,
    /// Name of a single member, e.g. "Community Area".
    pub singular: String,
    /// If true, display names read "kind name" (e.g. "Ward 5"),
    /// otherwise "name kind" (e.g. "5 Ward").
    pub kind_first: bool,
    /// The entity responsible for this data's accuracy, e.g. "City of Chicago".
    pub authority: String,
    /// The area this set covers, e.g. "Chicago" or "Illinois".
    pub domain: String,
    /// When the data was last pulled from its authority.
    pub last_updated: NaiveDate,
    /// The url this data was found at, if any.
    pub href: String,
    /// Notes about loading this data, including transformations applied.
    pub notes: String,
    /// Total number of features expected in this set.
    pub count: i64,
    /// Metadata field names carried over from the source dataset, in
    /// display order.
    pub metadata_fields: Vec<String>,
    pub slug: String,
}

/// A single boundary feature, such as one Ward or one Neighborhood.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub id: BoundaryId,
    pub set_id: SetId,
    /// Copy of the parent set's `singular` value, used for display and slugs.
    pub kind: String,
    /// Identifier from the source dataset. Not unique in isolation.
    pub external_id: String,
    pub name: String,
    /// Computed from `name`, `kind` and the parent set's `kind_first`.
    pub display_name: String,
    /// The full source attribute table for this feature, as a JSON object.
    pub metadata: serde_json::Value,
    /// Full-resolution geometry in EPSG:4269.
    pub shape: MultiPolygon<f64>,
    /// Geometry simplified to 0.0001 tolerance by the import pipeline.
    pub simple_shape: MultiPolygon<f64>,
    /// Weighted center of the boundary, when the import pipeline computed one.
    pub centroid: Option<Point<f64>>,
    pub slug: String,
}

impl SlugSource for BoundarySet {
    fn slug_text(&self) -> &str {
        &self.name
    }
}

impl SlugSource for Boundary {
    fn slug_text(&self) -> &str {
        &self.display_name
    }
}

/// Compose a boundary display name from its parts.
///
/// With `kind_first` the kind leads ("Ward 5"), otherwise it trails
/// ("5 Ward").
pub fn display_name(name: &str, kind: &str, kind_first: bool) -> String {
    if kind_first {
        format!("{} {}", kind, name)
    } else {
        format!("{} {}", name, kind)
    }
}

/// Split a pipe-delimited metadata field list. Empty input yields no fields.
pub fn parse_metadata_fields(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split('|').map(str::to_string).collect()
}

/// Join metadata field names back into their pipe-delimited wire form.
pub fn join_metadata_fields(fields: &[String]) -> String {
    fields.join("|")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_kind_first() {
        assert_eq!(display_name("5", "Ward", true), "Ward 5");
    }

    #[test]
    fn test_display_name_kind_last() {
        assert_eq!(display_name("5", "Ward", false), "5 Ward");
    }

    #[test]
    fn test_metadata_fields_roundtrip() {
        let fields = parse_metadata_fields("WARD|ALDERMAN|POP2010");
        assert_eq!(fields, vec!["WARD", "ALDERMAN", "POP2010"]);
        assert_eq!(join_metadata_fields(&fields), "WARD|ALDERMAN|POP2010");
    }

    #[test]
    fn test_metadata_fields_empty() {
        assert!(parse_metadata_fields("").is_empty());
        assert_eq!(join_metadata_fields(&[]), "");
    }

    #[test]
    fn test_metadata_fields_order_preserved() {
        let fields = parse_metadata_fields("B|A|C");
        assert_eq!(fields, vec!["B", "A", "C"]);
    }
}
