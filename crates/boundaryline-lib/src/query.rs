//! Translation of API filter parameters into executable query plans.
//!
//! [`translate`] parses the recognized filter keys (`sets`, `contains`,
//! `near`, `intersects`, `external_id`) into a [`QueryPlan`]; unrecognized
//! keys are ignored so older clients keep working as filters are added.
//! [`execute`] runs a plan against the catalog and geometry store, AND-ing
//! every present filter and preserving catalog order.
//!
//! All parse validation happens in [`translate`], before any store call.

use std::collections::HashSet;

use geo_types::Point;
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::model::BoundaryId;
use crate::store::GeometryStore;

/// Matching mode for the `external_id` filter.
///
/// A trailing `*` requests a prefix match; anything else matches exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalIdMatch {
    Exact(String),
    Prefix(String),
}

impl ExternalIdMatch {
    fn parse(raw: &str) -> Self {
        match raw.strip_suffix('*') {
            Some(prefix) => Self::Prefix(prefix.to_string()),
            None => Self::Exact(raw.to_string()),
        }
    }

    fn matches(&self, external_id: &str) -> bool {
        match self {
            Self::Exact(value) => external_id == value,
            Self::Prefix(prefix) => external_id.starts_with(prefix.as_str()),
        }
    }
}

/// Units accepted in the `near` filter's distance component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceUnit {
    Meters,
    Kilometers,
    Miles,
    Feet,
    Yards,
}

impl DistanceUnit {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "m" => Some(Self::Meters),
            "km" => Some(Self::Kilometers),
            "mi" => Some(Self::Miles),
            "ft" => Some(Self::Feet),
            "yd" => Some(Self::Yards),
            _ => None,
        }
    }

    fn to_meters(self, magnitude: f64) -> f64 {
        match self {
            Self::Meters => magnitude,
            Self::Kilometers => magnitude * 1_000.0,
            Self::Miles => magnitude * 1_609.344,
            Self::Feet => magnitude * 0.3048,
            Self::Yards => magnitude * 0.9144,
        }
    }
}

/// Parsed, validated filter set ready for execution.
#[derive(Debug, Default, PartialEq)]
pub struct QueryPlan {
    /// Restrict to boundaries whose parent set slug is in this list.
    pub set_slugs: Option<Vec<String>>,
    /// Point-in-polygon filter.
    pub contains: Option<Point<f64>>,
    /// Within-distance filter: query point plus radius in meters.
    pub near: Option<(Point<f64>, f64)>,
    /// Intersect against this boundary's full shape.
    pub intersects: Option<String>,
    /// Exact or prefix match on source-system identifiers.
    pub external_id: Option<ExternalIdMatch>,
}

impl QueryPlan {
    /// True when no recognized filter was supplied.
    pub fn is_unfiltered(&self) -> bool {
        *self == Self::default()
    }

    /// True when the plan needs the geometry store.
    pub fn has_spatial_filter(&self) -> bool {
        self.contains.is_some() || self.near.is_some() || self.intersects.is_some()
    }
}

/// Parse filter parameters into a [`QueryPlan`].
///
/// `params` is the request's query key/value pairs; keys that are not
/// recognized filters are ignored.
pub fn translate<'a, I>(params: I) -> Result<QueryPlan>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut plan = QueryPlan::default();

    for (key, value) in params {
        match key {
            "sets" => {
                plan.set_slugs = Some(
                    value
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect(),
                );
            }
            "contains" => {
                plan.contains = Some(parse_lat_lon(value, "contains")?);
            }
            "near" => {
                plan.near = Some(parse_near(value)?);
            }
            "intersects" => {
                plan.intersects = Some(value.to_string());
            }
            "external_id" => {
                plan.external_id = Some(ExternalIdMatch::parse(value));
            }
            _ => {}
        }
    }

    Ok(plan)
}

/// Execute a plan, returning matching boundary ids in catalog order.
pub fn execute(
    plan: &QueryPlan,
    catalog: &Catalog,
    store: &dyn GeometryStore,
) -> Result<Vec<BoundaryId>> {
    // Resolve the intersects target through the catalog before touching the
    // store, so an unknown slug is a 404 rather than a storage failure.
    let intersects_shape = match &plan.intersects {
        Some(slug) => {
            let boundary = catalog
                .boundary_by_slug(slug)
                .ok_or_else(|| Error::UnknownSlug {
                    kind: "boundary",
                    slug: slug.clone(),
                })?;
            Some(
                store
                    .full_shape(boundary.id)
                    .cloned()
                    .unwrap_or_else(|| boundary.shape.clone()),
            )
        }
        None => None,
    };

    let mut spatial_hits: Option<HashSet<BoundaryId>> = None;
    let mut restrict = |ids: Vec<BoundaryId>| {
        let ids: HashSet<BoundaryId> = ids.into_iter().collect();
        spatial_hits = Some(match spatial_hits.take() {
            Some(existing) => existing.intersection(&ids).copied().collect(),
            None => ids,
        });
    };

    if let Some(point) = plan.contains {
        restrict(store.find_containing(point)?);
    }
    if let Some((point, meters)) = plan.near {
        restrict(store.find_within_distance(point, meters)?);
    }
    if let Some(shape) = &intersects_shape {
        restrict(store.find_intersecting(shape)?);
    }

    let set_ids: Option<HashSet<_>> = match &plan.set_slugs {
        Some(slugs) => Some(
            slugs
                .iter()
                .filter_map(|slug| catalog.set_by_slug(slug))
                .map(|set| set.id)
                .collect(),
        ),
        None => None,
    };

    let results: Vec<BoundaryId> = catalog
        .boundaries()
        .iter()
        .filter(|b| match &set_ids {
            Some(ids) => ids.contains(&b.set_id),
            None => true,
        })
        .filter(|b| match &plan.external_id {
            Some(matcher) => matcher.matches(&b.external_id),
            None => true,
        })
        .filter(|b| match &spatial_hits {
            Some(hits) => hits.contains(&b.id),
            None => true,
        })
        .map(|b| b.id)
        .collect();

    debug!(matched = results.len(), "query executed");
    Ok(results)
}

/// Parse a `"lat,lon"` pair into a lon/lat point.
fn parse_lat_lon(raw: &str, filter: &'static str) -> Result<Point<f64>> {
    let mut parts = raw.split(',');
    let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(Error::InvalidFilter {
            filter,
            message: format!("expected \"lat,lon\", got {:?}", raw),
        });
    };

    let lat: f64 = lat.trim().parse().map_err(|_| Error::InvalidFilter {
        filter,
        message: format!("latitude {:?} is not a number", lat),
    })?;
    let lon: f64 = lon.trim().parse().map_err(|_| Error::InvalidFilter {
        filter,
        message: format!("longitude {:?} is not a number", lon),
    })?;

    Ok(Point::new(lon, lat))
}

/// Parse a `"lat,lon,distance"` triple; distance is leading digits plus a
/// unit suffix, e.g. `"5mi"`.
fn parse_near(raw: &str) -> Result<(Point<f64>, f64)> {
    let Some((point_part, distance_part)) = raw.rsplit_once(',') else {
        return Err(Error::InvalidFilter {
            filter: "near",
            message: format!("expected \"lat,lon,distance\", got {:?}", raw),
        });
    };

    let point = parse_lat_lon(point_part, "near")?;
    let distance = parse_distance(distance_part.trim())?;
    Ok((point, distance))
}

/// Parse a distance literal: leading digits are the magnitude, the trailing
/// letters the unit.
fn parse_distance(raw: &str) -> Result<f64> {
    let digits_end = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    if digits_end == 0 {
        return Err(Error::InvalidFilter {
            filter: "near",
            message: format!("distance {:?} has no leading digits", raw),
        });
    }

    // Leading digits always parse once we know there is at least one.
    let magnitude: u64 = raw[..digits_end].parse().map_err(|_| Error::InvalidFilter {
        filter: "near",
        message: format!("distance magnitude in {:?} is out of range", raw),
    })?;

    let unit = DistanceUnit::parse(&raw[digits_end..]).ok_or_else(|| Error::InvalidFilter {
        filter: "near",
        message: format!(
            "unknown distance unit {:?}; expected one of m, km, mi, ft, yd",
            &raw[digits_end..]
        ),
    })?;

    Ok(unit.to_meters(magnitude as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translate_pairs(pairs: &[(&str, &str)]) -> Result<QueryPlan> {
        translate(pairs.iter().copied())
    }

    #[test]
    fn test_translate_empty() {
        let plan = translate_pairs(&[]).unwrap();
        assert!(plan.is_unfiltered());
        assert!(!plan.has_spatial_filter());
    }

    #[test]
    fn test_translate_sets() {
        let plan = translate_pairs(&[("sets", "wards, community-areas")]).unwrap();
        assert_eq!(
            plan.set_slugs,
            Some(vec!["wards".to_string(), "community-areas".to_string()])
        );
    }

    #[test]
    fn test_translate_contains() {
        let plan = translate_pairs(&[("contains", "41.88,-87.63")]).unwrap();
        let point = plan.contains.unwrap();
        assert_eq!(point.x(), -87.63);
        assert_eq!(point.y(), 41.88);
        assert!(plan.has_spatial_filter());
    }

    #[test]
    fn test_translate_contains_malformed() {
        let err = translate_pairs(&[("contains", "41.88")]).unwrap_err();
        assert!(matches!(err, Error::InvalidFilter { filter: "contains", .. }));

        let err = translate_pairs(&[("contains", "x,y")]).unwrap_err();
        assert!(matches!(err, Error::InvalidFilter { filter: "contains", .. }));
    }

    #[test]
    fn test_translate_near() {
        let plan = translate_pairs(&[("near", "41.88,-87.63,5mi")]).unwrap();
        let (point, meters) = plan.near.unwrap();
        assert_eq!(point.y(), 41.88);
        assert!((meters - 5.0 * 1_609.344).abs() < 1e-9);
    }

    #[test]
    fn test_translate_near_unit_variants() {
        for (raw, expected) in [
            ("1m", 1.0),
            ("2km", 2_000.0),
            ("3ft", 3.0 * 0.3048),
            ("4yd", 4.0 * 0.9144),
        ] {
            let plan = translate_pairs(&[("near", &format!("0,0,{}", raw))]).unwrap();
            let (_, meters) = plan.near.unwrap();
            assert!((meters - expected).abs() < 1e-9, "unit {}", raw);
        }
    }

    #[test]
    fn test_translate_near_no_leading_digit() {
        let err = translate_pairs(&[("near", "41.88,-87.63,mi")]).unwrap_err();
        match err {
            Error::InvalidFilter { filter, message } => {
                assert_eq!(filter, "near");
                assert!(message.contains("no leading digits"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_translate_near_unknown_unit() {
        let err = translate_pairs(&[("near", "41.88,-87.63,5parsecs")]).unwrap_err();
        assert!(matches!(err, Error::InvalidFilter { filter: "near", .. }));
    }

    #[test]
    fn test_translate_external_id_modes() {
        let plan = translate_pairs(&[("external_id", "0500")]).unwrap();
        assert_eq!(plan.external_id, Some(ExternalIdMatch::Exact("0500".to_string())));

        let plan = translate_pairs(&[("external_id", "05*")]).unwrap();
        assert_eq!(plan.external_id, Some(ExternalIdMatch::Prefix("05".to_string())));
    }

    #[test]
    fn test_translate_ignores_unknown_keys() {
        let plan = translate_pairs(&[("shape_type", "full"), ("frobnicate", "1")]).unwrap();
        assert!(plan.is_unfiltered());
    }

    #[test]
    fn test_external_id_matching() {
        assert!(ExternalIdMatch::Exact("0500".into()).matches("0500"));
        assert!(!ExternalIdMatch::Exact("0500".into()).matches("05001"));
        assert!(ExternalIdMatch::Prefix("05".into()).matches("0500"));
        assert!(!ExternalIdMatch::Prefix("05".into()).matches("1500"));
    }
}
