//! In-memory boundary catalog loaded from a prepared SQLite dataset.
//!
//! The import pipeline (out of scope here) writes two tables:
//!
//! ```text
//! boundary_sets(id, name, singular, kind_first, authority, domain,
//!               last_updated, href, notes, count, metadata_fields, slug)
//! boundaries(id, set_id, kind, external_id, name, display_name, metadata,
//!            shape, simple_shape, centroid, slug)
//! ```
//!
//! Geometry columns hold WKT text, `metadata_fields` is pipe-delimited,
//! `metadata` is a JSON object, `last_updated` is an ISO-8601 date. The
//! catalog is immutable once loaded; the API never writes.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{Connection, OpenFlags, Row};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::geometry::{parse_multi_polygon, parse_point};
use crate::model::{parse_metadata_fields, Boundary, BoundaryId, BoundarySet, SetId};

/// Immutable catalog of boundary sets and their boundaries.
///
/// Sets are held in `name` order and boundaries in `(kind, display_name)`
/// order; every listing and query result preserves these orders.
#[derive(Debug, Default)]
pub struct Catalog {
    sets: Vec<BoundarySet>,
    boundaries: Vec<Boundary>,
    set_by_slug: HashMap<String, usize>,
    set_by_id: HashMap<SetId, usize>,
    boundary_by_slug: HashMap<String, usize>,
    boundary_by_id: HashMap<BoundaryId, usize>,
    boundaries_by_set: HashMap<SetId, Vec<usize>>,
}

impl Catalog {
    /// Load the catalog from a SQLite dataset file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::DatasetNotFound {
                path: path.to_path_buf(),
            });
        }

        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        if !has_table(&conn, "boundary_sets")? || !has_table(&conn, "boundaries")? {
            return Err(Error::UnsupportedSchema);
        }

        let sets = load_sets(&conn)?;
        let boundaries = load_boundaries(&conn)?;
        debug!(
            sets = sets.len(),
            boundaries = boundaries.len(),
            "dataset rows read"
        );

        let catalog = Self::from_components(sets, boundaries)?;
        info!(
            sets = catalog.sets.len(),
            boundaries = catalog.boundaries.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    /// Build a catalog from pre-constructed entities.
    ///
    /// Sorts into canonical order, indexes slugs and ids, and rejects
    /// duplicate slugs within either entity type.
    pub fn from_components(
        mut sets: Vec<BoundarySet>,
        mut boundaries: Vec<Boundary>,
    ) -> Result<Self> {
        sets.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        boundaries.sort_by(|a, b| {
            a.kind
                .cmp(&b.kind)
                .then_with(|| a.display_name.cmp(&b.display_name))
                .then(a.id.cmp(&b.id))
        });

        let mut set_by_slug = HashMap::with_capacity(sets.len());
        let mut set_by_id = HashMap::with_capacity(sets.len());
        for (index, set) in sets.iter().enumerate() {
            if set_by_slug.insert(set.slug.clone(), index).is_some() {
                return Err(Error::DuplicateSlug {
                    kind: "boundary set",
                    slug: set.slug.clone(),
                });
            }
            set_by_id.insert(set.id, index);
        }

        let mut boundary_by_slug = HashMap::with_capacity(boundaries.len());
        let mut boundary_by_id = HashMap::with_capacity(boundaries.len());
        let mut boundaries_by_set: HashMap<SetId, Vec<usize>> = HashMap::new();
        for (index, boundary) in boundaries.iter().enumerate() {
            if boundary_by_slug
                .insert(boundary.slug.clone(), index)
                .is_some()
            {
                return Err(Error::DuplicateSlug {
                    kind: "boundary",
                    slug: boundary.slug.clone(),
                });
            }
            boundary_by_id.insert(boundary.id, index);
            boundaries_by_set
                .entry(boundary.set_id)
                .or_default()
                .push(index);
        }

        Ok(Self {
            sets,
            boundaries,
            set_by_slug,
            set_by_id,
            boundary_by_slug,
            boundary_by_id,
            boundaries_by_set,
        })
    }

    /// All boundary sets in `name` order.
    pub fn sets(&self) -> &[BoundarySet] {
        &self.sets
    }

    /// All boundaries in `(kind, display_name)` order.
    pub fn boundaries(&self) -> &[Boundary] {
        &self.boundaries
    }

    /// Lookup a boundary set by slug.
    pub fn set_by_slug(&self, slug: &str) -> Option<&BoundarySet> {
        self.set_by_slug.get(slug).map(|&i| &self.sets[i])
    }

    /// Lookup a boundary by slug.
    pub fn boundary_by_slug(&self, slug: &str) -> Option<&Boundary> {
        self.boundary_by_slug.get(slug).map(|&i| &self.boundaries[i])
    }

    /// Lookup a boundary by id.
    pub fn boundary_by_id(&self, id: BoundaryId) -> Option<&Boundary> {
        self.boundary_by_id.get(&id).map(|&i| &self.boundaries[i])
    }

    /// The parent set of a boundary.
    pub fn set_of(&self, boundary: &Boundary) -> Option<&BoundarySet> {
        self.set_by_id.get(&boundary.set_id).map(|&i| &self.sets[i])
    }

    /// Boundaries belonging to a set, in catalog order.
    pub fn boundaries_in_set(&self, set_id: SetId) -> impl Iterator<Item = &Boundary> {
        self.boundaries_by_set
            .get(&set_id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.boundaries[i])
    }

    /// Resolve `(set slug, external id)` to a single boundary.
    ///
    /// When several boundaries in the set share the external id, the lowest
    /// boundary id wins, so repeated requests resolve identically.
    pub fn boundary_by_external_id(&self, set_slug: &str, external_id: &str) -> Result<&Boundary> {
        let set = self.set_by_slug(set_slug).ok_or_else(|| Error::UnknownSlug {
            kind: "boundary set",
            slug: set_slug.to_string(),
        })?;

        self.boundaries_in_set(set.id)
            .filter(|b| b.external_id == external_id)
            .min_by_key(|b| b.id)
            .ok_or_else(|| Error::ExternalIdNotFound {
                set_slug: set_slug.to_string(),
                external_id: external_id.to_string(),
            })
    }
}

fn has_table(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn load_sets(conn: &Connection) -> Result<Vec<BoundarySet>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, singular, kind_first, authority, domain, last_updated,
                href, notes, count, metadata_fields, slug
         FROM boundary_sets",
    )?;
    let rows = stmt.query_map([], set_from_row)?;

    let mut sets = Vec::new();
    for row in rows {
        sets.push(row??);
    }
    Ok(sets)
}

fn set_from_row(row: &Row<'_>) -> rusqlite::Result<Result<BoundarySet>> {
    let name: String = row.get("name")?;
    let last_updated: String = row.get("last_updated")?;
    let metadata_fields: String = row.get("metadata_fields")?;

    let parsed_date = match NaiveDate::parse_from_str(&last_updated, "%Y-%m-%d") {
        Ok(date) => date,
        Err(e) => {
            return Ok(Err(Error::DatasetRow {
                context: format!("boundary set {}", name),
                message: format!("invalid last_updated date {:?}: {}", last_updated, e),
            }))
        }
    };

    Ok(Ok(BoundarySet {
        id: row.get("id")?,
        singular: row.get("singular")?,
        kind_first: row.get::<_, i64>("kind_first")? != 0,
        authority: row.get("authority")?,
        domain: row.get("domain")?,
        last_updated: parsed_date,
        href: row.get("href")?,
        notes: row.get("notes")?,
        count: row.get("count")?,
        metadata_fields: parse_metadata_fields(&metadata_fields),
        slug: row.get("slug")?,
        name,
    }))
}

fn load_boundaries(conn: &Connection) -> Result<Vec<Boundary>> {
    let mut stmt = conn.prepare(
        "SELECT id, set_id, kind, external_id, name, display_name, metadata,
                shape, simple_shape, centroid, slug
         FROM boundaries",
    )?;
    let rows = stmt.query_map([], boundary_from_row)?;

    let mut boundaries = Vec::new();
    for row in rows {
        boundaries.push(row??);
    }
    Ok(boundaries)
}

fn boundary_from_row(row: &Row<'_>) -> rusqlite::Result<Result<Boundary>> {
    let slug: String = row.get("slug")?;
    let metadata_text: String = row.get("metadata")?;
    let shape_text: String = row.get("shape")?;
    let simple_shape_text: String = row.get("simple_shape")?;
    let centroid_text: Option<String> = row.get("centroid")?;

    Ok(build_boundary(
        row.get("id")?,
        row.get("set_id")?,
        row.get("kind")?,
        row.get("external_id")?,
        row.get("name")?,
        row.get("display_name")?,
        metadata_text,
        shape_text,
        simple_shape_text,
        centroid_text,
        slug,
    ))
}

#[allow(clippy::too_many_arguments)]
fn build_boundary(
    id: BoundaryId,
    set_id: SetId,
    kind: String,
    external_id: String,
    name: String,
    display_name: String,
    metadata_text: String,
    shape_text: String,
    simple_shape_text: String,
    centroid_text: Option<String>,
    slug: String,
) -> Result<Boundary> {
    let context = format!("boundary {}", slug);

    let metadata: serde_json::Value = if metadata_text.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_str(&metadata_text).map_err(|e| Error::DatasetRow {
            context: context.clone(),
            message: format!("invalid metadata JSON: {}", e),
        })?
    };

    let shape = parse_multi_polygon(&shape_text, &context)?;
    let simple_shape = parse_multi_polygon(&simple_shape_text, &context)?;
    let centroid = match centroid_text {
        Some(text) if !text.is_empty() => Some(parse_point(&text, &context)?),
        _ => None,
    };

    Ok(Boundary {
        id,
        set_id,
        kind,
        external_id,
        name,
        display_name,
        metadata,
        shape,
        simple_shape,
        centroid,
        slug,
    })
}
