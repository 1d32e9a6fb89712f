//! Post-processing of serialized records before they leave the API.
//!
//! Records are JSON objects. The requested detail level picks which geometry
//! field survives (`simple_shape`, `shape`, or neither), and the caller's
//! exclusion list removes further fields best-effort. List and detail
//! responses go through the same per-record path.

use serde_json::Value;

/// Requested geometry granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShapeDetail {
    /// Keep `simple_shape`, drop `shape`.
    #[default]
    Simple,
    /// Keep `shape`, drop `simple_shape`.
    Full,
    /// Drop both geometry fields.
    None,
}

impl ShapeDetail {
    /// Parse a `shape_type` parameter value.
    ///
    /// Anything other than `simple` or `full` keeps neither shape, so an
    /// unrecognized value degrades to the cheapest response rather than an
    /// error.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "simple" => Self::Simple,
            "full" => Self::Full,
            _ => Self::None,
        }
    }
}

/// Split a comma-separated `excludes` parameter into field names.
pub fn parse_excludes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trim one record in place per the detail level and exclusion list.
///
/// Deletions are best-effort: a field name that is absent (or a record that
/// is not an object) is left alone, never an error.
pub fn shape_record(record: &mut Value, detail: ShapeDetail, excludes: &[String]) {
    let Some(fields) = record.as_object_mut() else {
        return;
    };

    if detail != ShapeDetail::Simple {
        fields.remove("simple_shape");
    }
    if detail != ShapeDetail::Full {
        fields.remove("shape");
    }

    for exclude in excludes {
        fields.remove(exclude);
    }
}

/// Trim every record of a list response in place.
pub fn shape_records(records: &mut [Value], detail: ShapeDetail, excludes: &[String]) {
    for record in records {
        shape_record(record, detail, excludes);
    }
}
