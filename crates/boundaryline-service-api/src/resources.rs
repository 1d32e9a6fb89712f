//! Resource serialization and response format negotiation.
//!
//! Builds the JSON records the API emits for boundary sets and boundaries,
//! and renders response bodies as plain JSON or JSONP. Geometry fields are
//! emitted as GeoJSON-style coordinate structures; the shaper trims them
//! per request afterwards.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::{json, Value};

use boundaryline_lib::geometry::{multi_polygon_geojson, point_geojson};
use boundaryline_lib::{Boundary, BoundarySet, Catalog};
use boundaryline_service_shared::ProblemDetails;

/// Resource URI for a boundary set.
pub fn set_uri(slug: &str) -> String {
    format!("/1.0/boundary-set/{}/", slug)
}

/// Resource URI for a boundary.
pub fn boundary_uri(slug: &str) -> String {
    format!("/1.0/boundary/{}/", slug)
}

/// Serialize a boundary set record.
///
/// Internal fields (`id`, `singular`, `kind_first`) are never exposed; the
/// owned boundaries appear as a list of resource URIs.
pub fn set_resource(set: &BoundarySet, catalog: &Catalog) -> Value {
    let boundaries: Vec<Value> = catalog
        .boundaries_in_set(set.id)
        .map(|b| Value::String(boundary_uri(&b.slug)))
        .collect();

    json!({
        "name": set.name,
        "authority": set.authority,
        "domain": set.domain,
        "last_updated": set.last_updated.to_string(),
        "href": set.href,
        "notes": set.notes,
        "count": set.count,
        "metadata_fields": set.metadata_fields,
        "slug": set.slug,
        "boundaries": boundaries,
        "resource_uri": set_uri(&set.slug),
    })
}

/// Serialize a boundary record with both geometry tiers present.
///
/// Internal fields (`id`, `display_name`) are never exposed. The shaper
/// drops `shape`/`simple_shape` per the requested detail level.
pub fn boundary_resource(boundary: &Boundary, catalog: &Catalog) -> Value {
    let set_link = catalog
        .set_of(boundary)
        .map(|set| Value::String(set_uri(&set.slug)))
        .unwrap_or(Value::Null);

    json!({
        "set": set_link,
        "kind": boundary.kind,
        "external_id": boundary.external_id,
        "name": boundary.name,
        "metadata": boundary.metadata,
        "slug": boundary.slug,
        "centroid": boundary
            .centroid
            .as_ref()
            .map(point_geojson)
            .unwrap_or(Value::Null),
        "shape": multi_polygon_geojson(&boundary.shape),
        "simple_shape": multi_polygon_geojson(&boundary.simple_shape),
        "resource_uri": boundary_uri(&boundary.slug),
    })
}

/// Negotiated response serialization format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFormat {
    Json,
    Jsonp { callback: String },
}

impl ApiFormat {
    /// Negotiate the response format from query parameters.
    ///
    /// A `callback` parameter selects JSONP; `format=jsonp` without a
    /// callback is a client error, and malformed callback names are
    /// rejected rather than reflected into the response.
    pub fn negotiate<'a, I>(params: I, request_id: &str) -> Result<Self, Box<ProblemDetails>>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut format: Option<&str> = None;
        let mut callback: Option<&str> = None;

        for (key, value) in params {
            match key {
                "format" => format = Some(value),
                "callback" => callback = Some(value),
                _ => {}
            }
        }

        match (format, callback) {
            (_, Some(callback)) => {
                if !valid_callback(callback) {
                    return Err(Box::new(ProblemDetails::invalid_filter(
                        format!("callback {:?} is not a valid function name", callback),
                        request_id,
                    )));
                }
                Ok(Self::Jsonp {
                    callback: callback.to_string(),
                })
            }
            (Some("jsonp"), None) => Err(Box::new(ProblemDetails::invalid_filter(
                "format=jsonp requires a callback parameter",
                request_id,
            ))),
            (Some("json") | None, None) => Ok(Self::Json),
            (Some(other), None) => Err(Box::new(ProblemDetails::invalid_filter(
                format!("unknown format {:?}; expected json or jsonp", other),
                request_id,
            ))),
        }
    }

    /// The content type this format is served with.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Jsonp { .. } => "text/javascript",
        }
    }

    /// Serialize a body value in this format.
    pub fn render(&self, body: &Value) -> String {
        match self {
            Self::Json => body.to_string(),
            Self::Jsonp { callback } => format!("{}({})", callback, body),
        }
    }
}

fn valid_callback(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_' || first == '$') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.')
}

/// Build a 200 response from a serialized body and content type.
pub fn serialized_response(content_type: &str, body: String) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type.to_string())],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use boundaryline_service_shared::test_utils::fixture_catalog;

    fn negotiate(pairs: &[(&str, &str)]) -> Result<ApiFormat, Box<ProblemDetails>> {
        ApiFormat::negotiate(pairs.iter().copied(), "req-test")
    }

    #[test]
    fn test_set_resource_fields() {
        let catalog = fixture_catalog();
        let wards = catalog.set_by_slug("wards").unwrap();
        let record = set_resource(wards, &catalog);

        assert_eq!(record["name"], "Wards");
        assert_eq!(record["last_updated"], "2010-12-12");
        assert_eq!(record["resource_uri"], "/1.0/boundary-set/wards/");
        assert_eq!(record["metadata_fields"], json!(["WARD", "ALDERMAN"]));

        // Internal fields stay internal.
        assert!(record.get("id").is_none());
        assert!(record.get("singular").is_none());
        assert!(record.get("kind_first").is_none());

        let boundaries = record["boundaries"].as_array().unwrap();
        assert_eq!(boundaries.len(), 2);
        assert!(boundaries.contains(&json!("/1.0/boundary/ward-1/")));
    }

    #[test]
    fn test_boundary_resource_fields() {
        let catalog = fixture_catalog();
        let ward1 = catalog.boundary_by_slug("ward-1").unwrap();
        let record = boundary_resource(ward1, &catalog);

        assert_eq!(record["set"], "/1.0/boundary-set/wards/");
        assert_eq!(record["kind"], "Ward");
        assert_eq!(record["external_id"], "0100");
        assert_eq!(record["shape"]["type"], "MultiPolygon");
        assert_eq!(record["simple_shape"]["type"], "MultiPolygon");
        assert_eq!(record["centroid"]["type"], "Point");

        assert!(record.get("id").is_none());
        assert!(record.get("display_name").is_none());
    }

    #[test]
    fn test_boundary_resource_null_centroid() {
        let catalog = fixture_catalog();
        let austin = catalog.boundary_by_slug("austin-community-area").unwrap();
        let record = boundary_resource(austin, &catalog);
        assert_eq!(record["centroid"], Value::Null);
    }

    #[test]
    fn test_negotiate_defaults_to_json() {
        assert_eq!(negotiate(&[]).unwrap(), ApiFormat::Json);
        assert_eq!(negotiate(&[("format", "json")]).unwrap(), ApiFormat::Json);
    }

    #[test]
    fn test_negotiate_jsonp_with_callback() {
        let format = negotiate(&[("callback", "handleData")]).unwrap();
        assert_eq!(
            format,
            ApiFormat::Jsonp {
                callback: "handleData".to_string()
            }
        );
        assert_eq!(format.content_type(), "text/javascript");
    }

    #[test]
    fn test_negotiate_jsonp_without_callback_is_error() {
        let err = negotiate(&[("format", "jsonp")]).unwrap_err();
        assert_eq!(err.status, 400);
    }

    #[test]
    fn test_negotiate_rejects_bad_callback() {
        let err = negotiate(&[("callback", "alert(1);//")]).unwrap_err();
        assert_eq!(err.status, 400);

        assert!(negotiate(&[("callback", "jQuery17.handle_1$")]).is_ok());
    }

    #[test]
    fn test_render_jsonp_wraps_body() {
        let format = ApiFormat::Jsonp {
            callback: "cb".to_string(),
        };
        let body = json!({"objects": []});
        assert_eq!(format.render(&body), "cb({\"objects\":[]})");
    }
}
