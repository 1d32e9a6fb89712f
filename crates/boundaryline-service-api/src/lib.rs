//! Boundaryline read-only HTTP API.
//!
//! Routes:
//!
//! - `GET /1.0/boundary-set/` — paginated boundary set listing
//! - `GET /1.0/boundary-set/{slug}/` — boundary set detail
//! - `GET /1.0/boundary-set/{slug}/{external_id}` — redirect to the
//!   canonical boundary URL for a source-system id
//! - `GET /1.0/boundary/` — paginated boundary listing with `sets`,
//!   `contains`, `near`, `intersects` and `external_id` filters plus
//!   `shape_type`/`excludes` response shaping
//! - `GET /1.0/boundary/{slug}/` — boundary detail, same shaping
//! - `GET /health/live`, `GET /health/ready`, `GET /metrics`
//!
//! All routes are GET-only; axum answers anything else with 405. Anonymous
//! throttling wraps the `/1.0/` routes; probes and metrics stay exempt.

#![deny(warnings)]

pub mod resources;

use axum::extract::{Path, Query, RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{middleware as axum_middleware, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use boundaryline_lib::{execute, translate, Error as LibError, ShapeDetail};
use boundaryline_service_shared::{
    build_meta, extract_or_generate_request_id, from_lib_error, health_live, health_ready,
    metrics_handler, pagination::PageParams, record_boundaries_matched, record_boundary_query,
    record_cache_lookup, throttle_requests, AppState, CachedResponse, ProblemDetails, RequestLayer,
};

use resources::{boundary_resource, boundary_uri, serialized_response, set_resource, ApiFormat};

/// Build the service router over the given state.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/1.0/boundary-set/", get(boundary_set_list))
        .route("/1.0/boundary-set/{slug}/", get(boundary_set_detail))
        .route(
            "/1.0/boundary-set/{slug}/{external_id}",
            get(external_id_redirect),
        )
        .route("/1.0/boundary/", get(boundary_list))
        .route("/1.0/boundary/{slug}/", get(boundary_detail))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            throttle_requests,
        ));

    Router::new()
        .merge(api)
        .route("/metrics", get(metrics_handler))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .layer(CorsLayer::permissive())
        .layer(RequestLayer)
        .with_state(state)
}

/// Borrow query pairs as `(&str, &str)`.
fn str_pairs(params: &[(String, String)]) -> impl Iterator<Item = (&str, &str)> + Clone {
    params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
}

/// First value for a query key, if present.
fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Cache signature for a request: path plus query string as received.
fn cache_key(path: &str, raw_query: Option<&str>) -> String {
    match raw_query {
        Some(query) if !query.is_empty() => format!("{}?{}", path, query),
        _ => path.to_string(),
    }
}

/// Serve from the response cache when the signature is present.
fn cached(state: &AppState, endpoint: &str, key: &str) -> Option<Response> {
    match state.cache().get(key) {
        Some(entry) => {
            record_cache_lookup(endpoint, true);
            Some(serialized_response(&entry.content_type, entry.body))
        }
        None => {
            record_cache_lookup(endpoint, false);
            None
        }
    }
}

/// Render, cache, and return a response body.
fn respond(state: &AppState, key: &str, format: &ApiFormat, body: &Value) -> Response {
    let rendered = format.render(body);
    state.cache().put(
        key,
        CachedResponse {
            content_type: format.content_type().to_string(),
            body: rendered.clone(),
        },
    );
    serialized_response(format.content_type(), rendered)
}

/// Handle `GET /1.0/boundary-set/`.
async fn boundary_set_list(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Response {
    let request_id = extract_or_generate_request_id(&headers);
    let path = "/1.0/boundary-set/";

    let format = match ApiFormat::negotiate(str_pairs(&params), request_id.as_str()) {
        Ok(format) => format,
        Err(problem) => return problem.into_response(),
    };

    let key = cache_key(path, raw_query.as_deref());
    if let Some(response) = cached(&state, "boundary_set_list", &key) {
        return response;
    }

    let page = match PageParams::parse(str_pairs(&params), state.config(), request_id.as_str()) {
        Ok(page) => page,
        Err(problem) => return problem.into_response(),
    };

    let catalog = state.catalog();
    let total = catalog.sets().len();
    let objects: Vec<Value> = catalog
        .sets()
        .iter()
        .skip(page.offset)
        .take(page.limit)
        .map(|set| set_resource(set, catalog))
        .collect();

    let meta = build_meta(
        &state.config().site_root,
        path,
        raw_query.as_deref(),
        page,
        total,
    );

    let body = json!({ "meta": meta, "objects": objects });
    respond(&state, &key, &format, &body)
}

/// Handle `GET /1.0/boundary-set/{slug}/`.
async fn boundary_set_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    RawQuery(raw_query): RawQuery,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Response {
    let request_id = extract_or_generate_request_id(&headers);

    let format = match ApiFormat::negotiate(str_pairs(&params), request_id.as_str()) {
        Ok(format) => format,
        Err(problem) => return problem.into_response(),
    };

    let path = resources::set_uri(&slug);
    let key = cache_key(&path, raw_query.as_deref());
    if let Some(response) = cached(&state, "boundary_set_detail", &key) {
        return response;
    }

    let catalog = state.catalog();
    let Some(set) = catalog.set_by_slug(&slug) else {
        return ProblemDetails::not_found(
            format!("no boundary set with slug {:?}", slug),
            request_id.as_str(),
        )
        .into_response();
    };

    let body = set_resource(set, catalog);
    respond(&state, &key, &format, &body)
}

/// Handle `GET /1.0/boundary/`.
async fn boundary_list(
    State(state): State<AppState>,
    RawQuery(raw_query): RawQuery,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Response {
    let request_id = extract_or_generate_request_id(&headers);
    let path = "/1.0/boundary/";

    let format = match ApiFormat::negotiate(str_pairs(&params), request_id.as_str()) {
        Ok(format) => format,
        Err(problem) => return problem.into_response(),
    };

    let key = cache_key(path, raw_query.as_deref());
    if let Some(response) = cached(&state, "boundary_list", &key) {
        return response;
    }

    let page = match PageParams::parse(str_pairs(&params), state.config(), request_id.as_str()) {
        Ok(page) => page,
        Err(problem) => return problem.into_response(),
    };

    // Filter validation happens entirely before any store call.
    let plan = match translate(str_pairs(&params)) {
        Ok(plan) => plan,
        Err(e) => return lib_error_response(&e, request_id.as_str()),
    };

    let catalog = state.catalog();
    let ids = match execute(&plan, catalog, state.store()) {
        Ok(ids) => ids,
        Err(e) => return lib_error_response(&e, request_id.as_str()),
    };

    for filter in plan_filter_labels(&plan) {
        record_boundary_query(filter);
    }
    record_boundaries_matched(ids.len(), "boundary_list");

    let detail = shape_detail(&params);
    let excludes = excludes_list(&params);

    let total = ids.len();
    let mut objects: Vec<Value> = ids
        .iter()
        .skip(page.offset)
        .take(page.limit)
        .filter_map(|&id| catalog.boundary_by_id(id))
        .map(|b| boundary_resource(b, catalog))
        .collect();
    boundaryline_lib::shape_records(&mut objects, detail, &excludes);

    let meta = build_meta(
        &state.config().site_root,
        path,
        raw_query.as_deref(),
        page,
        total,
    );

    info!(
        request_id = %request_id,
        matched = total,
        returned = objects.len(),
        "boundary query completed"
    );

    let body = json!({ "meta": meta, "objects": objects });
    respond(&state, &key, &format, &body)
}

/// Handle `GET /1.0/boundary/{slug}/`.
async fn boundary_detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    RawQuery(raw_query): RawQuery,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
) -> Response {
    let request_id = extract_or_generate_request_id(&headers);

    let format = match ApiFormat::negotiate(str_pairs(&params), request_id.as_str()) {
        Ok(format) => format,
        Err(problem) => return problem.into_response(),
    };

    let path = boundary_uri(&slug);
    let key = cache_key(&path, raw_query.as_deref());
    if let Some(response) = cached(&state, "boundary_detail", &key) {
        return response;
    }

    let catalog = state.catalog();
    let Some(boundary) = catalog.boundary_by_slug(&slug) else {
        return ProblemDetails::not_found(
            format!("no boundary with slug {:?}", slug),
            request_id.as_str(),
        )
        .into_response();
    };

    let mut body = boundary_resource(boundary, catalog);
    boundaryline_lib::shape_record(&mut body, shape_detail(&params), &excludes_list(&params));

    respond(&state, &key, &format, &body)
}

/// Handle `GET /1.0/boundary-set/{slug}/{external_id}`.
///
/// Resolves the source-system id inside the set and redirects to the
/// canonical boundary detail URL.
async fn external_id_redirect(
    State(state): State<AppState>,
    Path((slug, external_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let request_id = extract_or_generate_request_id(&headers);

    match state.catalog().boundary_by_external_id(&slug, &external_id) {
        Ok(boundary) => {
            let location = format!(
                "{}{}",
                state.config().site_root,
                boundary_uri(&boundary.slug)
            );
            (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
        }
        Err(e) => lib_error_response(&e, request_id.as_str()),
    }
}

/// Map a library error onto a problem response, logging internal failures.
fn lib_error_response(error: &LibError, request_id: &str) -> Response {
    let problem = from_lib_error(error, request_id);
    if problem.status >= 500 {
        error!(request_id = %request_id, error = %error, "request failed");
    }
    problem.into_response()
}

fn shape_detail(params: &[(String, String)]) -> ShapeDetail {
    param(params, "shape_type")
        .map(ShapeDetail::parse)
        .unwrap_or_default()
}

fn excludes_list(params: &[(String, String)]) -> Vec<String> {
    param(params, "excludes")
        .map(boundaryline_lib::parse_excludes)
        .unwrap_or_default()
}

fn plan_filter_labels(plan: &boundaryline_lib::QueryPlan) -> Vec<&'static str> {
    let mut labels = Vec::new();
    if plan.set_slugs.is_some() {
        labels.push("sets");
    }
    if plan.contains.is_some() {
        labels.push("contains");
    }
    if plan.near.is_some() {
        labels.push("near");
    }
    if plan.intersects.is_some() {
        labels.push("intersects");
    }
    if plan.external_id.is_some() {
        labels.push("external_id");
    }
    if labels.is_empty() {
        labels.push("none");
    }
    labels
}
