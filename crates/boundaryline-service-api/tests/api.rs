//! End-to-end tests for the boundary API over the in-memory fixture catalog.

use axum::http::{HeaderName, HeaderValue};
use axum_test::TestServer;
use serde_json::Value;

use boundaryline_service_api::build_router;
use boundaryline_service_shared::test_utils::{fixture_state, fixture_state_with_config, test_config};

fn server() -> TestServer {
    TestServer::new(build_router(fixture_state())).expect("router builds")
}

#[tokio::test]
async fn boundary_set_list_shape() {
    let server = server();
    let response = server.get("/1.0/boundary-set/").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["meta"]["total_count"], 2);
    assert_eq!(body["meta"]["limit"], 20);
    assert_eq!(body["meta"]["next"], Value::Null);

    let objects = body["objects"].as_array().unwrap();
    assert_eq!(objects.len(), 2);
    // Sets come back in name order.
    assert_eq!(objects[0]["name"], "Community Areas");
    assert_eq!(objects[1]["name"], "Wards");

    // Internal fields are excluded from the wire format.
    assert!(objects[0].get("id").is_none());
    assert!(objects[0].get("singular").is_none());
    assert!(objects[0].get("kind_first").is_none());

    // Boundaries appear as resource URIs.
    let wards_boundaries = objects[1]["boundaries"].as_array().unwrap();
    assert!(wards_boundaries.contains(&Value::String("/1.0/boundary/ward-1/".to_string())));
}

#[tokio::test]
async fn boundary_set_detail_and_missing_slug() {
    let server = server();

    let response = server.get("/1.0/boundary-set/wards/").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["name"], "Wards");
    assert_eq!(body["resource_uri"], "/1.0/boundary-set/wards/");

    let response = server.get("/1.0/boundary-set/nope/").await;
    assert_eq!(response.status_code(), 404);
    let problem: Value = response.json();
    assert_eq!(problem["type"], "/problems/not-found");
}

#[tokio::test]
async fn boundary_list_defaults_to_simple_shapes() {
    let server = server();
    let response = server.get("/1.0/boundary/").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["meta"]["total_count"], 3);

    for object in body["objects"].as_array().unwrap() {
        assert!(object.get("simple_shape").is_some());
        assert!(object.get("shape").is_none());
        assert!(object.get("id").is_none());
        assert!(object.get("display_name").is_none());
    }
}

#[tokio::test]
async fn boundary_list_shape_type_full_and_none() {
    let server = server();

    let response = server
        .get("/1.0/boundary/")
        .add_query_param("shape_type", "full")
        .await;
    for object in response.json::<Value>()["objects"].as_array().unwrap() {
        assert!(object.get("shape").is_some());
        assert!(object.get("simple_shape").is_none());
    }

    let response = server
        .get("/1.0/boundary/")
        .add_query_param("shape_type", "none")
        .await;
    for object in response.json::<Value>()["objects"].as_array().unwrap() {
        assert!(object.get("shape").is_none());
        assert!(object.get("simple_shape").is_none());
    }
}

#[tokio::test]
async fn boundary_list_excludes_are_best_effort() {
    let server = server();
    let response = server
        .get("/1.0/boundary/")
        .add_query_param("excludes", "metadata,bogus_field")
        .await;
    response.assert_status_ok();

    for object in response.json::<Value>()["objects"].as_array().unwrap() {
        assert!(object.get("metadata").is_none());
        assert!(object.get("name").is_some());
    }
}

#[tokio::test]
async fn boundary_list_filters() {
    let server = server();

    // sets
    let response = server
        .get("/1.0/boundary/")
        .add_query_param("sets", "wards")
        .await;
    let body: Value = response.json();
    assert_eq!(body["meta"]["total_count"], 2);

    // contains: overlap point hits Ward 1 and Austin
    let response = server
        .get("/1.0/boundary/")
        .add_query_param("contains", "41.85,-87.66")
        .await;
    let slugs: Vec<String> = response.json::<Value>()["objects"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["slug"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(slugs, vec!["austin-community-area", "ward-1"]);

    // near with 5 miles reaches only Ward 2
    let response = server
        .get("/1.0/boundary/")
        .add_query_param("near", "41.85,-87.45,5mi")
        .await;
    let body: Value = response.json();
    assert_eq!(body["meta"]["total_count"], 1);
    assert_eq!(body["objects"][0]["slug"], "ward-2");

    // intersects includes the boundary itself
    let response = server
        .get("/1.0/boundary/")
        .add_query_param("intersects", "ward-1")
        .await;
    let slugs: Vec<String> = response.json::<Value>()["objects"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["slug"].as_str().unwrap().to_string())
        .collect();
    assert!(slugs.contains(&"ward-1".to_string()));

    // external_id exact and prefix
    let response = server
        .get("/1.0/boundary/")
        .add_query_param("external_id", "0100")
        .await;
    assert_eq!(response.json::<Value>()["meta"]["total_count"], 1);

    let response = server
        .get("/1.0/boundary/")
        .add_query_param("external_id", "0*")
        .await;
    assert_eq!(response.json::<Value>()["meta"]["total_count"], 2);

    // combined filters AND together
    let response = server
        .get("/1.0/boundary/")
        .add_query_param("contains", "41.85,-87.66")
        .add_query_param("sets", "wards")
        .await;
    let body: Value = response.json();
    assert_eq!(body["meta"]["total_count"], 1);
    assert_eq!(body["objects"][0]["slug"], "ward-1");
}

#[tokio::test]
async fn malformed_filters_are_client_errors() {
    let server = server();

    // near distance without a leading digit
    let response = server
        .get("/1.0/boundary/")
        .add_query_param("near", "41.88,-87.63,mi")
        .await;
    assert_eq!(response.status_code(), 400);
    let problem: Value = response.json();
    assert_eq!(problem["type"], "/problems/invalid-filter");
    assert!(problem["detail"].as_str().unwrap().contains("near"));

    // unparseable contains point
    let response = server
        .get("/1.0/boundary/")
        .add_query_param("contains", "not-a-point")
        .await;
    assert_eq!(response.status_code(), 400);

    // intersects against an unknown slug is a 404
    let response = server
        .get("/1.0/boundary/")
        .add_query_param("intersects", "no-such-boundary")
        .await;
    assert_eq!(response.status_code(), 404);

    // unrecognized filter keys are ignored, not rejected
    let response = server
        .get("/1.0/boundary/")
        .add_query_param("frobnicate", "yes")
        .await;
    response.assert_status_ok();
}

#[tokio::test]
async fn boundary_detail_shaping() {
    let server = server();

    let response = server.get("/1.0/boundary/ward-1/").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["slug"], "ward-1");
    assert_eq!(body["set"], "/1.0/boundary-set/wards/");
    assert!(body.get("simple_shape").is_some());
    assert!(body.get("shape").is_none());

    let response = server
        .get("/1.0/boundary/ward-1/")
        .add_query_param("shape_type", "full")
        .add_query_param("excludes", "metadata")
        .await;
    let body: Value = response.json();
    assert!(body.get("shape").is_some());
    assert!(body.get("simple_shape").is_none());
    assert!(body.get("metadata").is_none());

    let response = server.get("/1.0/boundary/no-such-slug/").await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn external_id_redirect_resolves() {
    let server = server();

    let response = server.get("/1.0/boundary-set/wards/0100").await;
    assert_eq!(response.status_code(), 302);
    assert_eq!(
        response.header("location"),
        "http://testserver/1.0/boundary/ward-1/"
    );

    let response = server.get("/1.0/boundary-set/wards/9999").await;
    assert_eq!(response.status_code(), 404);

    let response = server.get("/1.0/boundary-set/no-such-set/0100").await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn jsonp_wraps_response_body() {
    let server = server();

    let response = server
        .get("/1.0/boundary-set/")
        .add_query_param("callback", "handleData")
        .await;
    response.assert_status_ok();
    assert_eq!(
        response.header("content-type").to_str().unwrap(),
        "text/javascript"
    );
    let text = response.text();
    assert!(text.starts_with("handleData("));
    assert!(text.ends_with(')'));

    // format=jsonp without a callback is a client error
    let response = server
        .get("/1.0/boundary-set/")
        .add_query_param("format", "jsonp")
        .await;
    assert_eq!(response.status_code(), 400);

    // callback names that are not function names are rejected
    let response = server
        .get("/1.0/boundary-set/")
        .add_query_param("callback", "alert(1)")
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn pagination_links_walk_the_collection() {
    let server = server();

    let response = server
        .get("/1.0/boundary/")
        .add_query_param("limit", "1")
        .add_query_param("offset", "1")
        .await;
    let body: Value = response.json();
    assert_eq!(body["meta"]["total_count"], 3);
    assert_eq!(body["objects"].as_array().unwrap().len(), 1);
    assert_eq!(
        body["meta"]["next"],
        "http://testserver/1.0/boundary/?limit=1&offset=2"
    );
    assert_eq!(
        body["meta"]["previous"],
        "http://testserver/1.0/boundary/?limit=1&offset=0"
    );

    // limit=0 is rejected
    let response = server
        .get("/1.0/boundary/")
        .add_query_param("limit", "0")
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn non_get_methods_are_rejected() {
    let server = server();

    let response = server.post("/1.0/boundary/").await;
    assert_eq!(response.status_code(), 405);

    let response = server.delete("/1.0/boundary-set/wards/").await;
    assert_eq!(response.status_code(), 405);
}

#[tokio::test]
async fn throttle_rejects_after_limit() {
    let mut config = test_config();
    config.throttle_limit = 2;
    let server = TestServer::new(build_router(fixture_state_with_config(config))).unwrap();

    // Without connect info or forwarded headers every request shares the
    // anonymous identity.
    server.get("/1.0/boundary-set/").await.assert_status_ok();
    server.get("/1.0/boundary-set/").await.assert_status_ok();

    let response = server.get("/1.0/boundary-set/").await;
    assert_eq!(response.status_code(), 429);
    let problem: Value = response.json();
    assert_eq!(problem["type"], "/problems/rate-limited");
    assert!(response.header("retry-after").to_str().is_ok());

    // A different identity is unaffected in the same window.
    let response = server
        .get("/1.0/boundary-set/")
        .add_header(
            HeaderName::from_static("x-forwarded-for"),
            HeaderValue::from_static("203.0.113.7"),
        )
        .await;
    response.assert_status_ok();

    // Health probes bypass the gate.
    server.get("/health/live").await.assert_status_ok();
}

#[tokio::test]
async fn cached_responses_are_stable_within_ttl() {
    let server = server();

    let first = server
        .get("/1.0/boundary/")
        .add_query_param("sets", "wards")
        .await
        .text();
    let second = server
        .get("/1.0/boundary/")
        .add_query_param("sets", "wards")
        .await
        .text();
    assert_eq!(first, second);
}

#[tokio::test]
async fn health_probes_report_catalog() {
    let server = server();

    server.get("/health/live").await.assert_status_ok();

    let response = server.get("/health/ready").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["sets_loaded"], 2);
    assert_eq!(body["boundaries_loaded"], 3);
}
