//! Tests of the production router: request IDs, request metrics, the
//! Prometheus endpoint and the body limit.

mod common;

use std::sync::{Arc, Once};

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use tower::ServiceExt;

use invitegraph_api::http::{create_router_with_observability, AppState, DEFAULT_BODY_LIMIT};
use invitegraph_api::middleware::{RequestMetrics, REQUEST_ID_HEADER};
use invitegraph_api::observability::MetricsState;

use common::*;

static TRACING_INIT: Once = Once::new();

/// Only one global subscriber can exist per process.
fn init_tracing() {
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    });
}

/// A metrics state backed by a recorder that is never installed globally.
fn detached_metrics_state() -> MetricsState {
    MetricsState::new(PrometheusBuilder::new().build_recorder().handle())
}

fn production_router(metrics: Arc<RequestMetrics>, with_metrics: bool) -> Router {
    init_tracing();
    let state = AppState::new(upstream_with_invitations(&[(1, 2), (1, 3)]));
    create_router_with_observability(
        state,
        with_metrics.then(detached_metrics_state),
        "/metrics",
        DEFAULT_BODY_LIMIT,
        metrics,
    )
}

#[tokio::test]
async fn test_request_id_is_returned_on_api_responses() {
    let app = production_router(Arc::new(RequestMetrics::new()), true);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/network/1?depth=1")
                .header(REQUEST_ID_HEADER, "client-supplied-7")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[REQUEST_ID_HEADER], "client-supplied-7");
}

#[tokio::test]
async fn test_error_responses_carry_request_id() {
    let app = production_router(Arc::new(RequestMetrics::new()), true);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/search-users?query=x")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let id = response.headers()[REQUEST_ID_HEADER].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());
}

#[tokio::test]
async fn test_request_metrics_cover_every_route() {
    let metrics = Arc::new(RequestMetrics::new());
    let app = production_router(Arc::clone(&metrics), true);

    get_json(&app, "/health").await;
    get_json(&app, "/api/invitations/1").await;
    get_json(&app, "/api/profile-enhanced/abc").await;
    get_json(&app, "/api/profile-enhanced/1").await;

    assert_eq!(metrics.request_count(), 4);
    assert_eq!(metrics.success_count(), 2);
    assert_eq!(metrics.client_error_count(), 2);
    assert_eq!(metrics.server_error_count(), 0);
}

#[tokio::test]
async fn test_metrics_endpoint_serves_prometheus_text() {
    let app = production_router(Arc::new(RequestMetrics::new()), true);

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
}

#[tokio::test]
async fn test_metrics_endpoint_absent_when_disabled() {
    let app = production_router(Arc::new(RequestMetrics::new()), false);

    let (status, _) = get_json(&app, "/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get_json(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_body_limit_applies_to_api_routes() {
    init_tracing();
    let app = create_router_with_observability(
        AppState::new(upstream_with_invitations(&[])),
        None,
        "/metrics",
        32,
        Arc::new(RequestMetrics::new()),
    );

    let (status, _) = post_json(
        &app,
        "/api/recent-searches",
        serde_json::json!({"id": 1, "profileId": 1, "username": "long-enough-to-exceed-the-limit"}),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
