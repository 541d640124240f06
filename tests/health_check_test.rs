mod common;

use axum::http::{Method, StatusCode};

use common::TestApp;

#[tokio::test]
async fn health_root_reports_up() {
    let app = TestApp::new().await;

    let body = app
        .request_json(Method::GET, "/health", None, StatusCode::OK)
        .await;

    assert_eq!(body["status"], "up");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn liveness_and_readiness_respond() {
    let app = TestApp::new().await;

    let live = app
        .request_json(Method::GET, "/health/live", None, StatusCode::OK)
        .await;
    assert_eq!(live["alive"], true);

    let ready = app
        .request_json(Method::GET, "/health/ready", None, StatusCode::OK)
        .await;
    assert_eq!(ready["ready"], true);
}

#[tokio::test]
async fn detailed_health_includes_database_check() {
    let app = TestApp::new().await;

    let body = app
        .request_json(Method::GET, "/health/details", None, StatusCode::OK)
        .await;

    assert_eq!(body["status"], "up");
    assert_eq!(body["details"]["database"]["status"], "up");
}
