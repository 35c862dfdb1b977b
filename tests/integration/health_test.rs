//! Integration tests for health endpoints.

use http::StatusCode;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    for path in ["/health", "/api/health"] {
        let response = app.request("GET", path, None).await;

        assert_eq!(response.status, StatusCode::OK, "path {path}");
        assert_eq!(response.body["status"], "ok");
        assert!(response.body["timestamp"].is_string());
        assert!(response.body["version"].is_string());
    }
}

#[tokio::test]
async fn test_detailed_health_check() {
    let app = TestApp::new();

    let response = app.request("GET", "/api/health/detailed", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["ws_connections"], 0);
    assert_eq!(response.body["online_users"], 0);
    assert_eq!(response.body["producers_running"], false);
    let metrics = &response.body["metrics"];
    for field in [
        "connections_total",
        "connections_active",
        "messages_received",
        "messages_sent",
        "delivery_failures",
        "messages_dropped",
        "protocol_errors",
        "subscriptions_total",
        "producer_errors",
    ] {
        assert!(metrics[field].is_u64(), "missing metric {field}");
    }
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = TestApp::new();
    let response = app.request("GET", "/api/projects", None).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
