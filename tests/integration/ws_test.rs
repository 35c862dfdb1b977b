//! Integration tests for WebSocket connection and messaging.

use std::time::Duration;

use futures::SinkExt;
use http::StatusCode;
use serde_json::json;
use tokio_tungstenite::tungstenite::{self, Message};

use aiengines_auth::Claims;
use aiengines_core::types::UserId;
use aiengines_realtime::Envelope;

use crate::helpers::{self, TestApp, WsClient, next_json};

async fn send(ws: &mut WsClient, frame: &str) {
    ws.send(Message::Text(frame.into()))
        .await
        .expect("Failed to send frame");
}

async fn wait_for_connections(app: &TestApp, expected: usize) {
    let hub = &app.state.realtime.hub;
    for _ in 0..100 {
        if hub.connection_count().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("expected {expected} connections, found {}", hub.connection_count().await);
}

#[tokio::test]
async fn test_ws_upgrade_without_token() {
    let app = TestApp::new();

    let response = app.request("GET", "/ws", None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["error"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_ws_upgrade_with_bad_tokens() {
    let app = TestApp::new();

    let response = app.request("GET", "/ws", Some("not-a-jwt")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app.request("GET", "/ws?token=garbage", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    // userId alone is never trusted.
    let response = app.request("GET", "/ws?userId=alice", None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let now = chrono::Utc::now().timestamp();
    let expired = app
        .encoder
        .encode(&Claims {
            sub: "alice".to_string(),
            email: None,
            name: None,
            tier: None,
            iat: now - 7200,
            exp: now - 3600,
            jti: uuid::Uuid::new_v4(),
        })
        .unwrap();
    let response = app.request("GET", "/ws", Some(&expired)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_handshake_rejected_over_socket() {
    let app = TestApp::new();
    let addr = app.spawn_server().await;

    let err = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .expect_err("handshake without token must fail");
    match err {
        tungstenite::Error::Http(response) => {
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED)
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(app.state.realtime.hub.connection_count().await, 0);
}

#[tokio::test]
async fn test_dashboard_session_scenario() {
    let app = TestApp::new();
    let addr = app.spawn_server().await;
    let mut ws = helpers::connect_with_query(addr, &app.token("u1")).await;

    let welcome = next_json(&mut ws).await;
    assert_eq!(welcome["type"], "welcome");
    assert_eq!(welcome["data"]["message"], "Connected to AI Engines Platform");
    assert!(welcome["timestamp"].is_string());

    send(&mut ws, r#"{"type":"ping","data":{"x":1}}"#).await;
    let pong = next_json(&mut ws).await;
    assert_eq!(pong["type"], "pong");
    assert_eq!(pong["data"], json!({"x": 1}));

    send(&mut ws, r#"{"type":"subscribe_agent_updates"}"#).await;
    let confirmed = next_json(&mut ws).await;
    assert_eq!(confirmed["type"], "subscription_confirmed");
    assert_eq!(confirmed["data"]["subscription"], "agent_updates");

    let scheduler = &app.state.realtime.scheduler;
    assert_eq!(scheduler.tick("agent_status").await.unwrap(), 1);
    let update = next_json(&mut ws).await;
    assert_eq!(update["type"], "agent_status_update");
    assert_eq!(update["data"]["agentId"], "1");
    assert!(update["data"]["performance"]["successRate"].is_f64());

    // Not subscribed to task updates.
    assert_eq!(scheduler.tick("task_progress").await.unwrap(), 0);

    send(&mut ws, r#"{"type":"bogus"}"#).await;
    let error = next_json(&mut ws).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["data"]["error"], "Unknown message type: bogus");

    send(&mut ws, "{not json").await;
    let error = next_json(&mut ws).await;
    assert_eq!(error["data"]["error"], "Invalid message format");

    send(&mut ws, r#"{"type":"ping","data":"still here"}"#).await;
    let pong = next_json(&mut ws).await;
    assert_eq!(pong["type"], "pong");
    assert_eq!(pong["data"], "still here");

    ws.close(None).await.expect("Failed to close");
    wait_for_connections(&app, 0).await;
    assert_eq!(app.state.realtime.hub.user_count().await, 0);
}

#[tokio::test]
async fn test_identity_comes_from_token_not_query() {
    let app = TestApp::new();
    let addr = app.spawn_server().await;
    let token = app.token("alice");

    let mut ws = helpers::connect_with_header(addr, "/ws?userId=mallory", &token).await;
    assert_eq!(next_json(&mut ws).await["type"], "welcome");

    let hub = &app.state.realtime.hub;
    assert_eq!(hub.user_connections(&UserId::from("alice")).await.len(), 1);
    assert!(hub.user_connections(&UserId::from("mallory")).await.is_empty());
}

#[tokio::test]
async fn test_send_to_user_reaches_every_tab() {
    let app = TestApp::new();
    let addr = app.spawn_server().await;
    let token = app.token("u1");

    let mut tab1 = helpers::connect_with_query(addr, &token).await;
    let mut tab2 = helpers::connect_with_query(addr, &token).await;
    let mut other = helpers::connect_with_query(addr, &app.token("u2")).await;
    for ws in [&mut tab1, &mut tab2, &mut other] {
        assert_eq!(next_json(ws).await["type"], "welcome");
    }

    let hub = &app.state.realtime.hub;
    let envelope = Envelope::new("task_progress_update", json!({"taskId": "7"}));
    assert_eq!(hub.send_to_user(&UserId::from("u1"), &envelope).await, 2);

    assert_eq!(next_json(&mut tab1).await["data"]["taskId"], "7");
    assert_eq!(next_json(&mut tab2).await["data"]["taskId"], "7");

    // u2 sees only its own ping reply, not the targeted update.
    send(&mut other, r#"{"type":"ping"}"#).await;
    assert_eq!(next_json(&mut other).await["type"], "pong");
}

#[tokio::test]
async fn test_engine_shutdown_closes_sockets() {
    let app = TestApp::new();
    let addr = app.spawn_server().await;
    let mut ws = helpers::connect_with_query(addr, &app.token("u1")).await;
    assert_eq!(next_json(&mut ws).await["type"], "welcome");

    app.state.realtime.shutdown().await;

    let closed = tokio::time::timeout(Duration::from_secs(2), async {
        use futures::StreamExt;
        while let Some(msg) = ws.next().await {
            match msg {
                Ok(Message::Close(_)) | Err(_) => return true,
                Ok(_) => {}
            }
        }
        true
    })
    .await
    .expect("socket was not closed");
    assert!(closed);
}
