//! Shared test helpers for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use futures::StreamExt;
use http::{Request, StatusCode};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tower::ServiceExt;

use aiengines_api::{AppState, build_app};
use aiengines_auth::jwt::JwtEncoder;
use aiengines_core::config::AppConfig;
use aiengines_realtime::server::RealtimeEngine;

/// Signing secret shared by the test config and token encoder.
pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Shared state, for reaching into the hub and scheduler
    pub state: AppState,
    /// Mints tokens accepted by the app
    pub encoder: JwtEncoder,
}

/// Config with timers disabled; tests drive producers with `tick`.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = TEST_SECRET.to_string();
    config.realtime.producers.enabled = false;
    config.logging.format = "pretty".to_string();
    config
}

impl TestApp {
    /// Create a new test application
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        config.validate().expect("test config must be valid");
        let encoder = JwtEncoder::new(&config.auth);
        let engine = RealtimeEngine::new(config.realtime.clone());
        let state = AppState::new(config, engine);
        let router = build_app(state.clone());
        Self {
            router,
            state,
            encoder,
        }
    }

    /// A valid access token for `user`.
    pub fn token(&self, user: &str) -> String {
        self.encoder.issue(user).expect("Failed to issue token").0
    }

    /// Send a request through the router without a network socket
    pub async fn request(&self, method: &str, path: &str, token: Option<&str>) -> TestResponse {
        let mut req = Request::builder().method(method).uri(path);

        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let req = req.body(Body::empty()).expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Serve the app on an ephemeral local port.
    pub async fn spawn_server(&self) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Test server failed");
        });
        addr
    }
}

/// Open a WebSocket with the token in the query string.
pub async fn connect_with_query(addr: SocketAddr, token: &str) -> WsClient {
    let url = format!("ws://{addr}/ws?token={token}");
    let (ws, _) = tokio_tungstenite::connect_async(url)
        .await
        .expect("WebSocket handshake failed");
    ws
}

/// Open a WebSocket with the token in the `Authorization` header.
pub async fn connect_with_header(addr: SocketAddr, path_and_query: &str, token: &str) -> WsClient {
    let mut request = format!("ws://{addr}{path_and_query}")
        .into_client_request()
        .expect("Invalid WebSocket URL");
    request.headers_mut().insert(
        "Authorization",
        format!("Bearer {token}").parse().expect("Invalid header"),
    );
    let (ws, _) = tokio_tungstenite::connect_async(request)
        .await
        .expect("WebSocket handshake failed");
    ws
}

/// Next text frame parsed as JSON, failing the test after two seconds.
pub async fn next_json(ws: &mut WsClient) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("Timed out waiting for frame")
            .expect("Stream ended")
            .expect("WebSocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).expect("Frame is not JSON");
        }
    }
}

/// Test response wrapper
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}
