//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use aiengines_auth::jwt::JwtDecoder;
use aiengines_core::config::AppConfig;
use aiengines_realtime::connection::WsAuthenticator;
use aiengines_realtime::server::RealtimeEngine;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Real-time hub and scheduler
    pub realtime: Arc<RealtimeEngine>,
    /// Verifies the token presented on the WebSocket handshake
    pub authenticator: Arc<WsAuthenticator>,
    /// Process start, for uptime reporting
    pub started_at: Instant,
}

impl AppState {
    /// Builds the state around an already-constructed engine.
    pub fn new(config: AppConfig, realtime: RealtimeEngine) -> Self {
        let decoder = Arc::new(JwtDecoder::new(&config.auth));
        Self {
            config: Arc::new(config),
            realtime: Arc::new(realtime),
            authenticator: Arc::new(WsAuthenticator::new(decoder)),
            started_at: Instant::now(),
        }
    }
}
