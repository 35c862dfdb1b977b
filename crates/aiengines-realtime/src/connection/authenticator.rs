//! WebSocket authentication: validates the JWT presented at upgrade time.

use std::sync::Arc;

use aiengines_auth::jwt::JwtDecoder;
use aiengines_core::error::AppError;
use aiengines_core::types::UserId;

/// Verified identity of a connecting client.
#[derive(Debug, Clone)]
pub struct AuthenticatedConnection {
    /// User ID from the token subject.
    pub user_id: UserId,
    /// Email, if present in the token.
    pub email: Option<String>,
    /// Display name, if present in the token.
    pub name: Option<String>,
    /// Subscription tier, if present in the token.
    pub tier: Option<String>,
}

/// Authenticates WebSocket connections using JWT tokens.
#[derive(Clone)]
pub struct WsAuthenticator {
    /// JWT decoder.
    decoder: Arc<JwtDecoder>,
}

impl std::fmt::Debug for WsAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsAuthenticator").finish()
    }
}

impl WsAuthenticator {
    /// Creates a new WebSocket authenticator.
    pub fn new(decoder: Arc<JwtDecoder>) -> Self {
        Self { decoder }
    }

    /// Authenticates a connection from a bearer token (header or query parameter).
    pub fn authenticate(&self, token: &str) -> Result<AuthenticatedConnection, AppError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::unauthorized("Missing access token"));
        }

        let claims = self.decoder.decode(token)?;

        Ok(AuthenticatedConnection {
            user_id: claims.user_id(),
            email: claims.email,
            name: claims.name,
            tier: claims.tier,
        })
    }
}
