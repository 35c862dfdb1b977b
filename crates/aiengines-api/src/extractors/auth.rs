//! `VerifiedUser` extractor: pulls the JWT from the request and verifies it.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::Deserialize;

use aiengines_core::error::AppError;
use aiengines_realtime::connection::AuthenticatedConnection;

use crate::error::ApiError;
use crate::state::AppState;

/// Identity verified from the `Authorization: Bearer` header or, for
/// browsers that cannot set headers on a WebSocket handshake, the `token`
/// query parameter. Any `userId` parameter is ignored.
#[derive(Debug, Clone)]
pub struct VerifiedUser(pub AuthenticatedConnection);

impl std::ops::Deref for VerifiedUser {
    type Target = AuthenticatedConnection;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

impl FromRequestParts<AppState> for VerifiedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.or_else(|| query_token(parts));
        let token = token.ok_or_else(|| AppError::unauthorized("Missing access token"))?;

        let conn = state.authenticator.authenticate(&token)?;
        Ok(VerifiedUser(conn))
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<String>, AppError> {
    let Some(header) = parts.headers.get("authorization") else {
        return Ok(None);
    };
    let value = header
        .to_str()
        .map_err(|_| AppError::unauthorized("Invalid Authorization header"))?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::unauthorized("Invalid Authorization header format"))?;
    Ok(Some(token.to_string()))
}

fn query_token(parts: &Parts) -> Option<String> {
    Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(q)| q.token)
        .filter(|t| !t.is_empty())
}
