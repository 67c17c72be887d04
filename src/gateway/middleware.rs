//! Bearer-token authentication for user routes
//!
//! Tokens are issued by the identity service with the shared HS256 secret.
//! `sub` carries the numeric user id; handlers read it back through
//! `Extension<AuthenticatedUser>`.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::state::AppState;
use super::types::{ApiError, error_codes};
use crate::core_types::UserId;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id as string
    pub exp: usize,
    pub iat: usize,
}

/// Caller identity injected into request extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

pub fn verify_token(secret: &str, token: &str) -> Result<AuthenticatedUser, ApiError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!(error = %e, "Token rejected");
        ApiError::unauthorized(error_codes::AUTH_FAILED, "Invalid or expired token")
    })?;

    let user_id = data.claims.sub.parse::<UserId>().map_err(|_| {
        ApiError::unauthorized(error_codes::AUTH_FAILED, "Invalid user ID in token")
    })?;
    Ok(AuthenticatedUser { user_id })
}

pub async fn jwt_auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            ApiError::unauthorized(error_codes::MISSING_AUTH, "Missing Authorization header")
        })?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::unauthorized(error_codes::AUTH_FAILED, "Invalid token format"))?;

    let user = verify_token(&state.jwt_secret, token.trim())?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
