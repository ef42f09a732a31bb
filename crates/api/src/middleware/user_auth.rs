//! Session token authentication middleware.
//!
//! Verifies the Bearer access token issued by the auth service and stores
//! the caller's identity in request extensions.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use uuid::Uuid;

use crate::app::AppState;
use crate::config::JwtAuthConfig;
use shared::jwt::{JwtConfig, JwtError};

/// Authenticated caller extracted from a session token.
#[derive(Debug, Clone)]
pub struct UserAuth {
    /// User ID from the token subject claim.
    pub user_id: Uuid,
    /// Token ID (jti).
    pub jti: String,
    /// Email claim, when the auth service includes one.
    pub email: Option<String>,
}

impl UserAuth {
    /// Validates an access token and returns the caller's identity.
    pub fn validate(jwt_config: &JwtConfig, token: &str) -> Result<Self, JwtError> {
        let claims = jwt_config.validate_access_token(token)?;
        let user_id = claims.user_id()?;

        Ok(UserAuth {
            user_id,
            jti: claims.jti,
            email: claims.email,
        })
    }

    /// Builds the token verifier from configuration.
    pub fn create_jwt_config(config: &JwtAuthConfig) -> Result<JwtConfig, JwtError> {
        JwtConfig::from_rsa_pem(
            &config.public_key,
            &config.private_key,
            config.access_token_expiry_secs,
            config.leeway_secs,
        )
    }
}

/// Returns the token from an `Authorization: Bearer` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Middleware that requires a valid session token.
pub async fn require_user_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = bearer_token(req.headers()) else {
        return unauthorized_response("Missing or invalid Authorization header");
    };

    match UserAuth::validate(&state.jwt, token) {
        Ok(auth) => {
            req.extensions_mut().insert(auth);
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!(error = %e, "Token validation failed");
            unauthorized_response("Invalid or expired token")
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": "unauthorized",
            "message": message
        })),
    )
        .into_response()
}
