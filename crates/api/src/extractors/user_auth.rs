//! Caller identity extractors.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use persistence::repositories::ProfileRepository;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::{bearer_token, UserAuth};

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Already verified by require_user_auth
        if let Some(auth) = parts.extensions.get::<UserAuth>() {
            return Ok(auth.clone());
        }

        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        Ok(UserAuth::validate(&state.jwt, token)?)
    }
}

/// An authenticated caller whose profile carries the admin flag.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    pub user: UserAuth,
}

impl AdminAuth {
    pub fn user_id(&self) -> uuid::Uuid {
        self.user.user_id
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = UserAuth::from_request_parts(parts, state).await?;

        let is_admin = ProfileRepository::new(state.pool.clone())
            .find_by_user_id(user.user_id)
            .await?
            .is_some_and(|p| p.is_admin);

        if !is_admin {
            tracing::warn!(user_id = %user.user_id, "Non-admin attempted admin operation");
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }

        Ok(Self { user })
    }
}
