//! Rate limiting middleware.
//!
//! Per-user request budget backed by governor's GCRA limiter.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::{Clock, DefaultClock},
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovRateLimiter,
};
use std::{
    collections::HashMap,
    num::NonZeroU32,
    sync::{Arc, RwLock},
};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::user_auth::UserAuth;

type UserRateLimiter = GovRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

const FALLBACK_PER_MINUTE: NonZeroU32 = match NonZeroU32::new(100) {
    Some(n) => n,
    None => NonZeroU32::MIN,
};

/// Limiters keyed by authenticated user.
pub struct RateLimiterState {
    limiters: RwLock<HashMap<Uuid, Arc<UserRateLimiter>>>,
    rate_limit_per_minute: u32,
}

impl RateLimiterState {
    pub fn new(rate_limit_per_minute: u32) -> Self {
        Self {
            limiters: RwLock::new(HashMap::new()),
            rate_limit_per_minute,
        }
    }

    fn get_or_create_limiter(&self, user_id: Uuid) -> Arc<UserRateLimiter> {
        {
            let limiters = self.limiters.read().unwrap_or_else(|e| e.into_inner());
            if let Some(limiter) = limiters.get(&user_id) {
                return limiter.clone();
            }
        }

        let mut limiters = self.limiters.write().unwrap_or_else(|e| e.into_inner());
        limiters
            .entry(user_id)
            .or_insert_with(|| {
                let per_minute =
                    NonZeroU32::new(self.rate_limit_per_minute).unwrap_or(FALLBACK_PER_MINUTE);
                Arc::new(GovRateLimiter::direct(Quota::per_minute(per_minute)))
            })
            .clone()
    }

    /// Returns `Err(retry_after_secs)` when the user is over budget.
    pub fn check(&self, user_id: Uuid) -> Result<(), u64> {
        let limiter = self.get_or_create_limiter(user_id);

        limiter.check().map_err(|not_until| {
            let wait = not_until.wait_time_from(DefaultClock::default().now());
            wait.as_secs().max(1)
        })
    }

    pub fn active_limiters(&self) -> usize {
        self.limiters.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("active_limiters", &self.active_limiters())
            .finish()
    }
}

/// Applies the per-user budget.
///
/// Must run after `require_user_auth` so the caller is in request extensions;
/// requests without one pass through.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(user_id) = req.extensions().get::<UserAuth>().map(|a| a.user_id) else {
        return next.run(req).await;
    };

    if let Some(ref rate_limiter) = state.rate_limiter {
        if let Err(retry_after) = rate_limiter.check(user_id) {
            tracing::warn!(
                user_id = %user_id,
                retry_after,
                limit = state.config.security.rate_limit_per_minute,
                "Rate limit exceeded"
            );
            return ApiError::RateLimited { retry_after }.into_response();
        }
    }

    next.run(req).await
}
