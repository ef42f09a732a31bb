use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use shared::jwt::{JwtConfig, JwtError};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_user_auth,
    security_headers_middleware, trace_id, RateLimiterState, UserAuth,
};
use crate::routes::{
    admin_notifications, admin_registrations, admin_rooms, admin_teams, health, invites,
    notifications, realtime, registrations, rooms, team_notifications, teams,
};
use crate::services::RealtimeHub;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
    pub realtime: RealtimeHub,
}

pub fn create_app(config: Config, pool: PgPool) -> Result<Router, JwtError> {
    let jwt = Arc::new(UserAuth::create_jwt_config(&config.jwt)?);
    let config = Arc::new(config);

    let rate_limiter = if config.security.rate_limit_per_minute > 0 {
        Some(Arc::new(RateLimiterState::new(
            config.security.rate_limit_per_minute,
        )))
    } else {
        None
    };

    let state = AppState {
        pool,
        config: config.clone(),
        jwt,
        rate_limiter,
        realtime: RealtimeHub::new(config.realtime.channel_capacity),
    };

    let cors = if config.security.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Participant routes. Admin handlers sit here too and check the role
    // through the AdminAuth extractor.
    let protected_routes = Router::new()
        // Registration
        .route(
            "/api/v1/registration",
            get(registrations::get_my_registration)
                .post(registrations::create_registration)
                .put(registrations::update_registration),
        )
        .route(
            "/api/v1/registration/check-in",
            get(registrations::check_in_status),
        )
        // Teams and invites
        .route("/api/v1/teams", post(teams::create_team))
        .route("/api/v1/teams/mine", get(teams::get_my_team))
        .route("/api/v1/teams/:team_id/invites", post(teams::send_invites))
        .route("/api/v1/teams/:team_id/finalize", post(teams::finalize_team))
        .route(
            "/api/v1/teams/:team_id/notifications",
            post(team_notifications::leader_send),
        )
        .route("/api/v1/invites", get(invites::list_my_invites))
        .route(
            "/api/v1/invites/:invite_id/respond",
            post(invites::respond_to_invite),
        )
        // Rooms
        .route("/api/v1/rooms", get(rooms::list_rooms))
        // Notifications
        .route("/api/v1/notifications", get(notifications::list_feed))
        .route(
            "/api/v1/notifications/:notification_id/read",
            post(notifications::mark_read).delete(notifications::mark_unread),
        )
        // Admin
        .route(
            "/api/v1/admin/registrations",
            get(admin_registrations::list_registrations),
        )
        .route(
            "/api/v1/admin/registrations/:registration_id/check-in",
            put(admin_registrations::set_check_in),
        )
        .route("/api/v1/admin/teams", get(admin_teams::list_teams))
        .route("/api/v1/admin/teams/:team_id", delete(admin_teams::delete_team))
        .route(
            "/api/v1/admin/teams/:team_id/confirmed",
            put(admin_teams::set_confirmed),
        )
        .route(
            "/api/v1/admin/teams/:team_id/room",
            put(admin_rooms::move_team),
        )
        .route(
            "/api/v1/admin/teams/:team_id/notifications",
            post(team_notifications::admin_send),
        )
        .route("/api/v1/admin/rooms/board", get(admin_rooms::room_board))
        .route(
            "/api/v1/admin/notifications",
            get(admin_notifications::list_notifications)
                .post(admin_notifications::create_notification),
        )
        .route(
            "/api/v1/admin/notifications/:notification_id",
            put(admin_notifications::update_notification)
                .delete(admin_notifications::delete_notification),
        )
        .route(
            "/api/v1/admin/notifications/:notification_id/toggle",
            post(admin_notifications::toggle_notification),
        )
        .route(
            "/api/v1/admin/notifications/:notification_id/replay",
            post(admin_notifications::replay_notification),
        )
        .route(
            "/api/v1/admin/user-notifications",
            get(admin_notifications::list_user_notifications),
        )
        .route(
            "/api/v1/admin/user-notifications/:notification_id",
            delete(admin_notifications::delete_user_notification),
        )
        .route(
            "/api/v1/admin/user-notifications/:notification_id/replay",
            post(admin_notifications::replay_user_notification),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        // Auth runs first (outermost layer = runs first)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    // The realtime socket authenticates itself from the query string.
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        .route(
            "/api/v1/registration/status",
            get(registrations::registration_status),
        )
        .route("/api/v1/realtime", get(realtime::ws_upgrade));

    Ok(Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state))
}
