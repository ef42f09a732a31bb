//! Admin notification management and replay.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use domain::models::notification::{
    AdminNotificationsResponse, AdminUserNotificationsResponse, CreateNotificationRequest,
    ReplayPayload, ReplayResponse, UpdateNotificationRequest,
};
use domain::models::realtime::{tables, ChangeEvent};
use domain::models::{Notification, UserNotification};
use persistence::repositories::{NotificationRepository, UserNotificationRepository};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminAuth;
use crate::middleware::metrics::record_notification_replay;

fn not_found() -> ApiError {
    ApiError::NotFound("Notification not found".to_string())
}

/// List every global notification.
///
/// GET /api/v1/admin/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    _admin: AdminAuth,
) -> Result<Json<AdminNotificationsResponse>, ApiError> {
    let data = NotificationRepository::new(state.pool.clone())
        .list_all()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(AdminNotificationsResponse { data }))
}

/// Create a global notification.
///
/// POST /api/v1/admin/notifications
pub async fn create_notification(
    State(state): State<AppState>,
    admin: AdminAuth,
    Json(request): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<Notification>), ApiError> {
    request.validate()?;

    let notification: Notification = NotificationRepository::new(state.pool.clone())
        .create(
            request.title.trim(),
            request.message.trim(),
            request.is_active.unwrap_or(true),
            admin.user_id(),
        )
        .await?
        .into();

    info!(
        notification_id = %notification.id,
        admin_id = %admin.user_id(),
        "Notification created"
    );

    state
        .realtime
        .publish_change(ChangeEvent::insert(tables::NOTIFICATIONS, &notification));

    Ok((StatusCode::CREATED, Json(notification)))
}

/// Edit a global notification.
///
/// PUT /api/v1/admin/notifications/:notification_id
pub async fn update_notification(
    State(state): State<AppState>,
    admin: AdminAuth,
    Path(notification_id): Path<Uuid>,
    Json(request): Json<UpdateNotificationRequest>,
) -> Result<Json<Notification>, ApiError> {
    request.validate()?;

    let notification: Notification = NotificationRepository::new(state.pool.clone())
        .update(
            notification_id,
            request.title.as_deref().map(str::trim),
            request.message.as_deref().map(str::trim),
            request.is_active,
        )
        .await?
        .map(Into::into)
        .ok_or_else(not_found)?;

    info!(
        notification_id = %notification.id,
        admin_id = %admin.user_id(),
        "Notification updated"
    );

    state
        .realtime
        .publish_change(ChangeEvent::update(tables::NOTIFICATIONS, &notification));

    Ok(Json(notification))
}

/// Delete a global notification and its read markers.
///
/// DELETE /api/v1/admin/notifications/:notification_id
pub async fn delete_notification(
    State(state): State<AppState>,
    admin: AdminAuth,
    Path(notification_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted: Notification = NotificationRepository::new(state.pool.clone())
        .delete(notification_id)
        .await?
        .map(Into::into)
        .ok_or_else(not_found)?;

    info!(
        notification_id = %deleted.id,
        admin_id = %admin.user_id(),
        "Notification deleted"
    );

    state
        .realtime
        .publish_change(ChangeEvent::delete(tables::NOTIFICATIONS, &deleted));

    Ok(StatusCode::NO_CONTENT)
}

/// Flip a global notification's active flag.
///
/// POST /api/v1/admin/notifications/:notification_id/toggle
pub async fn toggle_notification(
    State(state): State<AppState>,
    admin: AdminAuth,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Notification>, ApiError> {
    let notification: Notification = NotificationRepository::new(state.pool.clone())
        .toggle_active(notification_id)
        .await?
        .map(Into::into)
        .ok_or_else(not_found)?;

    info!(
        notification_id = %notification.id,
        is_active = notification.is_active,
        admin_id = %admin.user_id(),
        "Notification toggled"
    );

    state
        .realtime
        .publish_change(ChangeEvent::update(tables::NOTIFICATIONS, &notification));

    Ok(Json(notification))
}

/// Pop a global notification up again on every connected client.
///
/// POST /api/v1/admin/notifications/:notification_id/replay
///
/// Nothing is written; read state is untouched.
pub async fn replay_notification(
    State(state): State<AppState>,
    admin: AdminAuth,
    Path(notification_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ReplayResponse>), ApiError> {
    let notification: Notification = NotificationRepository::new(state.pool.clone())
        .find_by_id(notification_id)
        .await?
        .map(Into::into)
        .ok_or_else(not_found)?;

    let payload = ReplayPayload::for_global(&notification, Utc::now());
    Ok((StatusCode::ACCEPTED, Json(publish_replay(&state, &admin, payload))))
}

/// List every team notification row.
///
/// GET /api/v1/admin/user-notifications
pub async fn list_user_notifications(
    State(state): State<AppState>,
    _admin: AdminAuth,
) -> Result<Json<AdminUserNotificationsResponse>, ApiError> {
    let data = UserNotificationRepository::new(state.pool.clone())
        .list_all()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(AdminUserNotificationsResponse { data }))
}

/// Delete one team notification row.
///
/// DELETE /api/v1/admin/user-notifications/:notification_id
pub async fn delete_user_notification(
    State(state): State<AppState>,
    admin: AdminAuth,
    Path(notification_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted: UserNotification = UserNotificationRepository::new(state.pool.clone())
        .delete(notification_id)
        .await?
        .map(Into::into)
        .ok_or_else(not_found)?;

    info!(
        notification_id = %deleted.id,
        recipient_id = %deleted.user_id,
        admin_id = %admin.user_id(),
        "User notification deleted"
    );

    state
        .realtime
        .publish_change(ChangeEvent::delete(tables::USER_NOTIFICATIONS, &deleted));

    Ok(StatusCode::NO_CONTENT)
}

/// Pop a team notification up again for its recipient only.
///
/// POST /api/v1/admin/user-notifications/:notification_id/replay
pub async fn replay_user_notification(
    State(state): State<AppState>,
    admin: AdminAuth,
    Path(notification_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ReplayResponse>), ApiError> {
    let notification: UserNotification = UserNotificationRepository::new(state.pool.clone())
        .find_by_id(notification_id)
        .await?
        .map(Into::into)
        .ok_or_else(not_found)?;

    let payload = ReplayPayload::for_user(&notification, Utc::now());
    Ok((StatusCode::ACCEPTED, Json(publish_replay(&state, &admin, payload))))
}

fn publish_replay(state: &AppState, admin: &AdminAuth, payload: ReplayPayload) -> ReplayResponse {
    let receivers = state.realtime.publish_replay(&payload);

    info!(
        original_id = %payload.original_id,
        channel = payload.channel(),
        receivers,
        admin_id = %admin.user_id(),
        "Notification replayed"
    );
    record_notification_replay(payload.channel());

    ReplayResponse {
        original_id: payload.original_id,
        channel: payload.channel(),
        event: payload.event(),
        receivers,
    }
}
