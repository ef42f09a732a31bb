//! Participant notification feed and read state.
//!
//! Global and per-user notifications share one id space from the caller's
//! point of view: read/unread look the id up as a per-user row first and fall
//! back to a global notification.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::notification::{merge_feed, ListNotificationsResponse, ReadStateResponse};
use domain::models::realtime::{tables, ChangeEvent};
use domain::models::UserNotification;
use persistence::entities::{GlobalFeedEntity, UserNotificationEntity};
use persistence::repositories::{NotificationRepository, UserNotificationRepository};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::UserAuth;

/// The caller's feed, newest first.
///
/// GET /api/v1/notifications
pub async fn list_feed(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<Json<ListNotificationsResponse>, ApiError> {
    let global = NotificationRepository::new(state.pool.clone())
        .list_feed_for_user(user_auth.user_id)
        .await?
        .into_iter()
        .map(GlobalFeedEntity::into_parts)
        .collect();

    let personal = UserNotificationRepository::new(state.pool.clone())
        .list_for_user(user_auth.user_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(ListNotificationsResponse::new(merge_feed(
        global, personal,
    ))))
}

/// Mark a notification read. Repeating the call keeps the first timestamp.
///
/// POST /api/v1/notifications/:notification_id/read
pub async fn mark_read(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<ReadStateResponse>, ApiError> {
    let personal = UserNotificationRepository::new(state.pool.clone());
    if let Some(row) = personal.find_by_id(notification_id).await? {
        ensure_recipient(&row, user_auth.user_id)?;

        let updated: UserNotification = personal
            .mark_read(notification_id, user_auth.user_id)
            .await?
            .map(Into::into)
            .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

        state
            .realtime
            .publish_change(ChangeEvent::update(tables::USER_NOTIFICATIONS, &updated));

        return Ok(Json(ReadStateResponse {
            id: updated.id,
            read_at: updated.read_at,
        }));
    }

    let global = NotificationRepository::new(state.pool.clone());
    if global.find_by_id(notification_id).await?.is_none() {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }

    let read_at = global.mark_read(user_auth.user_id, notification_id).await?;
    debug!(notification_id = %notification_id, user_id = %user_auth.user_id, "Marked read");

    state.realtime.publish_change(ChangeEvent::insert(
        tables::NOTIFICATION_READS,
        &json!({
            "user_id": user_auth.user_id,
            "notification_id": notification_id,
            "read_at": read_at,
        }),
    ));

    Ok(Json(ReadStateResponse {
        id: notification_id,
        read_at: Some(read_at),
    }))
}

/// Mark a notification unread.
///
/// DELETE /api/v1/notifications/:notification_id/read
pub async fn mark_unread(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<ReadStateResponse>, ApiError> {
    let personal = UserNotificationRepository::new(state.pool.clone());
    if let Some(row) = personal.find_by_id(notification_id).await? {
        ensure_recipient(&row, user_auth.user_id)?;

        let updated: UserNotification = personal
            .mark_unread(notification_id, user_auth.user_id)
            .await?
            .map(Into::into)
            .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))?;

        state
            .realtime
            .publish_change(ChangeEvent::update(tables::USER_NOTIFICATIONS, &updated));

        return Ok(Json(ReadStateResponse {
            id: updated.id,
            read_at: None,
        }));
    }

    let global = NotificationRepository::new(state.pool.clone());
    if global.find_by_id(notification_id).await?.is_none() {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }

    if global.mark_unread(user_auth.user_id, notification_id).await? {
        state.realtime.publish_change(ChangeEvent::delete(
            tables::NOTIFICATION_READS,
            &json!({
                "user_id": user_auth.user_id,
                "notification_id": notification_id,
            }),
        ));
    }

    Ok(Json(ReadStateResponse {
        id: notification_id,
        read_at: None,
    }))
}

fn ensure_recipient(row: &UserNotificationEntity, user_id: Uuid) -> Result<(), ApiError> {
    if row.user_id == user_id {
        Ok(())
    } else {
        Err(ApiError::Forbidden(
            "This notification belongs to someone else".to_string(),
        ))
    }
}
