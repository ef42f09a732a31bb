//! Notification entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::{Notification, UserNotification};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the notifications table.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationEntity {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub is_replay: bool,
    pub original_notification_id: Option<Uuid>,
}

impl From<NotificationEntity> for Notification {
    fn from(entity: NotificationEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            message: entity.message,
            created_at: entity.created_at,
            is_active: entity.is_active,
            created_by: entity.created_by,
            is_replay: entity.is_replay,
            original_notification_id: entity.original_notification_id,
        }
    }
}

/// Global notification joined with one user's read state.
#[derive(Debug, Clone, FromRow)]
pub struct GlobalFeedEntity {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub is_replay: bool,
    pub original_notification_id: Option<Uuid>,
    pub read_at: Option<DateTime<Utc>>,
}

impl GlobalFeedEntity {
    pub fn into_parts(self) -> (Notification, Option<DateTime<Utc>>) {
        let read_at = self.read_at;
        let notification = Notification {
            id: self.id,
            title: self.title,
            message: self.message,
            created_at: self.created_at,
            is_active: self.is_active,
            created_by: self.created_by,
            is_replay: self.is_replay,
            original_notification_id: self.original_notification_id,
        };
        (notification, read_at)
    }
}

/// Database row mapping for the user_notifications table.
#[derive(Debug, Clone, FromRow)]
pub struct UserNotificationEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub read_at: Option<DateTime<Utc>>,
}

impl From<UserNotificationEntity> for UserNotification {
    fn from(entity: UserNotificationEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            title: entity.title,
            message: entity.message,
            created_at: entity.created_at,
            is_active: entity.is_active,
            created_by: entity.created_by,
            team_id: entity.team_id,
            read_at: entity.read_at,
        }
    }
}
