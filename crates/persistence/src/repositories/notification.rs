//! Global notification repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{GlobalFeedEntity, NotificationEntity};
use crate::metrics::QueryTimer;

const NOTIFICATION_COLUMNS: &str =
    "id, title, message, created_at, is_active, created_by, is_replay, original_notification_id";

/// Repository for global notification database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Creates a new NotificationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create a global notification.
    pub async fn create(
        &self,
        title: &str,
        message: &str,
        is_active: bool,
        created_by: Uuid,
    ) -> Result<NotificationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_notification");
        let result = sqlx::query_as::<_, NotificationEntity>(&format!(
            r#"
            INSERT INTO notifications (title, message, is_active, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(title)
        .bind(message)
        .bind(is_active)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a notification by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<NotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_notification_by_id");
        let result = sqlx::query_as::<_, NotificationEntity>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// All notifications for the admin list, newest first.
    pub async fn list_all(&self) -> Result<Vec<NotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_notifications");
        let result = sqlx::query_as::<_, NotificationEntity>(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Active, non-replay notifications with the user's read state.
    pub async fn list_feed_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<GlobalFeedEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_notification_feed");
        let result = sqlx::query_as::<_, GlobalFeedEntity>(
            r#"
            SELECT
                n.id, n.title, n.message, n.created_at, n.is_active, n.created_by,
                n.is_replay, n.original_notification_id,
                r.read_at
            FROM notifications n
            LEFT JOIN notification_reads r
                ON r.notification_id = n.id AND r.user_id = $1
            WHERE n.is_active = true AND n.is_replay = false
            ORDER BY n.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Update title, message and/or active flag. Absent fields are kept.
    pub async fn update(
        &self,
        id: Uuid,
        title: Option<&str>,
        message: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<Option<NotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_notification");
        let result = sqlx::query_as::<_, NotificationEntity>(&format!(
            r#"
            UPDATE notifications
            SET title = COALESCE($2, title),
                message = COALESCE($3, message),
                is_active = COALESCE($4, is_active)
            WHERE id = $1
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(title)
        .bind(message)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Flip the active flag.
    pub async fn toggle_active(&self, id: Uuid) -> Result<Option<NotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("toggle_notification");
        let result = sqlx::query_as::<_, NotificationEntity>(&format!(
            r#"
            UPDATE notifications
            SET is_active = NOT is_active
            WHERE id = $1
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete a notification. Read markers go with it.
    pub async fn delete(&self, id: Uuid) -> Result<Option<NotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("delete_notification");
        let result = sqlx::query_as::<_, NotificationEntity>(&format!(
            "DELETE FROM notifications WHERE id = $1 RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Record that the user read a notification. Keeps the first timestamp.
    pub async fn mark_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<DateTime<Utc>, sqlx::Error> {
        let timer = QueryTimer::new("mark_notification_read");
        let result = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            WITH inserted AS (
                INSERT INTO notification_reads (user_id, notification_id)
                VALUES ($1, $2)
                ON CONFLICT (user_id, notification_id) DO NOTHING
                RETURNING read_at
            )
            SELECT read_at FROM inserted
            UNION ALL
            SELECT read_at FROM notification_reads
            WHERE user_id = $1 AND notification_id = $2
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(notification_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Clear the user's read marker. Returns whether one existed.
    pub async fn mark_unread(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("mark_notification_unread");
        let result = sqlx::query(
            "DELETE FROM notification_reads WHERE user_id = $1 AND notification_id = $2",
        )
        .bind(user_id)
        .bind(notification_id)
        .execute(&self.pool)
        .await;
        timer.record();
        result.map(|r| r.rows_affected() > 0)
    }
}
