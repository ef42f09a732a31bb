//! Per-user notification repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::UserNotificationEntity;
use crate::metrics::QueryTimer;

const USER_NOTIFICATION_COLUMNS: &str =
    "id, user_id, title, message, created_at, is_active, created_by, team_id, read_at";

/// Repository for per-user notification database operations.
#[derive(Clone)]
pub struct UserNotificationRepository {
    pool: PgPool,
}

impl UserNotificationRepository {
    /// Creates a new UserNotificationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Insert one row per recipient in a single statement.
    pub async fn create_many(
        &self,
        recipients: &[Uuid],
        title: &str,
        message: &str,
        created_by: Uuid,
        team_id: Option<Uuid>,
    ) -> Result<Vec<UserNotificationEntity>, sqlx::Error> {
        if recipients.is_empty() {
            return Ok(Vec::new());
        }

        let timer = QueryTimer::new("create_user_notifications");
        let result = sqlx::query_as::<_, UserNotificationEntity>(&format!(
            r#"
            INSERT INTO user_notifications (user_id, title, message, created_by, team_id)
            SELECT r.user_id, $2, $3, $4, $5
            FROM UNNEST($1::uuid[]) AS r(user_id)
            RETURNING {USER_NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(recipients)
        .bind(title)
        .bind(message)
        .bind(created_by)
        .bind(team_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a row by ID.
    pub async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<UserNotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_notification_by_id");
        let result = sqlx::query_as::<_, UserNotificationEntity>(&format!(
            "SELECT {USER_NOTIFICATION_COLUMNS} FROM user_notifications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Active rows addressed to the user, newest first.
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<UserNotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_user_notifications_for_user");
        let result = sqlx::query_as::<_, UserNotificationEntity>(&format!(
            r#"
            SELECT {USER_NOTIFICATION_COLUMNS}
            FROM user_notifications
            WHERE user_id = $1 AND is_active = true
            ORDER BY created_at DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Every row, for admin review.
    pub async fn list_all(&self) -> Result<Vec<UserNotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_user_notifications");
        let result = sqlx::query_as::<_, UserNotificationEntity>(&format!(
            "SELECT {USER_NOTIFICATION_COLUMNS} FROM user_notifications ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete one row.
    pub async fn delete(&self, id: Uuid) -> Result<Option<UserNotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("delete_user_notification");
        let result = sqlx::query_as::<_, UserNotificationEntity>(&format!(
            "DELETE FROM user_notifications WHERE id = $1 RETURNING {USER_NOTIFICATION_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Set `read_at` once. Only the recipient's own row matches.
    pub async fn mark_read(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<UserNotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("mark_user_notification_read");
        let result = sqlx::query_as::<_, UserNotificationEntity>(&format!(
            r#"
            UPDATE user_notifications
            SET read_at = COALESCE(read_at, NOW())
            WHERE id = $1 AND user_id = $2
            RETURNING {USER_NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Clear `read_at`. Only the recipient's own row matches.
    pub async fn mark_unread(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<UserNotificationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("mark_user_notification_unread");
        let result = sqlx::query_as::<_, UserNotificationEntity>(&format!(
            r#"
            UPDATE user_notifications
            SET read_at = NULL
            WHERE id = $1 AND user_id = $2
            RETURNING {USER_NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
