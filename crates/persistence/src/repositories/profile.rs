//! Profile repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::ProfileEntity;
use crate::metrics::QueryTimer;

/// Read-only access to profiles written by the auth service.
#[derive(Clone)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    /// Creates a new ProfileRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a profile by the auth user id.
    pub async fn find_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<ProfileEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_profile_by_user_id");
        let result = sqlx::query_as::<_, ProfileEntity>(
            r#"
            SELECT id, user_id, email, full_name, is_admin, created_at, updated_at
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a profile by email, case-insensitively.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<ProfileEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_profile_by_email");
        let result = sqlx::query_as::<_, ProfileEntity>(
            r#"
            SELECT id, user_id, email, full_name, is_admin, created_at, updated_at
            FROM profiles
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }
}
