//! System configuration repository.

use domain::models::system_config::{registration_open_from_value, REGISTRATION_OPEN_KEY};
use sqlx::PgPool;

use crate::entities::SystemConfigEntity;
use crate::metrics::QueryTimer;

/// Repository for the system_config key-value table.
#[derive(Clone)]
pub struct SystemConfigRepository {
    pool: PgPool,
}

impl SystemConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a config row by key.
    pub async fn get(&self, key: &str) -> Result<Option<SystemConfigEntity>, sqlx::Error> {
        let timer = QueryTimer::new("get_system_config");
        let result = sqlx::query_as::<_, SystemConfigEntity>(
            r#"
            SELECT key, value, updated_at
            FROM system_config
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Whether registration is open. A missing row or a failed read counts
    /// as open.
    pub async fn is_registration_open(&self) -> bool {
        match self.get(REGISTRATION_OPEN_KEY).await {
            Ok(row) => registration_open_from_value(row.as_ref().map(|r| &r.value)),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read registration_open, defaulting to open");
                true
            }
        }
    }
}
