//! System configuration entity.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Key-value row of the system_config table.
#[derive(Debug, Clone, FromRow)]
pub struct SystemConfigEntity {
    pub key: String,
    pub value: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}
