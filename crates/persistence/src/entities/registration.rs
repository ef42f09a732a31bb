//! Registration entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the registrations table.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub school_name: Option<String>,
    pub grade: Option<String>,
    pub t_shirt_size: Option<String>,
    pub dietary_restrictions: Option<String>,
    pub github_username: Option<String>,
    pub emergency_contact_name: Option<String>,
    pub emergency_contact_phone: Option<String>,
    pub hackathons_attended: Option<i32>,
    pub checked_in: bool,
    pub registered_at: DateTime<Utc>,
}

impl From<RegistrationEntity> for domain::models::Registration {
    fn from(entity: RegistrationEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            email: entity.email,
            full_name: entity.full_name,
            phone: entity.phone,
            school_name: entity.school_name,
            grade: entity.grade,
            t_shirt_size: entity.t_shirt_size,
            dietary_restrictions: entity.dietary_restrictions,
            github_username: entity.github_username,
            emergency_contact_name: entity.emergency_contact_name,
            emergency_contact_phone: entity.emergency_contact_phone,
            hackathons_attended: entity.hackathons_attended,
            checked_in: entity.checked_in,
            registered_at: entity.registered_at,
        }
    }
}
