//! Registration repository for database operations.

use domain::models::registration::RegistrationForm;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::RegistrationEntity;
use crate::metrics::QueryTimer;

const REGISTRATION_COLUMNS: &str = r#"
    id, user_id, email, full_name, phone, school_name, grade, t_shirt_size,
    dietary_restrictions, github_username, emergency_contact_name,
    emergency_contact_phone, hackathons_attended, checked_in, registered_at
"#;

/// Repository for participant registrations.
#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    /// Creates a new RegistrationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the registration of a user.
    pub async fn find_by_user_id(
        &self,
        user_id: Uuid,
    ) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_registration_by_user_id");
        let query = format!(
            "SELECT {} FROM registrations WHERE user_id = $1",
            REGISTRATION_COLUMNS
        );
        let result = sqlx::query_as::<_, RegistrationEntity>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Create a registration. Fails with a unique violation when the user
    /// already has one.
    pub async fn create(
        &self,
        user_id: Uuid,
        email: &str,
        form: &RegistrationForm,
    ) -> Result<RegistrationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_registration");
        let query = format!(
            r#"
            INSERT INTO registrations (
                user_id, email, full_name, phone, school_name, grade, t_shirt_size,
                dietary_restrictions, github_username, emergency_contact_name,
                emergency_contact_phone, hackathons_attended
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        );
        let result = sqlx::query_as::<_, RegistrationEntity>(&query)
            .bind(user_id)
            .bind(email)
            .bind(form.full_name.trim())
            .bind(&form.phone)
            .bind(&form.school_name)
            .bind(&form.grade)
            .bind(&form.t_shirt_size)
            .bind(&form.dietary_restrictions)
            .bind(&form.github_username)
            .bind(&form.emergency_contact_name)
            .bind(&form.emergency_contact_phone)
            .bind(form.hackathons_attended)
            .fetch_one(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Overwrite the participant-editable fields of a user's registration.
    pub async fn update(
        &self,
        user_id: Uuid,
        form: &RegistrationForm,
    ) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("update_registration");
        let query = format!(
            r#"
            UPDATE registrations
            SET full_name = $2, phone = $3, school_name = $4, grade = $5, t_shirt_size = $6,
                dietary_restrictions = $7, github_username = $8, emergency_contact_name = $9,
                emergency_contact_phone = $10, hackathons_attended = $11
            WHERE user_id = $1
            RETURNING {}
            "#,
            REGISTRATION_COLUMNS
        );
        let result = sqlx::query_as::<_, RegistrationEntity>(&query)
            .bind(user_id)
            .bind(form.full_name.trim())
            .bind(&form.phone)
            .bind(&form.school_name)
            .bind(&form.grade)
            .bind(&form.t_shirt_size)
            .bind(&form.dietary_restrictions)
            .bind(&form.github_username)
            .bind(&form.emergency_contact_name)
            .bind(&form.emergency_contact_phone)
            .bind(form.hackathons_attended)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    /// List every registration, oldest first.
    pub async fn list_all(&self) -> Result<Vec<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_registrations");
        let query = format!(
            "SELECT {} FROM registrations ORDER BY registered_at ASC",
            REGISTRATION_COLUMNS
        );
        let result = sqlx::query_as::<_, RegistrationEntity>(&query)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Set the check-in flag of a registration.
    pub async fn set_checked_in(
        &self,
        id: Uuid,
        checked_in: bool,
    ) -> Result<Option<RegistrationEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_registration_checked_in");
        let query = format!(
            "UPDATE registrations SET checked_in = $2 WHERE id = $1 RETURNING {}",
            REGISTRATION_COLUMNS
        );
        let result = sqlx::query_as::<_, RegistrationEntity>(&query)
            .bind(id)
            .bind(checked_in)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }
}
