//! Registration domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A participant's registration. One per user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Registration {
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

/// Participant-editable registration fields.
///
/// Used for both create and update; the email always comes from the caller's
/// profile, never from the request body.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct RegistrationForm {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Full name must be between 1 and 100 characters"
    ))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub full_name: String,

    #[validate(length(max = 30, message = "Phone must be at most 30 characters"))]
    pub phone: Option<String>,

    #[validate(length(max = 200, message = "School name must be at most 200 characters"))]
    pub school_name: Option<String>,

    #[validate(length(max = 20, message = "Grade must be at most 20 characters"))]
    pub grade: Option<String>,

    #[validate(length(max = 10, message = "T-shirt size must be at most 10 characters"))]
    pub t_shirt_size: Option<String>,

    #[validate(length(
        max = 500,
        message = "Dietary restrictions must be at most 500 characters"
    ))]
    pub dietary_restrictions: Option<String>,

    #[validate(length(max = 39, message = "GitHub username must be at most 39 characters"))]
    pub github_username: Option<String>,

    #[validate(length(
        max = 100,
        message = "Emergency contact name must be at most 100 characters"
    ))]
    pub emergency_contact_name: Option<String>,

    #[validate(length(
        max = 30,
        message = "Emergency contact phone must be at most 30 characters"
    ))]
    pub emergency_contact_phone: Option<String>,

    #[validate(range(min = 0, max = 100, message = "Hackathons attended must be 0-100"))]
    pub hackathons_attended: Option<i32>,
}

/// Admin request to set a registration's check-in flag.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SetCheckInRequest {
    pub checked_in: bool,
}

/// Caller's own check-in status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CheckInStatusResponse {
    pub registered: bool,
    pub checked_in: bool,
}

impl CheckInStatusResponse {
    pub fn from_registration(registration: Option<&Registration>) -> Self {
        Self {
            registered: registration.is_some(),
            checked_in: registration.map(|r| r.checked_in).unwrap_or(false),
        }
    }
}

/// Whether new registrations and edits are accepted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RegistrationStatusResponse {
    pub open: bool,
}

/// Response for admin registration listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListRegistrationsResponse {
    pub data: Vec<Registration>,
    pub total: usize,
    pub checked_in: usize,
}

impl ListRegistrationsResponse {
    pub fn new(data: Vec<Registration>) -> Self {
        let checked_in = data.iter().filter(|r| r.checked_in).count();
        Self {
            total: data.len(),
            checked_in,
            data,
        }
    }
}
