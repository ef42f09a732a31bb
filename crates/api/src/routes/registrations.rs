//! Participant registration routes.

use axum::{extract::State, http::StatusCode, Json};
use domain::models::realtime::{tables, ChangeEvent};
use domain::models::registration::{
    CheckInStatusResponse, RegistrationForm, RegistrationStatusResponse,
};
use domain::models::Registration;
use persistence::repositories::{ProfileRepository, RegistrationRepository, SystemConfigRepository};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::UserAuth;

/// Whether registration is open.
///
/// GET /api/v1/registration/status
///
/// Public. A missing flag or read failure counts as open.
pub async fn registration_status(
    State(state): State<AppState>,
) -> Json<RegistrationStatusResponse> {
    let open = SystemConfigRepository::new(state.pool.clone())
        .is_registration_open()
        .await;
    Json(RegistrationStatusResponse { open })
}

/// Get the caller's registration.
///
/// GET /api/v1/registration
pub async fn get_my_registration(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<Json<Registration>, ApiError> {
    let registration = RegistrationRepository::new(state.pool.clone())
        .find_by_user_id(user_auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Registration not found".to_string()))?;

    Ok(Json(registration.into()))
}

/// Register for the event.
///
/// POST /api/v1/registration
///
/// The email is taken from the caller's profile. One registration per user.
pub async fn create_registration(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(form): Json<RegistrationForm>,
) -> Result<(StatusCode, Json<Registration>), ApiError> {
    form.validate()?;
    ensure_registration_open(&state).await?;

    let profile = ProfileRepository::new(state.pool.clone())
        .find_by_user_id(user_auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    let repo = RegistrationRepository::new(state.pool.clone());
    if repo.find_by_user_id(user_auth.user_id).await?.is_some() {
        return Err(ApiError::Conflict("You have already registered".to_string()));
    }

    let registration: Registration = repo
        .create(user_auth.user_id, &profile.email, &form)
        .await?
        .into();

    info!(
        registration_id = %registration.id,
        user_id = %user_auth.user_id,
        "Registration created"
    );

    state
        .realtime
        .publish_change(ChangeEvent::insert(tables::REGISTRATIONS, &registration));

    Ok((StatusCode::CREATED, Json(registration)))
}

/// Edit the caller's registration.
///
/// PUT /api/v1/registration
///
/// The check-in flag is admin-owned and never changes here.
pub async fn update_registration(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(form): Json<RegistrationForm>,
) -> Result<Json<Registration>, ApiError> {
    form.validate()?;
    ensure_registration_open(&state).await?;

    let registration: Registration = RegistrationRepository::new(state.pool.clone())
        .update(user_auth.user_id, &form)
        .await?
        .ok_or_else(|| ApiError::NotFound("Registration not found".to_string()))?
        .into();

    info!(
        registration_id = %registration.id,
        user_id = %user_auth.user_id,
        "Registration updated"
    );

    state
        .realtime
        .publish_change(ChangeEvent::update(tables::REGISTRATIONS, &registration));

    Ok(Json(registration))
}

/// The caller's check-in status.
///
/// GET /api/v1/registration/check-in
pub async fn check_in_status(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<Json<CheckInStatusResponse>, ApiError> {
    let registration: Option<Registration> = RegistrationRepository::new(state.pool.clone())
        .find_by_user_id(user_auth.user_id)
        .await?
        .map(Into::into);

    Ok(Json(CheckInStatusResponse::from_registration(
        registration.as_ref(),
    )))
}

async fn ensure_registration_open(state: &AppState) -> Result<(), ApiError> {
    let open = SystemConfigRepository::new(state.pool.clone())
        .is_registration_open()
        .await;
    if open {
        Ok(())
    } else {
        Err(ApiError::RegistrationClosed)
    }
}
