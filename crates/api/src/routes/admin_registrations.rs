//! Admin registration routes.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::realtime::{tables, ChangeEvent};
use domain::models::registration::{ListRegistrationsResponse, SetCheckInRequest};
use domain::models::Registration;
use persistence::repositories::RegistrationRepository;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminAuth;

/// List every registration.
///
/// GET /api/v1/admin/registrations
pub async fn list_registrations(
    State(state): State<AppState>,
    _admin: AdminAuth,
) -> Result<Json<ListRegistrationsResponse>, ApiError> {
    let registrations: Vec<Registration> = RegistrationRepository::new(state.pool.clone())
        .list_all()
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(ListRegistrationsResponse::new(registrations)))
}

/// Set a registration's check-in flag.
///
/// PUT /api/v1/admin/registrations/:registration_id/check-in
pub async fn set_check_in(
    State(state): State<AppState>,
    admin: AdminAuth,
    Path(registration_id): Path<Uuid>,
    Json(request): Json<SetCheckInRequest>,
) -> Result<Json<Registration>, ApiError> {
    let registration: Registration = RegistrationRepository::new(state.pool.clone())
        .set_checked_in(registration_id, request.checked_in)
        .await?
        .ok_or_else(|| ApiError::NotFound("Registration not found".to_string()))?
        .into();

    info!(
        registration_id = %registration.id,
        user_id = %registration.user_id,
        checked_in = registration.checked_in,
        admin_id = %admin.user_id(),
        "Check-in updated"
    );

    state
        .realtime
        .publish_change(ChangeEvent::update(tables::REGISTRATIONS, &registration));

    Ok(Json(registration))
}
