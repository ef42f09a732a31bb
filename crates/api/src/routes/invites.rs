//! Invite routes for the invitee.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use domain::models::invite::{
    InviteDecision, ListInvitesResponse, RespondInviteRequest, RespondInviteResponse,
};
use domain::models::realtime::{tables, ChangeEvent};
use domain::models::team::{MembershipStatus, MAX_TEAM_SIZE};
use domain::models::TeamInvite;
use domain::services::team_rules::{check_invite_response, Responder};
use domain::services::TeamError;
use persistence::repositories::{
    AcceptOutcome, InviteRepository, ProfileRepository, RegistrationRepository, TeamRepository,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::UserAuth;

/// List open invites addressed to the caller.
///
/// GET /api/v1/invites
pub async fn list_my_invites(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<Json<ListInvitesResponse>, ApiError> {
    let profile = ProfileRepository::new(state.pool.clone())
        .find_by_user_id(user_auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    let data = InviteRepository::new(state.pool.clone())
        .list_received(&profile.email)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(ListInvitesResponse { data }))
}

/// Accept or decline an invite.
///
/// POST /api/v1/invites/:invite_id/respond
///
/// Only the invitee may answer, and only while checked in. Accepting also
/// adds the caller as an accepted member, provided the team still has room.
pub async fn respond_to_invite(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(invite_id): Path<Uuid>,
    Json(request): Json<RespondInviteRequest>,
) -> Result<Json<RespondInviteResponse>, ApiError> {
    let profile = ProfileRepository::new(state.pool.clone())
        .find_by_user_id(user_auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Profile not found".to_string()))?;

    let invites = InviteRepository::new(state.pool.clone());
    let invite: TeamInvite = invites
        .find_by_id(invite_id)
        .await?
        .map(Into::into)
        .ok_or_else(|| ApiError::NotFound("Invite not found".to_string()))?;

    let registration = RegistrationRepository::new(state.pool.clone())
        .find_by_user_id(user_auth.user_id)
        .await?;
    let teams = TeamRepository::new(state.pool.clone());

    let responder = Responder {
        email: &profile.email,
        checked_in: registration.is_some_and(|r| r.checked_in),
        has_accepted_membership: teams.has_accepted_membership(user_auth.user_id).await?,
    };
    let accepted_count = match request.status {
        InviteDecision::Accepted => teams.count_accepted(invite.team_id).await?,
        InviteDecision::Declined => 0,
    };
    check_invite_response(&invite, &responder, request.status, accepted_count, Utc::now())?;

    let updated: TeamInvite = match request.status {
        InviteDecision::Declined => invites
            .decline(invite.id)
            .await?
            .ok_or(TeamError::InviteNotPending)?
            .into(),
        InviteDecision::Accepted => {
            match invites
                .accept(invite.id, invite.team_id, user_auth.user_id, MAX_TEAM_SIZE)
                .await?
            {
                AcceptOutcome::Accepted(row) => row.into(),
                AcceptOutcome::TeamFull { .. } => return Err(TeamError::TeamFull.into()),
                AcceptOutcome::AlreadyOnTeam => return Err(TeamError::CallerAlreadyOnTeam.into()),
                AcceptOutcome::NotPending => return Err(TeamError::InviteNotPending.into()),
            }
        }
    };

    info!(
        invite_id = %updated.id,
        team_id = %updated.team_id,
        user_id = %user_auth.user_id,
        status = updated.status.as_str(),
        "Invite answered"
    );

    state
        .realtime
        .publish_change(ChangeEvent::update(tables::TEAM_INVITES, &updated));
    if updated.status == MembershipStatus::Accepted {
        state.realtime.publish_change(ChangeEvent::insert(
            tables::TEAM_MEMBERS,
            &json!({
                "team_id": updated.team_id,
                "user_id": user_auth.user_id,
                "status": MembershipStatus::Accepted,
            }),
        ));
    }

    Ok(Json(RespondInviteResponse {
        invite_id: updated.id,
        team_id: updated.team_id,
        status: updated.status,
    }))
}
