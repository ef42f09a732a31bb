//! Team routes for participants: create, view, invite and finalize.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::invite::{InviteBatchReport, InviteSummary, SendInvitesRequest};
use domain::models::realtime::{tables, ChangeEvent};
use domain::models::room::{plan_finalize, RoomError};
use domain::models::team::{
    CreateTeamRequest, FinalizeTeamRequest, MembershipStatus, MyTeamResponse, TeamMemberView,
};
use domain::models::{Registration, Team, TeamInvite, TeamMember};
use domain::services::team_rules::{
    check_can_create_team, check_invite_candidate, check_leader, check_not_finalized,
    check_team_name, CandidateFacts, TeamSlots,
};
use domain::services::TeamError;
use persistence::repositories::{
    InviteRepository, PlacementMode, PlacementOutcome, ProfileRepository, RegistrationRepository,
    TeamRepository,
};
use shared::validation::normalize_email_list;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::metrics::{record_invites_sent, record_team_created, record_team_placed};
use crate::middleware::UserAuth;

/// Loads a team or fails with 404.
pub(crate) async fn load_team(repo: &TeamRepository, team_id: Uuid) -> Result<Team, ApiError> {
    repo.find_by_id(team_id)
        .await?
        .map(Into::into)
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))
}

/// Create a team.
///
/// POST /api/v1/teams
///
/// The caller must be checked in and not on a team; they become its leader.
pub async fn create_team(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<Team>), ApiError> {
    let name = check_team_name(&request.name)?;

    let registration: Option<Registration> = RegistrationRepository::new(state.pool.clone())
        .find_by_user_id(user_auth.user_id)
        .await?
        .map(Into::into);

    let repo = TeamRepository::new(state.pool.clone());
    let on_team = repo.has_accepted_membership(user_auth.user_id).await?;
    check_can_create_team(registration.as_ref(), on_team)?;

    let (team, leader) = repo.create_with_leader(&name, user_auth.user_id).await?;
    let team: Team = team.into();
    let leader: TeamMember = leader.into();

    info!(
        team_id = %team.id,
        team_name = %team.name,
        user_id = %user_auth.user_id,
        "Team created"
    );
    record_team_created();

    state
        .realtime
        .publish_change(ChangeEvent::insert(tables::TEAMS, &team));
    state
        .realtime
        .publish_change(ChangeEvent::insert(tables::TEAM_MEMBERS, &leader));

    Ok((StatusCode::CREATED, Json(team)))
}

/// Get the caller's team.
///
/// GET /api/v1/teams/mine
pub async fn get_my_team(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<Json<MyTeamResponse>, ApiError> {
    let repo = TeamRepository::new(state.pool.clone());
    let team: Team = repo
        .find_team_for_user(user_auth.user_id)
        .await?
        .map(Into::into)
        .ok_or_else(|| ApiError::NotFound("You are not on a team".to_string()))?;

    let members: Vec<TeamMemberView> = repo
        .list_members_with_profiles(&[team.id])
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let accepted_count = members
        .iter()
        .filter(|m| m.status == MembershipStatus::Accepted)
        .count() as i64;

    let pending_invites: Vec<InviteSummary> = InviteRepository::new(state.pool.clone())
        .list_open_for_team(team.id)
        .await?
        .into_iter()
        .map(|e| InviteSummary::from(&TeamInvite::from(e)))
        .collect();

    let is_leader = team.is_led_by(user_auth.user_id);

    Ok(Json(MyTeamResponse {
        team,
        members,
        pending_invites,
        accepted_count,
        is_leader,
    }))
}

/// Invite participants by email.
///
/// POST /api/v1/teams/:team_id/invites
///
/// Leader only, unfinalized teams only. Each email is checked on its own;
/// failures are reported per email and do not stop the batch.
pub async fn send_invites(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(team_id): Path<Uuid>,
    Json(request): Json<SendInvitesRequest>,
) -> Result<Json<InviteBatchReport>, ApiError> {
    let emails = normalize_email_list(&request.emails);
    SendInvitesRequest {
        emails: emails.clone(),
    }
    .validate()?;

    let max_batch = state.config.limits.max_invite_batch;
    if emails.len() > max_batch {
        return Err(ApiError::Validation(format!(
            "At most {} emails per request",
            max_batch
        )));
    }

    let teams = TeamRepository::new(state.pool.clone());
    let invites = InviteRepository::new(state.pool.clone());

    let team = load_team(&teams, team_id).await?;
    check_leader(&team, user_auth.user_id)?;
    check_not_finalized(&team)?;

    let mut slots = TeamSlots {
        accepted: teams.count_accepted(team.id).await?,
        pending: invites.count_open_for_team(team.id).await?,
    };
    let mut report = InviteBatchReport::new();

    for email in emails {
        let facts = candidate_facts(&state, &teams, &invites, team.id, &email).await?;

        match check_invite_candidate(&email, &facts, &slots) {
            Ok(invitee_id) => {
                let invite: TeamInvite = invites
                    .create(
                        team.id,
                        user_auth.user_id,
                        &email,
                        state.config.limits.invite_expiry_hours,
                    )
                    .await?
                    .into();
                slots.pending += 1;

                info!(
                    team_id = %team.id,
                    invite_id = %invite.id,
                    invitee_id = %invitee_id,
                    "Invite sent"
                );
                state
                    .realtime
                    .publish_change(ChangeEvent::insert(tables::TEAM_INVITES, &invite));
                report.record_success(email);
            }
            Err(err) => {
                info!(team_id = %team.id, code = err.code(), "Invite refused");
                report.record_failure(email, &err);
            }
        }
    }

    record_invites_sent(report.succeeded.len());
    Ok(Json(report))
}

async fn candidate_facts(
    state: &AppState,
    teams: &TeamRepository,
    invites: &InviteRepository,
    team_id: Uuid,
    email: &str,
) -> Result<CandidateFacts, ApiError> {
    let Some(profile) = ProfileRepository::new(state.pool.clone())
        .find_by_email(email)
        .await?
    else {
        return Ok(CandidateFacts::default());
    };

    let registration = RegistrationRepository::new(state.pool.clone())
        .find_by_user_id(profile.user_id)
        .await?;

    Ok(CandidateFacts {
        profile_user_id: Some(profile.user_id),
        registration_checked_in: registration.map(|r| r.checked_in),
        has_accepted_membership: teams.has_accepted_membership(profile.user_id).await?,
        has_pending_invite: invites.has_open_invite(team_id, email).await?,
    })
}

/// Finalize the team and claim a room.
///
/// POST /api/v1/teams/:team_id/finalize
///
/// Solo teams always land in the overflow room. Larger teams must pick a
/// catalog room with a free slot.
pub async fn finalize_team(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(team_id): Path<Uuid>,
    Json(request): Json<FinalizeTeamRequest>,
) -> Result<Json<Team>, ApiError> {
    let repo = TeamRepository::new(state.pool.clone());
    let team = load_team(&repo, team_id).await?;
    check_leader(&team, user_auth.user_id)?;
    check_not_finalized(&team)?;

    let outcome = repo
        .place_in_room(team.id, PlacementMode::Finalize, |_, accepted| {
            plan_finalize(accepted, request.room.as_deref())?
                .ok_or_else(|| ApiError::from(TeamError::RoomRequired))
        })
        .await?;

    let (team, accepted): (Team, i64) = match outcome {
        PlacementOutcome::Placed { team, accepted, .. } => (team.into(), accepted),
        PlacementOutcome::Refused(err) => return Err(err),
        PlacementOutcome::RoomFull {
            placement,
            occupied,
        } => {
            let room = placement.room.id;
            warn!(team_id = %team_id, room, occupied, "Room full on finalize");
            return Err(RoomError::RoomFull(room.to_string()).into());
        }
        PlacementOutcome::NotApplied => return Err(TeamError::AlreadyFinalized.into()),
    };

    info!(
        team_id = %team.id,
        room = %team.room,
        accepted_members = accepted,
        user_id = %user_auth.user_id,
        "Team finalized"
    );
    record_team_placed("finalize", &team.room);

    state
        .realtime
        .publish_change(ChangeEvent::update(tables::TEAMS, &team));

    Ok(Json(team))
}
