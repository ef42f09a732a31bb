//! Team notification fan-out, sent by a team's leader or by an admin.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::notification::{
    team_notification_recipients, SendTeamNotificationRequest, TeamNotificationSentResponse,
};
use domain::models::realtime::{tables, ChangeEvent};
use domain::models::{Team, UserNotification};
use domain::services::team_rules::check_leader;
use persistence::repositories::{TeamRepository, UserNotificationRepository};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminAuth;
use crate::middleware::metrics::record_user_notifications_created;
use crate::middleware::UserAuth;
use crate::routes::teams::load_team;

/// Notify every member of the caller's team.
///
/// POST /api/v1/teams/:team_id/notifications
///
/// Leader only.
pub async fn leader_send(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(team_id): Path<Uuid>,
    Json(request): Json<SendTeamNotificationRequest>,
) -> Result<(StatusCode, Json<TeamNotificationSentResponse>), ApiError> {
    request.validate()?;

    let repo = TeamRepository::new(state.pool.clone());
    let team = load_team(&repo, team_id).await?;
    check_leader(&team, user_auth.user_id)?;

    let response = fan_out(&state, &repo, &team, user_auth.user_id, &request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Notify every member of a team.
///
/// POST /api/v1/admin/teams/:team_id/notifications
pub async fn admin_send(
    State(state): State<AppState>,
    admin: AdminAuth,
    Path(team_id): Path<Uuid>,
    Json(request): Json<SendTeamNotificationRequest>,
) -> Result<(StatusCode, Json<TeamNotificationSentResponse>), ApiError> {
    request.validate()?;

    let repo = TeamRepository::new(state.pool.clone());
    let team = load_team(&repo, team_id).await?;

    let response = fan_out(&state, &repo, &team, admin.user_id(), &request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Writes one row per recipient in a single insert, then announces each row.
async fn fan_out(
    state: &AppState,
    teams: &TeamRepository,
    team: &Team,
    sender_id: Uuid,
    request: &SendTeamNotificationRequest,
) -> Result<TeamNotificationSentResponse, ApiError> {
    let members = teams.accepted_member_ids(team.id).await?;
    let recipients = team_notification_recipients(team.leader_id, members);

    let created: Vec<UserNotification> = UserNotificationRepository::new(state.pool.clone())
        .create_many(
            &recipients,
            request.title.trim(),
            request.message.trim(),
            sender_id,
            Some(team.id),
        )
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    for row in &created {
        state
            .realtime
            .publish_change(ChangeEvent::insert(tables::USER_NOTIFICATIONS, row));
    }

    info!(
        team_id = %team.id,
        sender_id = %sender_id,
        created = created.len(),
        "Team notification sent"
    );
    record_user_notifications_created(created.len());

    Ok(TeamNotificationSentResponse {
        team_id: team.id,
        created: created.len(),
        recipients,
    })
}
