//! Admin team management.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::profile::ProfileSummary;
use domain::models::realtime::{tables, ChangeEvent};
use domain::models::team::{
    AdminTeamView, ListTeamsResponse, MembershipStatus, SetConfirmedRequest, TeamMemberView,
};
use domain::models::{Team, TeamInvite, TeamMember};
use persistence::repositories::{DeletedTeam, TeamRepository};
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminAuth;

/// List every team with its leader and members.
///
/// GET /api/v1/admin/teams
pub async fn list_teams(
    State(state): State<AppState>,
    _admin: AdminAuth,
) -> Result<Json<ListTeamsResponse>, ApiError> {
    let repo = TeamRepository::new(state.pool.clone());
    let teams: Vec<Team> = repo.list_all().await?.into_iter().map(Into::into).collect();

    let ids: Vec<Uuid> = teams.iter().map(|t| t.id).collect();
    let mut members_by_team: HashMap<Uuid, Vec<TeamMemberView>> = HashMap::new();
    for row in repo.list_members_with_profiles(&ids).await? {
        let team_id = row.team_id;
        members_by_team.entry(team_id).or_default().push(row.into());
    }

    let data = teams
        .into_iter()
        .map(|team| {
            let members = members_by_team.remove(&team.id).unwrap_or_default();
            admin_team_view(team, members)
        })
        .collect();

    Ok(Json(ListTeamsResponse { data }))
}

fn admin_team_view(team: Team, members: Vec<TeamMemberView>) -> AdminTeamView {
    let leader = members
        .iter()
        .find(|m| m.user_id == team.leader_id)
        .and_then(|m| {
            m.email.as_ref().map(|email| ProfileSummary {
                user_id: m.user_id,
                email: email.clone(),
                full_name: m.full_name.clone(),
            })
        });
    let accepted_count = members
        .iter()
        .filter(|m| m.status == MembershipStatus::Accepted)
        .count() as i64;

    AdminTeamView {
        team,
        leader,
        members,
        accepted_count,
    }
}

/// Delete a team with its members and invites.
///
/// DELETE /api/v1/admin/teams/:team_id
pub async fn delete_team(
    State(state): State<AppState>,
    admin: AdminAuth,
    Path(team_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = TeamRepository::new(state.pool.clone())
        .delete_team(team_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    info!(
        team_id = %deleted.team.id,
        team_name = %deleted.team.name,
        members = deleted.members.len(),
        invites = deleted.invites.len(),
        admin_id = %admin.user_id(),
        "Team deleted"
    );

    for event in delete_events(deleted) {
        state.realtime.publish_change(event);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Change events for a team delete: members, then invites, then the team.
fn delete_events(deleted: DeletedTeam) -> Vec<ChangeEvent> {
    let mut events = Vec::with_capacity(deleted.members.len() + deleted.invites.len() + 1);
    for member in deleted.members {
        let member: TeamMember = member.into();
        events.push(ChangeEvent::delete(tables::TEAM_MEMBERS, &member));
    }
    for invite in deleted.invites {
        let invite: TeamInvite = invite.into();
        events.push(ChangeEvent::delete(tables::TEAM_INVITES, &invite));
    }
    let team: Team = deleted.team.into();
    events.push(ChangeEvent::delete(tables::TEAMS, &team));
    events
}

/// Set whether the team's placement is confirmed.
///
/// PUT /api/v1/admin/teams/:team_id/confirmed
pub async fn set_confirmed(
    State(state): State<AppState>,
    admin: AdminAuth,
    Path(team_id): Path<Uuid>,
    Json(request): Json<SetConfirmedRequest>,
) -> Result<Json<Team>, ApiError> {
    let team: Team = TeamRepository::new(state.pool.clone())
        .set_confirmed(team_id, request.confirmed)
        .await?
        .map(Into::into)
        .ok_or_else(|| ApiError::NotFound("Team not found".to_string()))?;

    info!(
        team_id = %team.id,
        confirmed = team.confirmed,
        admin_id = %admin.user_id(),
        "Team confirmation updated"
    );

    state
        .realtime
        .publish_change(ChangeEvent::update(tables::TEAMS, &team));

    Ok(Json(team))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn team(leader_id: Uuid) -> Team {
        Team {
            id: Uuid::new_v4(),
            name: "Byte Me".into(),
            leader_id,
            room: "TBD".into(),
            is_finalized: false,
            confirmed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn member(user_id: Uuid, email: Option<&str>, status: MembershipStatus) -> TeamMemberView {
        TeamMemberView {
            user_id,
            email: email.map(str::to_string),
            full_name: None,
            status,
            is_leader: false,
            joined_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_team_view_picks_leader_and_counts_accepted() {
        let leader = Uuid::new_v4();
        let members = vec![
            member(leader, Some("lead@example.com"), MembershipStatus::Accepted),
            member(Uuid::new_v4(), Some("b@example.com"), MembershipStatus::Accepted),
            member(Uuid::new_v4(), None, MembershipStatus::Declined),
        ];

        let view = admin_team_view(team(leader), members);
        assert_eq!(view.accepted_count, 2);
        assert_eq!(view.leader.unwrap().email, "lead@example.com");
    }

    #[test]
    fn test_admin_team_view_without_leader_profile() {
        let leader = Uuid::new_v4();
        let view = admin_team_view(
            team(leader),
            vec![member(leader, None, MembershipStatus::Accepted)],
        );
        assert!(view.leader.is_none());
        assert_eq!(view.accepted_count, 1);
    }

    #[test]
    fn test_delete_events_cover_members_and_invites() {
        use domain::models::realtime::{ChangeEventType, Viewer};
        use persistence::entities::{
            MembershipStatusDb, TeamEntity, TeamInviteEntity, TeamMemberEntity,
        };

        let now = Utc::now();
        let leader = Uuid::new_v4();
        let team_id = Uuid::new_v4();
        let deleted = DeletedTeam {
            team: TeamEntity {
                id: team_id,
                name: "Doomed".into(),
                leader_id: leader,
                room: "TBD".into(),
                is_finalized: false,
                confirmed: false,
                created_at: now,
                updated_at: now,
            },
            members: vec![TeamMemberEntity {
                id: Uuid::new_v4(),
                team_id,
                user_id: leader,
                status: MembershipStatusDb::Accepted,
                joined_at: now,
            }],
            invites: vec![TeamInviteEntity {
                id: Uuid::new_v4(),
                team_id,
                inviter_id: leader,
                invitee_email: "grace@example.com".into(),
                status: MembershipStatusDb::Pending,
                created_at: now,
                expires_at: now,
            }],
        };

        let events = delete_events(deleted);
        let order: Vec<&str> = events.iter().map(|e| e.table.as_str()).collect();
        assert_eq!(
            order,
            vec![tables::TEAM_MEMBERS, tables::TEAM_INVITES, tables::TEAMS]
        );
        assert!(events
            .iter()
            .all(|e| e.event_type == ChangeEventType::Delete && e.old.is_some()));

        let invitee = Viewer {
            user_id: Uuid::new_v4(),
            email: Some("grace@example.com".into()),
            is_admin: false,
        };
        assert!(invitee.can_see(&events[1]));
    }
}
