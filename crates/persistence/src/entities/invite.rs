//! Team invite entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::invite::ReceivedInvite;
use domain::models::TeamInvite;
use sqlx::FromRow;
use uuid::Uuid;

use super::team::MembershipStatusDb;

/// Database row mapping for the team_invites table.
#[derive(Debug, Clone, FromRow)]
pub struct TeamInviteEntity {
    pub id: Uuid,
    pub team_id: Uuid,
    pub inviter_id: Uuid,
    pub invitee_email: String,
    pub status: MembershipStatusDb,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<TeamInviteEntity> for TeamInvite {
    fn from(entity: TeamInviteEntity) -> Self {
        Self {
            id: entity.id,
            team_id: entity.team_id,
            inviter_id: entity.inviter_id,
            invitee_email: entity.invitee_email,
            status: entity.status.into(),
            created_at: entity.created_at,
            expires_at: entity.expires_at,
        }
    }
}

/// Invite joined with its team and inviter, as listed to the invitee.
#[derive(Debug, Clone, FromRow)]
pub struct ReceivedInviteEntity {
    pub id: Uuid,
    pub team_id: Uuid,
    pub team_name: String,
    pub inviter_id: Uuid,
    pub inviter_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<ReceivedInviteEntity> for ReceivedInvite {
    fn from(entity: ReceivedInviteEntity) -> Self {
        Self {
            id: entity.id,
            team_id: entity.team_id,
            team_name: entity.team_name,
            inviter_id: entity.inviter_id,
            inviter_name: entity.inviter_name,
            created_at: entity.created_at,
            expires_at: entity.expires_at,
        }
    }
}
