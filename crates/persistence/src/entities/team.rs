//! Team entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::room::BoardTeam;
use domain::models::team::{MembershipStatus, TeamMemberView};
use domain::models::{Team, TeamMember};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for membership_status that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "membership_status", rename_all = "lowercase")]
pub enum MembershipStatusDb {
    Pending,
    Accepted,
    Declined,
}

impl From<MembershipStatusDb> for MembershipStatus {
    fn from(db_status: MembershipStatusDb) -> Self {
        match db_status {
            MembershipStatusDb::Pending => MembershipStatus::Pending,
            MembershipStatusDb::Accepted => MembershipStatus::Accepted,
            MembershipStatusDb::Declined => MembershipStatus::Declined,
        }
    }
}

/// Database row mapping for the teams table.
#[derive(Debug, Clone, FromRow)]
pub struct TeamEntity {
    pub id: Uuid,
    pub name: String,
    pub leader_id: Uuid,
    pub room: String,
    pub is_finalized: bool,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TeamEntity> for Team {
    fn from(entity: TeamEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            leader_id: entity.leader_id,
            room: entity.room,
            is_finalized: entity.is_finalized,
            confirmed: entity.confirmed,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the team_members table.
#[derive(Debug, Clone, FromRow)]
pub struct TeamMemberEntity {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub status: MembershipStatusDb,
    pub joined_at: DateTime<Utc>,
}

impl From<TeamMemberEntity> for TeamMember {
    fn from(entity: TeamMemberEntity) -> Self {
        Self {
            id: entity.id,
            team_id: entity.team_id,
            user_id: entity.user_id,
            status: entity.status.into(),
            joined_at: entity.joined_at,
        }
    }
}

/// Member row joined with the member's profile and the team's leader.
#[derive(Debug, Clone, FromRow)]
pub struct TeamMemberWithProfileEntity {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub status: MembershipStatusDb,
    pub joined_at: DateTime<Utc>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub is_leader: bool,
}

impl From<TeamMemberWithProfileEntity> for TeamMemberView {
    fn from(entity: TeamMemberWithProfileEntity) -> Self {
        Self {
            user_id: entity.user_id,
            email: entity.email,
            full_name: entity.full_name,
            status: entity.status.into(),
            is_leader: entity.is_leader,
            joined_at: entity.joined_at,
        }
    }
}

/// Team card for the admin room board.
#[derive(Debug, Clone, FromRow)]
pub struct BoardTeamEntity {
    pub id: Uuid,
    pub name: String,
    pub room: String,
    pub is_finalized: bool,
    pub confirmed: bool,
    pub member_count: i64,
}

impl From<BoardTeamEntity> for BoardTeam {
    fn from(entity: BoardTeamEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            room: entity.room,
            is_finalized: entity.is_finalized,
            confirmed: entity.confirmed,
            member_count: entity.member_count,
        }
    }
}

/// Finalized team count for one room.
#[derive(Debug, Clone, FromRow)]
pub struct RoomOccupancyEntity {
    pub room: String,
    pub occupied: i64,
}
