//! Team repository for database operations.

use domain::models::room::Placement;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{
    BoardTeamEntity, RoomOccupancyEntity, TeamEntity, TeamInviteEntity, TeamMemberEntity,
    TeamMemberWithProfileEntity,
};
use crate::metrics::QueryTimer;

/// Outcome of placing a team in a room.
#[derive(Debug, Clone)]
pub enum PlacementOutcome<E> {
    Placed {
        team: TeamEntity,
        /// Where the team was put.
        placement: Placement,
        /// Accepted members at placement time, leader included.
        accepted: i64,
    },
    /// The planner turned the placement down.
    Refused(E),
    /// The room already holds `occupied` finalized teams besides this one.
    RoomFull { placement: Placement, occupied: i64 },
    /// The team is gone, or was already finalized when finalizing.
    NotApplied,
}

/// Rows removed by a team delete.
#[derive(Debug, Clone)]
pub struct DeletedTeam {
    pub team: TeamEntity,
    pub members: Vec<TeamMemberEntity>,
    pub invites: Vec<TeamInviteEntity>,
}

/// How a placement treats the finalized flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementMode {
    /// Leader finalize: sets `is_finalized`, only applies to unfinalized teams.
    Finalize,
    /// Admin board move: leaves `is_finalized` untouched.
    AdminMove,
}

/// Repository for team-related database operations.
#[derive(Clone)]
pub struct TeamRepository {
    pool: PgPool,
}

impl TeamRepository {
    /// Creates a new TeamRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create a team and add the creator as its accepted leader.
    pub async fn create_with_leader(
        &self,
        name: &str,
        leader_id: Uuid,
    ) -> Result<(TeamEntity, TeamMemberEntity), sqlx::Error> {
        let timer = QueryTimer::new("create_team");

        // Team and leader membership are created atomically
        let mut tx = self.pool.begin().await?;

        let team = sqlx::query_as::<_, TeamEntity>(
            r#"
            INSERT INTO teams (name, leader_id)
            VALUES ($1, $2)
            RETURNING id, name, leader_id, room, is_finalized, confirmed, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(leader_id)
        .fetch_one(&mut *tx)
        .await?;

        let member = sqlx::query_as::<_, TeamMemberEntity>(
            r#"
            INSERT INTO team_members (team_id, user_id, status)
            VALUES ($1, $2, 'accepted')
            RETURNING id, team_id, user_id, status, joined_at
            "#,
        )
        .bind(team.id)
        .bind(leader_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok((team, member))
    }

    /// Find a team by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<TeamEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_team_by_id");
        let result = sqlx::query_as::<_, TeamEntity>(
            r#"
            SELECT id, name, leader_id, room, is_finalized, confirmed, created_at, updated_at
            FROM teams
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find the team where the user holds an accepted membership.
    pub async fn find_team_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Option<TeamEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_team_for_user");
        let result = sqlx::query_as::<_, TeamEntity>(
            r#"
            SELECT t.id, t.name, t.leader_id, t.room, t.is_finalized, t.confirmed,
                   t.created_at, t.updated_at
            FROM teams t
            JOIN team_members tm ON tm.team_id = t.id
            WHERE tm.user_id = $1 AND tm.status = 'accepted'
            ORDER BY tm.joined_at ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Whether the user holds an accepted membership in any team.
    pub async fn has_accepted_membership(&self, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("has_accepted_membership");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM team_members WHERE user_id = $1 AND status = 'accepted'
            )
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count accepted member rows of a team, leader included.
    pub async fn count_accepted(&self, team_id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_accepted_members");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM team_members
            WHERE team_id = $1 AND status = 'accepted'
            "#,
        )
        .bind(team_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// User ids of accepted members, leader included.
    pub async fn accepted_member_ids(&self, team_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        let timer = QueryTimer::new("accepted_member_ids");
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id
            FROM team_members
            WHERE team_id = $1 AND status = 'accepted'
            ORDER BY joined_at ASC
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Members of the given teams with profile info.
    pub async fn list_members_with_profiles(
        &self,
        team_ids: &[Uuid],
    ) -> Result<Vec<TeamMemberWithProfileEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_team_members_with_profiles");
        let result = sqlx::query_as::<_, TeamMemberWithProfileEntity>(
            r#"
            SELECT
                tm.team_id, tm.user_id, tm.status, tm.joined_at,
                p.email, p.full_name,
                (t.leader_id = tm.user_id) as is_leader
            FROM team_members tm
            JOIN teams t ON t.id = tm.team_id
            LEFT JOIN profiles p ON p.user_id = tm.user_id
            WHERE tm.team_id = ANY($1)
            ORDER BY (t.leader_id = tm.user_id) DESC, tm.joined_at ASC
            "#,
        )
        .bind(team_ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List all teams, newest first.
    pub async fn list_all(&self) -> Result<Vec<TeamEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_teams");
        let result = sqlx::query_as::<_, TeamEntity>(
            r#"
            SELECT id, name, leader_id, room, is_finalized, confirmed, created_at, updated_at
            FROM teams
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Team cards for the admin room board.
    pub async fn list_board_teams(&self) -> Result<Vec<BoardTeamEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_board_teams");
        let result = sqlx::query_as::<_, BoardTeamEntity>(
            r#"
            SELECT
                t.id, t.name, t.room, t.is_finalized, t.confirmed,
                (SELECT COUNT(*) FROM team_members tm
                 WHERE tm.team_id = t.id AND tm.status = 'accepted') as member_count
            FROM teams t
            ORDER BY t.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Finalized team count per room.
    pub async fn room_occupancy(&self) -> Result<Vec<RoomOccupancyEntity>, sqlx::Error> {
        let timer = QueryTimer::new("room_occupancy");
        let result = sqlx::query_as::<_, RoomOccupancyEntity>(
            r#"
            SELECT room, COUNT(*) as occupied
            FROM teams
            WHERE is_finalized = true
            GROUP BY room
            "#,
        )
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Put a team in a room.
    ///
    /// Locks the team row, then counts accepted members and asks `plan` for
    /// the destination in the same transaction. Invite accepts lock the same
    /// row. Bounded rooms also take a transaction-scoped advisory lock before
    /// finalized occupants other than this team are counted.
    pub async fn place_in_room<F, E>(
        &self,
        team_id: Uuid,
        mode: PlacementMode,
        plan: F,
    ) -> Result<PlacementOutcome<E>, sqlx::Error>
    where
        F: FnOnce(&TeamEntity, i64) -> Result<Placement, E>,
    {
        let timer = QueryTimer::new("place_team_in_room");
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, TeamEntity>(
            r#"
            SELECT id, name, leader_id, room, is_finalized, confirmed, created_at, updated_at
            FROM teams
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(team_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            tx.rollback().await?;
            timer.record();
            return Ok(PlacementOutcome::NotApplied);
        };
        if mode == PlacementMode::Finalize && current.is_finalized {
            tx.rollback().await?;
            timer.record();
            return Ok(PlacementOutcome::NotApplied);
        }

        let accepted = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM team_members WHERE team_id = $1 AND status = 'accepted'",
        )
        .bind(team_id)
        .fetch_one(&mut *tx)
        .await?;

        let placement = match plan(&current, accepted) {
            Ok(placement) => placement,
            Err(e) => {
                tx.rollback().await?;
                timer.record();
                return Ok(PlacementOutcome::Refused(e));
            }
        };
        let room = placement.room.storage_value();

        if placement.check_capacity {
            sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
                .bind(room)
                .execute(&mut *tx)
                .await?;

            let occupied = sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COUNT(*)
                FROM teams
                WHERE room = $1 AND is_finalized = true AND id <> $2
                "#,
            )
            .bind(room)
            .bind(team_id)
            .fetch_one(&mut *tx)
            .await?;

            if occupied >= placement.room.max_teams() {
                tx.rollback().await?;
                timer.record();
                return Ok(PlacementOutcome::RoomFull {
                    placement,
                    occupied,
                });
            }
        }

        let team = sqlx::query_as::<_, TeamEntity>(
            r#"
            UPDATE teams
            SET room = $2,
                is_finalized = CASE WHEN $3 THEN true ELSE is_finalized END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, leader_id, room, is_finalized, confirmed, created_at, updated_at
            "#,
        )
        .bind(team_id)
        .bind(room)
        .bind(mode == PlacementMode::Finalize)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();

        Ok(PlacementOutcome::Placed {
            team,
            placement,
            accepted,
        })
    }

    /// Set the admin placement acknowledgement flag.
    pub async fn set_confirmed(
        &self,
        team_id: Uuid,
        confirmed: bool,
    ) -> Result<Option<TeamEntity>, sqlx::Error> {
        let timer = QueryTimer::new("set_team_confirmed");
        let result = sqlx::query_as::<_, TeamEntity>(
            r#"
            UPDATE teams
            SET confirmed = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, leader_id, room, is_finalized, confirmed, created_at, updated_at
            "#,
        )
        .bind(team_id)
        .bind(confirmed)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Delete a team with its members and invites in one transaction.
    ///
    /// Returns None, and deletes nothing, when the team does not exist.
    pub async fn delete_team(&self, team_id: Uuid) -> Result<Option<DeletedTeam>, sqlx::Error> {
        let timer = QueryTimer::new("delete_team");
        let mut tx = self.pool.begin().await?;

        let members = sqlx::query_as::<_, TeamMemberEntity>(
            r#"
            DELETE FROM team_members
            WHERE team_id = $1
            RETURNING id, team_id, user_id, status, joined_at
            "#,
        )
        .bind(team_id)
        .fetch_all(&mut *tx)
        .await?;

        let invites = sqlx::query_as::<_, TeamInviteEntity>(
            r#"
            DELETE FROM team_invites
            WHERE team_id = $1
            RETURNING id, team_id, inviter_id, invitee_email, status, created_at, expires_at
            "#,
        )
        .bind(team_id)
        .fetch_all(&mut *tx)
        .await?;

        let team = sqlx::query_as::<_, TeamEntity>(
            r#"
            DELETE FROM teams
            WHERE id = $1
            RETURNING id, name, leader_id, room, is_finalized, confirmed, created_at, updated_at
            "#,
        )
        .bind(team_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(team) = team else {
            tx.rollback().await?;
            timer.record();
            return Ok(None);
        };

        tx.commit().await?;
        timer.record();
        Ok(Some(DeletedTeam {
            team,
            members,
            invites,
        }))
    }
}
