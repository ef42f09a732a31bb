//! Team invite repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{ReceivedInviteEntity, TeamInviteEntity};
use crate::metrics::QueryTimer;

/// Outcome of an accept attempt, decided under the team row lock.
#[derive(Debug, Clone)]
pub enum AcceptOutcome {
    Accepted(TeamInviteEntity),
    /// The team already has `accepted` members and cannot take another.
    TeamFull { accepted: i64 },
    /// The caller joined a team in the meantime.
    AlreadyOnTeam,
    /// The invite was answered concurrently, or the team is gone.
    NotPending,
}

/// Repository for team invite database operations.
#[derive(Clone)]
pub struct InviteRepository {
    pool: PgPool,
}

impl InviteRepository {
    /// Creates a new InviteRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create a pending invite that expires after `expiry_hours`.
    pub async fn create(
        &self,
        team_id: Uuid,
        inviter_id: Uuid,
        invitee_email: &str,
        expiry_hours: i64,
    ) -> Result<TeamInviteEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_team_invite");
        let result = sqlx::query_as::<_, TeamInviteEntity>(
            r#"
            INSERT INTO team_invites (team_id, inviter_id, invitee_email, expires_at)
            VALUES ($1, $2, lower($3), NOW() + make_interval(hours => $4::int))
            RETURNING id, team_id, inviter_id, invitee_email, status, created_at, expires_at
            "#,
        )
        .bind(team_id)
        .bind(inviter_id)
        .bind(invitee_email)
        .bind(expiry_hours)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find invite by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<TeamInviteEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_team_invite_by_id");
        let result = sqlx::query_as::<_, TeamInviteEntity>(
            r#"
            SELECT id, team_id, inviter_id, invitee_email, status, created_at, expires_at
            FROM team_invites
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count pending, unexpired invites of a team.
    pub async fn count_open_for_team(&self, team_id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_open_team_invites");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM team_invites
            WHERE team_id = $1 AND status = 'pending' AND expires_at > NOW()
            "#,
        )
        .bind(team_id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Whether the team already has an open invite for the email.
    pub async fn has_open_invite(&self, team_id: Uuid, email: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("has_open_team_invite");
        let result = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM team_invites
                WHERE team_id = $1
                  AND lower(invitee_email) = lower($2)
                  AND status = 'pending'
                  AND expires_at > NOW()
            )
            "#,
        )
        .bind(team_id)
        .bind(email)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Open invites of a team, oldest first.
    pub async fn list_open_for_team(
        &self,
        team_id: Uuid,
    ) -> Result<Vec<TeamInviteEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_open_team_invites");
        let result = sqlx::query_as::<_, TeamInviteEntity>(
            r#"
            SELECT id, team_id, inviter_id, invitee_email, status, created_at, expires_at
            FROM team_invites
            WHERE team_id = $1 AND status = 'pending' AND expires_at > NOW()
            ORDER BY created_at ASC
            "#,
        )
        .bind(team_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Open invites addressed to an email, newest first.
    pub async fn list_received(
        &self,
        email: &str,
    ) -> Result<Vec<ReceivedInviteEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_received_team_invites");
        let result = sqlx::query_as::<_, ReceivedInviteEntity>(
            r#"
            SELECT
                i.id, i.team_id, t.name as team_name, i.inviter_id,
                COALESCE(p.full_name, p.email) as inviter_name,
                i.created_at, i.expires_at
            FROM team_invites i
            JOIN teams t ON t.id = i.team_id
            LEFT JOIN profiles p ON p.user_id = i.inviter_id
            WHERE lower(i.invitee_email) = lower($1)
              AND i.status = 'pending'
              AND i.expires_at > NOW()
            ORDER BY i.created_at DESC
            "#,
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Decline a pending invite. Returns None when it was no longer pending.
    pub async fn decline(&self, id: Uuid) -> Result<Option<TeamInviteEntity>, sqlx::Error> {
        let timer = QueryTimer::new("decline_team_invite");
        let result = sqlx::query_as::<_, TeamInviteEntity>(
            r#"
            UPDATE team_invites
            SET status = 'declined'
            WHERE id = $1 AND status = 'pending'
            RETURNING id, team_id, inviter_id, invitee_email, status, created_at, expires_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Accept an invite and add the caller as an accepted member.
    ///
    /// Locks the team row so concurrent accepts for one team cannot push it
    /// past `max_members`.
    pub async fn accept(
        &self,
        invite_id: Uuid,
        team_id: Uuid,
        user_id: Uuid,
        max_members: i64,
    ) -> Result<AcceptOutcome, sqlx::Error> {
        let timer = QueryTimer::new("accept_team_invite");
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_scalar::<_, Uuid>("SELECT id FROM teams WHERE id = $1 FOR UPDATE")
            .bind(team_id)
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            tx.rollback().await?;
            timer.record();
            return Ok(AcceptOutcome::NotPending);
        }

        let on_team = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM team_members WHERE user_id = $1 AND status = 'accepted'
            )
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        if on_team {
            tx.rollback().await?;
            timer.record();
            return Ok(AcceptOutcome::AlreadyOnTeam);
        }

        let accepted = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM team_members WHERE team_id = $1 AND status = 'accepted'",
        )
        .bind(team_id)
        .fetch_one(&mut *tx)
        .await?;
        if accepted >= max_members {
            tx.rollback().await?;
            timer.record();
            return Ok(AcceptOutcome::TeamFull { accepted });
        }

        let invite = sqlx::query_as::<_, TeamInviteEntity>(
            r#"
            UPDATE team_invites
            SET status = 'accepted'
            WHERE id = $1 AND status = 'pending' AND expires_at > NOW()
            RETURNING id, team_id, inviter_id, invitee_email, status, created_at, expires_at
            "#,
        )
        .bind(invite_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(invite) = invite else {
            tx.rollback().await?;
            timer.record();
            return Ok(AcceptOutcome::NotPending);
        };

        sqlx::query(
            r#"
            INSERT INTO team_members (team_id, user_id, status)
            VALUES ($1, $2, 'accepted')
            ON CONFLICT (team_id, user_id)
            DO UPDATE SET status = 'accepted', joined_at = NOW()
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(AcceptOutcome::Accepted(invite))
    }
}
