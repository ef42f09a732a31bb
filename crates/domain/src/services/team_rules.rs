//! Team and invite state machine rules.
//!
//! Per (team, candidate) pair the lifecycle is
//! `no relationship -> invited (pending) -> accepted | declined`.
//! The functions here are pure checks; callers gather the facts from storage
//! and apply the mutation only when the check passes.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::invite::{InviteDecision, TeamInvite};
use crate::models::registration::Registration;
use crate::models::team::{Team, MAX_TEAM_SIZE};

/// Team and invite rule violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TeamError {
    #[error("No user found with email {0}")]
    UserNotFound(String),

    #[error("{0} has not registered for the event")]
    NotRegistered(String),

    #[error("{0} has not checked in yet")]
    NotCheckedIn(String),

    #[error("{0} is already on a team")]
    AlreadyOnTeam(String),

    #[error("{0} already has a pending invite to this team")]
    AlreadyInvited(String),

    #[error("Team is full (maximum 4 members including pending invites)")]
    TeamFull,

    #[error("Team name must be 15 characters or fewer")]
    NameTooLong,

    #[error("Team name cannot be empty")]
    NameEmpty,

    #[error("Only the team leader can do this")]
    NotLeader,

    #[error("Team is already finalized")]
    AlreadyFinalized,

    #[error("A room must be selected")]
    RoomRequired,

    #[error("Invite has already been answered")]
    InviteNotPending,

    #[error("Invite has expired")]
    InviteExpired,

    #[error("This invite is addressed to someone else")]
    NotInvitee,

    #[error("You must be registered and checked in")]
    CallerNotCheckedIn,

    #[error("You are already on a team")]
    CallerAlreadyOnTeam,
}

impl TeamError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            TeamError::UserNotFound(_) => "user_not_found",
            TeamError::NotRegistered(_) => "not_registered",
            TeamError::NotCheckedIn(_) => "not_checked_in",
            TeamError::AlreadyOnTeam(_) => "already_on_team",
            TeamError::AlreadyInvited(_) => "already_invited",
            TeamError::TeamFull => "team_full",
            TeamError::NameTooLong => "name_too_long",
            TeamError::NameEmpty => "name_empty",
            TeamError::NotLeader => "not_leader",
            TeamError::AlreadyFinalized => "already_finalized",
            TeamError::RoomRequired => "room_required",
            TeamError::InviteNotPending => "invite_not_pending",
            TeamError::InviteExpired => "invite_expired",
            TeamError::NotInvitee => "not_invitee",
            TeamError::CallerNotCheckedIn => "caller_not_checked_in",
            TeamError::CallerAlreadyOnTeam => "caller_already_on_team",
        }
    }

    /// Email named by the error, for per-candidate failures.
    pub fn email(&self) -> Option<&str> {
        match self {
            TeamError::UserNotFound(e)
            | TeamError::NotRegistered(e)
            | TeamError::NotCheckedIn(e)
            | TeamError::AlreadyOnTeam(e)
            | TeamError::AlreadyInvited(e) => Some(e),
            _ => None,
        }
    }
}

/// Normalizes and checks a team name.
pub fn check_team_name(name: &str) -> Result<String, TeamError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TeamError::NameEmpty);
    }
    if trimmed.chars().count() > shared::validation::MAX_TEAM_NAME_CHARS {
        return Err(TeamError::NameTooLong);
    }
    Ok(trimmed.to_string())
}

/// The caller must be checked in and not already on a team.
pub fn check_can_create_team(
    registration: Option<&Registration>,
    has_accepted_membership: bool,
) -> Result<(), TeamError> {
    match registration {
        Some(r) if r.checked_in => {}
        _ => return Err(TeamError::CallerNotCheckedIn),
    }
    if has_accepted_membership {
        return Err(TeamError::CallerAlreadyOnTeam);
    }
    Ok(())
}

pub fn check_leader(team: &Team, user_id: Uuid) -> Result<(), TeamError> {
    if team.is_led_by(user_id) {
        Ok(())
    } else {
        Err(TeamError::NotLeader)
    }
}

pub fn check_not_finalized(team: &Team) -> Result<(), TeamError> {
    if team.is_finalized {
        Err(TeamError::AlreadyFinalized)
    } else {
        Ok(())
    }
}

/// Current occupancy of a team's member slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamSlots {
    /// Accepted member rows, leader included.
    pub accepted: i64,
    /// Pending, unexpired invites.
    pub pending: i64,
}

impl TeamSlots {
    /// One more pending invite still fits.
    pub fn can_invite(&self) -> bool {
        self.accepted + self.pending < MAX_TEAM_SIZE
    }

    /// One more accepted member still fits.
    pub fn can_accept(&self) -> bool {
        self.accepted < MAX_TEAM_SIZE
    }
}

/// What storage knows about an invite candidate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateFacts {
    pub profile_user_id: Option<Uuid>,
    /// `Some(checked_in)` when a registration exists.
    pub registration_checked_in: Option<bool>,
    pub has_accepted_membership: bool,
    pub has_pending_invite: bool,
}

/// Runs the per-candidate invite checks in order.
pub fn check_invite_candidate(
    email: &str,
    facts: &CandidateFacts,
    slots: &TeamSlots,
) -> Result<Uuid, TeamError> {
    let user_id = facts
        .profile_user_id
        .ok_or_else(|| TeamError::UserNotFound(email.to_string()))?;

    match facts.registration_checked_in {
        None => return Err(TeamError::NotRegistered(email.to_string())),
        Some(false) => return Err(TeamError::NotCheckedIn(email.to_string())),
        Some(true) => {}
    }

    if facts.has_accepted_membership {
        return Err(TeamError::AlreadyOnTeam(email.to_string()));
    }
    if facts.has_pending_invite {
        return Err(TeamError::AlreadyInvited(email.to_string()));
    }
    if !slots.can_invite() {
        return Err(TeamError::TeamFull);
    }

    Ok(user_id)
}

/// What storage knows about the caller answering an invite.
#[derive(Debug, Clone)]
pub struct Responder<'a> {
    pub email: &'a str,
    pub checked_in: bool,
    pub has_accepted_membership: bool,
}

/// Checks that the caller may answer `invite` with `decision`.
///
/// `accepted_count` is the team's current accepted member count and only
/// matters when accepting.
pub fn check_invite_response(
    invite: &TeamInvite,
    responder: &Responder<'_>,
    decision: InviteDecision,
    accepted_count: i64,
    now: DateTime<Utc>,
) -> Result<(), TeamError> {
    if !invite.invitee_email.eq_ignore_ascii_case(responder.email.trim()) {
        return Err(TeamError::NotInvitee);
    }
    if !responder.checked_in {
        return Err(TeamError::CallerNotCheckedIn);
    }
    if invite.status.is_terminal() {
        return Err(TeamError::InviteNotPending);
    }
    if invite.is_expired(now) {
        return Err(TeamError::InviteExpired);
    }

    if decision == InviteDecision::Accepted {
        if responder.has_accepted_membership {
            return Err(TeamError::CallerAlreadyOnTeam);
        }
        let slots = TeamSlots {
            accepted: accepted_count,
            pending: 0,
        };
        if !slots.can_accept() {
            return Err(TeamError::TeamFull);
        }
    }

    Ok(())
}
