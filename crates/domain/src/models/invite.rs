//! Invite domain models for team invitations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::team::MembershipStatus;
use crate::services::team_rules::TeamError;

/// An invitation for a registered participant to join a team.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TeamInvite {
    pub id: Uuid,
    pub team_id: Uuid,
    pub inviter_id: Uuid,
    pub invitee_email: String,
    pub status: MembershipStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TeamInvite {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Invite info shown to the team leader.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InviteSummary {
    pub id: Uuid,
    pub invitee_email: String,
    pub status: MembershipStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<&TeamInvite> for InviteSummary {
    fn from(i: &TeamInvite) -> Self {
        Self {
            id: i.id,
            invitee_email: i.invitee_email.clone(),
            status: i.status,
            created_at: i.created_at,
            expires_at: i.expires_at,
        }
    }
}

/// Invite info shown to the invitee.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ReceivedInvite {
    pub id: Uuid,
    pub team_id: Uuid,
    pub team_name: String,
    pub inviter_id: Uuid,
    pub inviter_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Response for listing the caller's invites.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListInvitesResponse {
    pub data: Vec<ReceivedInvite>,
}

/// Request to invite one or more participants by email.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SendInvitesRequest {
    #[validate(length(min = 1, message = "At least one email is required"))]
    pub emails: Vec<String>,
}

/// Invitee's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InviteDecision {
    Accepted,
    Declined,
}

/// Request to accept or decline an invite.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RespondInviteRequest {
    pub status: InviteDecision,
}

/// Outcome of responding to an invite.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RespondInviteResponse {
    pub invite_id: Uuid,
    pub team_id: Uuid,
    pub status: MembershipStatus,
}

/// One failed candidate in an invite batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InviteFailure {
    pub email: String,
    pub code: String,
    pub message: String,
}

/// Per-candidate outcome of an invite batch.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InviteBatchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<InviteFailure>,
    pub summary: String,
}

impl InviteBatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, email: impl Into<String>) {
        self.succeeded.push(email.into());
        self.refresh_summary();
    }

    /// Records a failure. The message always names the email, even for
    /// errors like `TeamFull` that don't carry one.
    pub fn record_failure(&mut self, email: impl Into<String>, error: &TeamError) {
        let email = email.into();
        let message = match error.email() {
            Some(_) => error.to_string(),
            None => format!("{}: {}", email, error),
        };
        self.failed.push(InviteFailure {
            email,
            code: error.code().to_string(),
            message,
        });
        self.refresh_summary();
    }

    fn refresh_summary(&mut self) {
        self.summary = format!(
            "{} succeeded, {} failed",
            self.succeeded.len(),
            self.failed.len()
        );
    }
}
