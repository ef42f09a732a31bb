//! Team domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use super::invite::InviteSummary;
use super::profile::ProfileSummary;

/// Maximum number of accepted members in a team, leader included.
pub const MAX_TEAM_SIZE: i64 = 4;

/// Room value of a team that has never been placed.
pub const ROOM_TBD: &str = "TBD";

/// Status of a membership or an invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Pending,
    Accepted,
    Declined,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Pending => "pending",
            MembershipStatus::Accepted => "accepted",
            MembershipStatus::Declined => "declined",
        }
    }

    /// Returns true once the invitee has answered.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, MembershipStatus::Pending)
    }
}

impl FromStr for MembershipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(MembershipStatus::Pending),
            "accepted" => Ok(MembershipStatus::Accepted),
            "declined" => Ok(MembershipStatus::Declined),
            _ => Err(format!("Invalid membership status: {}", s)),
        }
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A hackathon team.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub leader_id: Uuid,
    /// `TBD`, a catalog room id, or empty when an admin unassigned it.
    pub room: String,
    pub is_finalized: bool,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Team {
    pub fn is_led_by(&self, user_id: Uuid) -> bool {
        self.leader_id == user_id
    }
}

/// A user's membership row in a team.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TeamMember {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub status: MembershipStatus,
    pub joined_at: DateTime<Utc>,
}

/// Member info with profile details.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TeamMemberView {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub status: MembershipStatus,
    pub is_leader: bool,
    pub joined_at: DateTime<Utc>,
}

/// Request payload for creating a team.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CreateTeamRequest {
    /// Trimmed, 1 to 15 characters.
    pub name: String,
}

/// Request payload for finalizing a team.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FinalizeTeamRequest {
    /// Ignored for solo teams.
    pub room: Option<String>,
}

/// Admin request to set the placement acknowledgement flag.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SetConfirmedRequest {
    pub confirmed: bool,
}

/// Admin request to move a team on the room board.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct MoveTeamRoomRequest {
    #[validate(length(min = 1, max = 50, message = "Room must be between 1 and 50 characters"))]
    pub room: String,
}

/// The caller's team with members and outstanding invites.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MyTeamResponse {
    pub team: Team,
    pub members: Vec<TeamMemberView>,
    pub pending_invites: Vec<InviteSummary>,
    pub accepted_count: i64,
    pub is_leader: bool,
}

/// Team entry in the admin listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AdminTeamView {
    pub team: Team,
    pub leader: Option<ProfileSummary>,
    pub members: Vec<TeamMemberView>,
    pub accepted_count: i64,
}

/// Response for the admin team listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListTeamsResponse {
    pub data: Vec<AdminTeamView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_status_round_trip_str() {
        for status in [
            MembershipStatus::Pending,
            MembershipStatus::Accepted,
            MembershipStatus::Declined,
        ] {
            assert_eq!(status.as_str().parse::<MembershipStatus>().unwrap(), status);
        }
        assert!("maybe".parse::<MembershipStatus>().is_err());
        assert_eq!("ACCEPTED".parse::<MembershipStatus>().unwrap(), MembershipStatus::Accepted);
    }

    #[test]
    fn test_membership_status_terminal() {
        assert!(!MembershipStatus::Pending.is_terminal());
        assert!(MembershipStatus::Accepted.is_terminal());
        assert!(MembershipStatus::Declined.is_terminal());
    }

    #[test]
    fn test_membership_status_serde() {
        let json = serde_json::to_string(&MembershipStatus::Declined).unwrap();
        assert_eq!(json, "\"declined\"");
        let parsed: MembershipStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(parsed, MembershipStatus::Pending);
    }

    #[test]
    fn test_create_team_request_validation() {
        let ok = CreateTeamRequest {
            name: "Null Pointers".to_string(),
        };
        assert!(ok.validate().is_ok());

        let too_long = CreateTeamRequest {
            name: "The Segfault Society".to_string(),
        };
        assert!(too_long.validate().is_err());

        let blank = CreateTeamRequest {
            name: "  ".to_string(),
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn test_is_led_by() {
        let leader = Uuid::new_v4();
        let team = Team {
            id: Uuid::new_v4(),
            name: "Foo".to_string(),
            leader_id: leader,
            room: ROOM_TBD.to_string(),
            is_finalized: false,
            confirmed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(team.is_led_by(leader));
        assert!(!team.is_led_by(Uuid::new_v4()));
    }
}
