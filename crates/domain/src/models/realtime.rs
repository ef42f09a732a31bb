//! Realtime change events and their row visibility.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Table names carried in change events.
pub mod tables {
    pub const REGISTRATIONS: &str = "registrations";
    pub const TEAMS: &str = "teams";
    pub const TEAM_MEMBERS: &str = "team_members";
    pub const TEAM_INVITES: &str = "team_invites";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const USER_NOTIFICATIONS: &str = "user_notifications";
    pub const NOTIFICATION_READS: &str = "notification_reads";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeEventType {
    Insert,
    Update,
    Delete,
}

/// A row change emitted after a successful mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ChangeEvent {
    pub table: String,
    pub event_type: ChangeEventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
}

impl ChangeEvent {
    pub fn insert<T: Serialize>(table: &str, row: &T) -> Self {
        Self {
            table: table.to_string(),
            event_type: ChangeEventType::Insert,
            new: serde_json::to_value(row).ok(),
            old: None,
        }
    }

    pub fn update<T: Serialize>(table: &str, row: &T) -> Self {
        Self {
            table: table.to_string(),
            event_type: ChangeEventType::Update,
            new: serde_json::to_value(row).ok(),
            old: None,
        }
    }

    pub fn delete<T: Serialize>(table: &str, row: &T) -> Self {
        Self {
            table: table.to_string(),
            event_type: ChangeEventType::Delete,
            new: None,
            old: serde_json::to_value(row).ok(),
        }
    }

    /// The row the event is about: `new` for inserts and updates, `old` for
    /// deletes.
    pub fn row(&self) -> Option<&Value> {
        self.new.as_ref().or(self.old.as_ref())
    }

    fn row_field(&self, field: &str) -> Option<&str> {
        self.row().and_then(|r| r.get(field)).and_then(Value::as_str)
    }
}

/// The connected user a change event is filtered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub is_admin: bool,
}

impl Viewer {
    /// Row-level visibility of a change event.
    ///
    /// Admins see everything. Personal tables are visible only to the row's
    /// `user_id`; invites to their invitee and inviter. Other tables are
    /// visible to every authenticated user.
    pub fn can_see(&self, event: &ChangeEvent) -> bool {
        if self.is_admin {
            return true;
        }

        let user_id = self.user_id.to_string();
        match event.table.as_str() {
            tables::USER_NOTIFICATIONS | tables::NOTIFICATION_READS | tables::REGISTRATIONS => {
                event.row_field("user_id") == Some(user_id.as_str())
            }
            tables::TEAM_INVITES => {
                let is_inviter = event.row_field("inviter_id") == Some(user_id.as_str());
                let is_invitee = match (&self.email, event.row_field("invitee_email")) {
                    (Some(mine), Some(theirs)) => mine.eq_ignore_ascii_case(theirs),
                    _ => false,
                };
                is_inviter || is_invitee
            }
            _ => true,
        }
    }
}
