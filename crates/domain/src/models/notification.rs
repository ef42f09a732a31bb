//! Notification domain models.
//!
//! Global notifications and per-user team notifications live in separate
//! tables but share one scope-tagged view, one read-state shape and one replay
//! payload.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Broadcast channel for replaying global notifications.
pub const GLOBAL_REPLAY_CHANNEL: &str = "notification-replay";
/// Event name on [`GLOBAL_REPLAY_CHANNEL`].
pub const GLOBAL_REPLAY_EVENT: &str = "replay-notification";
/// Broadcast channel for replaying team notifications.
pub const TEAM_REPLAY_CHANNEL: &str = "team-notification-replay";
/// Event name on [`TEAM_REPLAY_CHANNEL`].
pub const TEAM_REPLAY_EVENT: &str = "replay-team-notification";

/// How long a replay popup stays up unless dismissed.
pub const REPLAY_DISPLAY_SECS: u32 = 10;

/// Who a notification is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationScope {
    Global,
    PerUser {
        user_id: Uuid,
        team_id: Option<Uuid>,
    },
}

impl NotificationScope {
    /// Returns true if `user_id` should see notifications of this scope.
    pub fn addresses(&self, user_id: Uuid) -> bool {
        match self {
            NotificationScope::Global => true,
            NotificationScope::PerUser { user_id: target, .. } => *target == user_id,
        }
    }
}

/// A global notification row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    /// Legacy persisted replays. Never written, hidden from feeds.
    pub is_replay: bool,
    pub original_notification_id: Option<Uuid>,
}

impl Notification {
    /// Shown in participant feeds.
    pub fn is_listed(&self) -> bool {
        self.is_active && !self.is_replay
    }

    pub fn view(&self, read_at: Option<DateTime<Utc>>) -> NotificationView {
        NotificationView {
            id: self.id,
            scope: NotificationScope::Global,
            title: self.title.clone(),
            message: self.message.clone(),
            created_at: self.created_at,
            is_active: self.is_active,
            read_at,
        }
    }
}

/// A per-user team notification row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UserNotification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_by: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub read_at: Option<DateTime<Utc>>,
}

impl UserNotification {
    pub fn scope(&self) -> NotificationScope {
        NotificationScope::PerUser {
            user_id: self.user_id,
            team_id: self.team_id,
        }
    }

    pub fn view(&self) -> NotificationView {
        NotificationView {
            id: self.id,
            scope: self.scope(),
            title: self.title.clone(),
            message: self.message.clone(),
            created_at: self.created_at,
            is_active: self.is_active,
            read_at: self.read_at,
        }
    }
}

/// A notification as seen by one participant, whatever its scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NotificationView {
    pub id: Uuid,
    pub scope: NotificationScope,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub read_at: Option<DateTime<Utc>>,
}

impl NotificationView {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

/// Builds a participant feed: listed global notifications with their read
/// state plus active personal rows, newest first.
pub fn merge_feed(
    global: Vec<(Notification, Option<DateTime<Utc>>)>,
    personal: Vec<UserNotification>,
) -> Vec<NotificationView> {
    let mut feed: Vec<NotificationView> = global
        .into_iter()
        .filter(|(n, _)| n.is_listed())
        .map(|(n, read_at)| n.view(read_at))
        .chain(personal.into_iter().filter(|n| n.is_active).map(|n| n.view()))
        .collect();
    feed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    feed
}

/// Recipients of a team notification: the leader plus accepted members,
/// without duplicates, leader first.
pub fn team_notification_recipients<I>(leader_id: Uuid, accepted_members: I) -> Vec<Uuid>
where
    I: IntoIterator<Item = Uuid>,
{
    let mut recipients = vec![leader_id];
    for user_id in accepted_members {
        if !recipients.contains(&user_id) {
            recipients.push(user_id);
        }
    }
    recipients
}

/// Request payload for creating a global notification.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateNotificationRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub title: String,

    #[validate(length(
        min = 1,
        max = 2000,
        message = "Message must be between 1 and 2000 characters"
    ))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub message: String,

    /// Defaults to active.
    pub is_active: Option<bool>,
}

/// Request payload for editing a global notification.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateNotificationRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,

    #[validate(length(
        min = 1,
        max = 2000,
        message = "Message must be between 1 and 2000 characters"
    ))]
    pub message: Option<String>,

    pub is_active: Option<bool>,
}

/// Request payload for sending a notification to every member of a team.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SendTeamNotificationRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub title: String,

    #[validate(length(
        min = 1,
        max = 2000,
        message = "Message must be between 1 and 2000 characters"
    ))]
    #[validate(custom(function = "shared::validation::validate_not_blank"))]
    pub message: String,
}

/// Response after fanning out a team notification.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct TeamNotificationSentResponse {
    pub team_id: Uuid,
    pub created: usize,
    pub recipients: Vec<Uuid>,
}

/// Participant feed response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListNotificationsResponse {
    pub data: Vec<NotificationView>,
    pub unread: usize,
}

impl ListNotificationsResponse {
    pub fn new(data: Vec<NotificationView>) -> Self {
        let unread = data.iter().filter(|n| !n.is_read()).count();
        Self { data, unread }
    }
}

/// Read state after a mark read/unread call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ReadStateResponse {
    pub id: Uuid,
    pub read_at: Option<DateTime<Utc>>,
}

/// Admin listing of global notifications.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AdminNotificationsResponse {
    pub data: Vec<Notification>,
}

/// Admin listing of team notifications.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct AdminUserNotificationsResponse {
    pub data: Vec<UserNotification>,
}

/// Transient re-delivery of a notification. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ReplayPayload {
    pub original_id: Uuid,
    pub scope: NotificationScope,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub replayed_at: DateTime<Utc>,
    pub display_secs: u32,
}

impl ReplayPayload {
    pub fn for_global(n: &Notification, now: DateTime<Utc>) -> Self {
        Self {
            original_id: n.id,
            scope: NotificationScope::Global,
            title: n.title.clone(),
            message: n.message.clone(),
            user_id: None,
            replayed_at: now,
            display_secs: REPLAY_DISPLAY_SECS,
        }
    }

    pub fn for_user(n: &UserNotification, now: DateTime<Utc>) -> Self {
        Self {
            original_id: n.id,
            scope: n.scope(),
            title: n.title.clone(),
            message: n.message.clone(),
            user_id: Some(n.user_id),
            replayed_at: now,
            display_secs: REPLAY_DISPLAY_SECS,
        }
    }

    pub fn channel(&self) -> &'static str {
        match self.scope {
            NotificationScope::Global => GLOBAL_REPLAY_CHANNEL,
            NotificationScope::PerUser { .. } => TEAM_REPLAY_CHANNEL,
        }
    }

    pub fn event(&self) -> &'static str {
        match self.scope {
            NotificationScope::Global => GLOBAL_REPLAY_EVENT,
            NotificationScope::PerUser { .. } => TEAM_REPLAY_EVENT,
        }
    }

    /// Returns true if the popup should be shown to `user_id`.
    pub fn is_for(&self, user_id: Uuid) -> bool {
        self.scope.addresses(user_id)
    }

    /// When a popup opened at `shown_at` closes on its own.
    pub fn dismiss_at(&self, shown_at: DateTime<Utc>) -> DateTime<Utc> {
        shown_at + Duration::seconds(i64::from(self.display_secs))
    }
}

/// Response after publishing a replay.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ReplayResponse {
    pub original_id: Uuid,
    pub channel: &'static str,
    pub event: &'static str,
    /// Live subscribers at publish time.
    pub receivers: usize,
}
