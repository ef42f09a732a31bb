//! In-process realtime fan-out.
//!
//! Route handlers publish row changes and transient broadcasts into one
//! tokio broadcast channel; every WebSocket connection holds a receiver and
//! filters what it forwards by its own subscription and row visibility.

use domain::models::notification::ReplayPayload;
use domain::models::realtime::{ChangeEvent, Viewer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Subscribes to every table.
pub const ALL_TABLES: &str = "*";

/// A transient message on a named channel. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct BroadcastEvent {
    pub channel: String,
    pub event: String,
    pub payload: Value,
    /// Only this user receives it when set.
    pub recipient: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HubEvent {
    Change(ChangeEvent),
    Broadcast(BroadcastEvent),
}

/// Messages sent by a connected client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe {
        #[serde(default)]
        tables: Vec<String>,
        #[serde(default)]
        channels: Vec<String>,
    },
    Unsubscribe {
        #[serde(default)]
        tables: Vec<String>,
        #[serde(default)]
        channels: Vec<String>,
    },
    Ping,
}

/// Messages sent to a connected client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Connected {
        user_id: Uuid,
    },
    Subscribed {
        tables: Vec<String>,
        channels: Vec<String>,
    },
    Change(ChangeEvent),
    Broadcast {
        channel: String,
        event: String,
        payload: Value,
    },
    Pong,
    /// The connection fell behind and `skipped` events were dropped.
    Lagged {
        skipped: u64,
    },
    Error {
        message: String,
    },
}

/// Shared publisher handle.
#[derive(Clone)]
pub struct RealtimeHub {
    sender: broadcast::Sender<Arc<HubEvent>>,
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<HubEvent>> {
        self.sender.subscribe()
    }

    /// Live receivers right now.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes a row change. Returns the number of receivers it reached.
    pub fn publish_change(&self, event: ChangeEvent) -> usize {
        tracing::debug!(table = %event.table, event_type = ?event.event_type, "Publishing change");
        self.publish(HubEvent::Change(event))
    }

    /// Publishes a transient broadcast.
    pub fn publish_broadcast(&self, event: BroadcastEvent) -> usize {
        tracing::debug!(channel = %event.channel, event = %event.event, "Publishing broadcast");
        self.publish(HubEvent::Broadcast(event))
    }

    /// Re-delivers a notification as a popup on its replay channel.
    pub fn publish_replay(&self, payload: &ReplayPayload) -> usize {
        let value = match serde_json::to_value(payload) {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize replay payload");
                return 0;
            }
        };

        self.publish_broadcast(BroadcastEvent {
            channel: payload.channel().to_string(),
            event: payload.event().to_string(),
            payload: value,
            recipient: payload.user_id,
        })
    }

    fn publish(&self, event: HubEvent) -> usize {
        // Err only means nobody is listening
        self.sender.send(Arc::new(event)).unwrap_or(0)
    }
}

impl std::fmt::Debug for RealtimeHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeHub")
            .field("receivers", &self.receiver_count())
            .finish()
    }
}

/// What one connection listens to.
#[derive(Debug, Clone, Default)]
pub struct Subscription {
    tables: HashSet<String>,
    channels: HashSet<String>,
}

impl Subscription {
    /// Applies a subscribe or unsubscribe message. Returns false for other
    /// messages.
    pub fn apply(&mut self, msg: &ClientMessage) -> bool {
        match msg {
            ClientMessage::Subscribe { tables, channels } => {
                self.tables.extend(tables.iter().cloned());
                self.channels.extend(channels.iter().cloned());
                true
            }
            ClientMessage::Unsubscribe { tables, channels } => {
                for t in tables {
                    self.tables.remove(t);
                }
                for c in channels {
                    self.channels.remove(c);
                }
                true
            }
            ClientMessage::Ping => false,
        }
    }

    pub fn listens_to_table(&self, table: &str) -> bool {
        self.tables.contains(ALL_TABLES) || self.tables.contains(table)
    }

    pub fn listens_to_channel(&self, channel: &str) -> bool {
        self.channels.contains(channel)
    }

    /// Sorted snapshot for the `subscribed` acknowledgement.
    pub fn snapshot(&self) -> ServerMessage {
        let mut tables: Vec<String> = self.tables.iter().cloned().collect();
        let mut channels: Vec<String> = self.channels.iter().cloned().collect();
        tables.sort();
        channels.sort();
        ServerMessage::Subscribed { tables, channels }
    }

    /// The message to forward to `viewer`, if any.
    pub fn filter(&self, event: &HubEvent, viewer: &Viewer) -> Option<ServerMessage> {
        match event {
            HubEvent::Change(change) => {
                if self.listens_to_table(&change.table) && viewer.can_see(change) {
                    Some(ServerMessage::Change(change.clone()))
                } else {
                    None
                }
            }
            HubEvent::Broadcast(b) => {
                if !self.listens_to_channel(&b.channel) {
                    return None;
                }
                if b.recipient.is_some_and(|r| r != viewer.user_id) {
                    return None;
                }
                Some(ServerMessage::Broadcast {
                    channel: b.channel.clone(),
                    event: b.event.clone(),
                    payload: b.payload.clone(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::models::notification::{
        Notification, UserNotification, GLOBAL_REPLAY_CHANNEL, TEAM_REPLAY_CHANNEL,
    };
    use domain::models::realtime::tables;
    use serde_json::json;

    fn viewer(user_id: Uuid) -> Viewer {
        Viewer {
            user_id,
            email: Some("ada@example.com".to_string()),
            is_admin: false,
        }
    }

    fn subscribed(tables: &[&str], channels: &[&str]) -> Subscription {
        let mut sub = Subscription::default();
        sub.apply(&ClientMessage::Subscribe {
            tables: tables.iter().map(|s| s.to_string()).collect(),
            channels: channels.iter().map(|s| s.to_string()).collect(),
        });
        sub
    }

    fn global_notification() -> Notification {
        Notification {
            id: Uuid::new_v4(),
            title: "Lunch".into(),
            message: "Pizza in the atrium".into(),
            created_at: Utc::now(),
            is_active: true,
            created_by: None,
            is_replay: false,
            original_notification_id: None,
        }
    }

    fn team_notification(user_id: Uuid) -> UserNotification {
        UserNotification {
            id: Uuid::new_v4(),
            user_id,
            title: "Standup".into(),
            message: "Meet at the whiteboard".into(),
            created_at: Utc::now(),
            is_active: true,
            created_by: None,
            team_id: Some(Uuid::new_v4()),
            read_at: None,
        }
    }

    #[test]
    fn test_client_message_parsing() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"subscribe","tables":["teams"]}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Subscribe {
                tables: vec!["teams".into()],
                channels: vec![]
            }
        );

        let ping: ClientMessage = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert_eq!(ping, ClientMessage::Ping);

        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"shout"}"#).is_err());
    }

    #[test]
    fn test_server_message_shape() {
        let change = ChangeEvent::insert(tables::TEAMS, &json!({"id": "t1"}));
        let value = serde_json::to_value(ServerMessage::Change(change)).unwrap();
        assert_eq!(value["type"], "change");
        assert_eq!(value["table"], "teams");
        assert_eq!(value["event_type"], "INSERT");

        let lagged = serde_json::to_value(ServerMessage::Lagged { skipped: 3 }).unwrap();
        assert_eq!(lagged, json!({"type": "lagged", "skipped": 3}));
    }

    #[test]
    fn test_subscription_table_filter() {
        let me = Uuid::new_v4();
        let sub = subscribed(&[tables::TEAMS], &[]);
        let teams = HubEvent::Change(ChangeEvent::update(tables::TEAMS, &json!({"id": "t"})));
        let regs = HubEvent::Change(ChangeEvent::update(
            tables::REGISTRATIONS,
            &json!({"user_id": me.to_string()}),
        ));

        assert!(sub.filter(&teams, &viewer(me)).is_some());
        assert!(sub.filter(&regs, &viewer(me)).is_none());
    }

    #[test]
    fn test_wildcard_still_applies_row_visibility() {
        let me = Uuid::new_v4();
        let sub = subscribed(&[ALL_TABLES], &[]);
        let mine = HubEvent::Change(ChangeEvent::insert(
            tables::USER_NOTIFICATIONS,
            &json!({"user_id": me.to_string()}),
        ));
        let theirs = HubEvent::Change(ChangeEvent::insert(
            tables::USER_NOTIFICATIONS,
            &json!({"user_id": Uuid::new_v4().to_string()}),
        ));

        assert!(sub.filter(&mine, &viewer(me)).is_some());
        assert!(sub.filter(&theirs, &viewer(me)).is_none());
    }

    #[test]
    fn test_unsubscribe_removes_interest() {
        let mut sub = subscribed(&[tables::TEAMS], &[GLOBAL_REPLAY_CHANNEL]);
        sub.apply(&ClientMessage::Unsubscribe {
            tables: vec![tables::TEAMS.into()],
            channels: vec![],
        });
        assert!(!sub.listens_to_table(tables::TEAMS));
        assert!(sub.listens_to_channel(GLOBAL_REPLAY_CHANNEL));
        assert!(!sub.apply(&ClientMessage::Ping));
    }

    #[test]
    fn test_snapshot_is_sorted() {
        let sub = subscribed(&["teams", "registrations"], &[]);
        assert_eq!(
            sub.snapshot(),
            ServerMessage::Subscribed {
                tables: vec!["registrations".into(), "teams".into()],
                channels: vec![],
            }
        );
    }

    #[test]
    fn test_targeted_broadcast_reaches_only_recipient() {
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let sub = subscribed(&[], &[TEAM_REPLAY_CHANNEL]);
        let payload = ReplayPayload::for_user(&team_notification(me), Utc::now());
        let event = HubEvent::Broadcast(BroadcastEvent {
            channel: payload.channel().into(),
            event: payload.event().into(),
            payload: serde_json::to_value(&payload).unwrap(),
            recipient: payload.user_id,
        });

        assert!(sub.filter(&event, &viewer(me)).is_some());
        assert!(sub.filter(&event, &viewer(other)).is_none());
    }

    #[tokio::test]
    async fn test_publish_without_receivers_reaches_nobody() {
        let hub = RealtimeHub::new(8);
        let payload = ReplayPayload::for_global(&global_notification(), Utc::now());
        assert_eq!(hub.publish_replay(&payload), 0);
    }

    #[tokio::test]
    async fn test_replay_is_delivered_to_subscribers() {
        let hub = RealtimeHub::new(8);
        let mut first = hub.subscribe();
        let mut second = hub.subscribe();
        let payload = ReplayPayload::for_global(&global_notification(), Utc::now());

        assert_eq!(hub.publish_replay(&payload), 2);

        for rx in [&mut first, &mut second] {
            match rx.recv().await.unwrap().as_ref() {
                HubEvent::Broadcast(b) => {
                    assert_eq!(b.channel, GLOBAL_REPLAY_CHANNEL);
                    assert_eq!(b.payload["original_id"], json!(payload.original_id));
                    assert!(b.recipient.is_none());
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_slow_receiver_lags() {
        let hub = RealtimeHub::new(2);
        let mut rx = hub.subscribe();
        for i in 0..5 {
            hub.publish_change(ChangeEvent::insert(tables::TEAMS, &json!({"n": i})));
        }

        match rx.recv().await {
            Err(broadcast::error::RecvError::Lagged(skipped)) => assert_eq!(skipped, 3),
            other => panic!("expected lag, got {:?}", other),
        }
    }
}
