//! Client-side notification inbox.
//!
//! Tracks what one signed-in participant has seen. Persisted notifications go
//! `unseen -> visible -> read -> dismissed`. Replays take a separate ephemeral
//! path, `received -> visible -> dismissed`, closing on request or once their
//! display time runs out. Replays never touch read state.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::models::notification::{NotificationView, ReplayPayload};

/// Delivery state of a persisted notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    Unseen,
    Visible,
    Read,
    Dismissed,
}

#[derive(Debug, Clone, Default)]
struct Entry {
    seen: bool,
    read_at: Option<DateTime<Utc>>,
}

/// An open replay popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayPopup {
    pub original_id: Uuid,
    pub title: String,
    pub message: String,
    pub shown_at: DateTime<Utc>,
    pub dismiss_at: DateTime<Utc>,
}

/// Per-user inbox state.
#[derive(Debug, Clone)]
pub struct NotificationInbox {
    user_id: Uuid,
    entries: HashMap<Uuid, Entry>,
    dismissed: HashSet<Uuid>,
    popups: Vec<ReplayPopup>,
}

impl NotificationInbox {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            entries: HashMap::new(),
            dismissed: HashSet::new(),
            popups: Vec::new(),
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Syncs a notification from a feed fetch. Server read state wins; local
    /// seen and dismissed markers are kept.
    pub fn receive(&mut self, view: &NotificationView) -> DeliveryState {
        if !view.scope.addresses(self.user_id) {
            return DeliveryState::Unseen;
        }
        let entry = self.entries.entry(view.id).or_default();
        entry.read_at = view.read_at;
        self.state(view.id).unwrap_or(DeliveryState::Unseen)
    }

    pub fn state(&self, id: Uuid) -> Option<DeliveryState> {
        let entry = self.entries.get(&id)?;
        Some(if self.dismissed.contains(&id) {
            DeliveryState::Dismissed
        } else if entry.read_at.is_some() {
            DeliveryState::Read
        } else if entry.seen {
            DeliveryState::Visible
        } else {
            DeliveryState::Unseen
        })
    }

    /// Marks a notification as displayed. Returns false for unknown ids.
    pub fn show(&mut self, id: Uuid) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.seen = true;
                true
            }
            None => false,
        }
    }

    /// Records a read. Keeps the first timestamp when already read.
    pub fn mark_read(&mut self, id: Uuid, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let entry = self.entries.get_mut(&id)?;
        entry.seen = true;
        Some(*entry.read_at.get_or_insert(at))
    }

    pub fn mark_unread(&mut self, id: Uuid) -> bool {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.read_at = None;
                true
            }
            None => false,
        }
    }

    pub fn dismiss(&mut self, id: Uuid) -> bool {
        if self.entries.contains_key(&id) {
            self.dismissed.insert(id)
        } else {
            false
        }
    }

    pub fn unread_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(id, e)| e.read_at.is_none() && !self.dismissed.contains(*id))
            .count()
    }

    /// Handles a replay event. Returns false when the replay targets someone
    /// else. Otherwise clears the dismissed marker of the original so it can
    /// reappear and opens (or restarts) a popup.
    pub fn receive_replay(&mut self, payload: &ReplayPayload, now: DateTime<Utc>) -> bool {
        if !payload.is_for(self.user_id) {
            return false;
        }

        self.dismissed.remove(&payload.original_id);
        self.popups.retain(|p| p.original_id != payload.original_id);
        self.popups.push(ReplayPopup {
            original_id: payload.original_id,
            title: payload.title.clone(),
            message: payload.message.clone(),
            shown_at: now,
            dismiss_at: payload.dismiss_at(now),
        });
        true
    }

    /// Closes a popup by hand.
    pub fn dismiss_popup(&mut self, original_id: Uuid) -> bool {
        let before = self.popups.len();
        self.popups.retain(|p| p.original_id != original_id);
        self.popups.len() != before
    }

    /// Closes popups whose timer ran out and returns their ids.
    pub fn expire_popups(&mut self, now: DateTime<Utc>) -> Vec<Uuid> {
        let (expired, open): (Vec<_>, Vec<_>) =
            self.popups.drain(..).partition(|p| p.dismiss_at <= now);
        self.popups = open;
        expired.into_iter().map(|p| p.original_id).collect()
    }

    pub fn popups(&self) -> &[ReplayPopup] {
        &self.popups
    }
}
