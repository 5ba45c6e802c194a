//! User-facing notifications.
//!
//! [`NotificationCenter`] is an explicit instance handed to whoever needs
//! to notify the user. It keeps a bounded history (newest first) and fans
//! every new notification out to subscribers.

use std::collections::VecDeque;
use std::sync::Mutex;

use animator_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Maximum number of notifications retained in the history.
pub const MAX_HISTORY: usize = 50;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: Timestamp,
    pub read: bool,
}

pub struct NotificationCenter {
    history: Mutex<VecDeque<Notification>>,
    sender: broadcast::Sender<Notification>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            history: Mutex::new(VecDeque::with_capacity(MAX_HISTORY)),
            sender,
        }
    }

    /// Record a notification and broadcast it to subscribers.
    pub fn send(&self, message: impl Into<String>, kind: NotificationKind) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            created_at: chrono::Utc::now(),
            read: false,
        };

        {
            let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
            history.push_front(notification.clone());
            history.truncate(MAX_HISTORY);
        }

        tracing::debug!(kind = ?kind, message = %notification.message, "Notification sent");
        let _ = self.sender.send(notification.clone());
        notification
    }

    pub fn info(&self, message: impl Into<String>) -> Notification {
        self.send(message, NotificationKind::Info)
    }

    pub fn success(&self, message: impl Into<String>) -> Notification {
        self.send(message, NotificationKind::Success)
    }

    pub fn warning(&self, message: impl Into<String>) -> Notification {
        self.send(message, NotificationKind::Warning)
    }

    pub fn error(&self, message: impl Into<String>) -> Notification {
        self.send(message, NotificationKind::Error)
    }

    /// Snapshot of the history, newest first.
    pub fn history(&self) -> Vec<Notification> {
        let history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        history.iter().cloned().collect()
    }

    /// Returns `false` when no notification with `id` is retained.
    pub fn mark_as_read(&self, id: Uuid) -> bool {
        let mut history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        match history.iter_mut().find(|n| n.id == id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }

    pub fn unread_count(&self) -> usize {
        let history = self.history.lock().unwrap_or_else(|e| e.into_inner());
        history.iter().filter(|n| !n.read).count()
    }

    pub fn clear(&self) {
        self.history.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
