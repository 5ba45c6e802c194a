//! Animation queue bookkeeping.
//!
//! [`AnimationQueue`] tracks which animations are waiting to be processed,
//! their 1-based position and a rough wait estimate. It does not dispatch
//! work itself; sessions enqueue on start and remove on any terminal
//! outcome. Status changes are broadcast as [`QueueSnapshot`]s.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use animator_core::types::Timestamp;
use serde::Serialize;
use tokio::sync::broadcast;

/// Assumed processing time per queued item, used for wait estimates.
pub const SECONDS_PER_POSITION: u64 = 30;

/// Attempt budget recorded on new items. Informational only: the queue
/// never retries.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueStatus {
    Idle,
    Processing,
    Paused,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueuePriority {
    #[default]
    Normal,
    /// Jumps ahead of every queued item.
    High,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueueItem {
    /// Queue-assigned id, e.g. `queue-<uuid>`.
    pub id: String,
    pub animation_id: String,
    pub priority: QueuePriority,
    pub added_at: Timestamp,
    /// Informational only; nothing retries a queued animation.
    pub attempts: u32,
    /// Informational only, see [`DEFAULT_MAX_ATTEMPTS`].
    pub max_attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueSnapshot {
    pub status: QueueStatus,
    pub queue_length: usize,
    pub currently_processing: Option<String>,
}

struct QueueState {
    items: VecDeque<QueueItem>,
    status: QueueStatus,
    currently_processing: Option<String>,
}

impl QueueState {
    fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            status: self.status,
            queue_length: self.items.len(),
            currently_processing: self.currently_processing.clone(),
        }
    }

    fn position(&self, animation_id: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.animation_id == animation_id)
            .map(|index| index + 1)
    }

    /// Recompute the status after the item list changed. A paused queue
    /// stays paused; an errored one recovers.
    fn refresh(&mut self) {
        if self.status == QueueStatus::Paused {
            return;
        }
        self.currently_processing = self.items.front().map(|item| item.animation_id.clone());
        self.status = if self.items.is_empty() {
            QueueStatus::Idle
        } else {
            QueueStatus::Processing
        };
    }
}

pub struct AnimationQueue {
    state: Mutex<QueueState>,
    sender: broadcast::Sender<QueueSnapshot>,
}

impl AnimationQueue {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                status: QueueStatus::Idle,
                currently_processing: None,
            }),
            sender,
        }
    }

    /// Enqueue an animation and return its queue id.
    pub fn add(&self, animation_id: impl Into<String>, priority: QueuePriority) -> String {
        let item = QueueItem {
            id: format!("queue-{}", uuid::Uuid::new_v4()),
            animation_id: animation_id.into(),
            priority,
            added_at: chrono::Utc::now(),
            attempts: 0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        };
        let queue_id = item.id.clone();

        self.update(|state| {
            tracing::debug!(
                queue_id = %item.id,
                animation_id = %item.animation_id,
                priority = ?priority,
                "Animation queued",
            );
            match priority {
                QueuePriority::High => state.items.push_front(item),
                QueuePriority::Normal => state.items.push_back(item),
            }
            state.refresh();
            true
        });

        queue_id
    }

    /// 1-based position of an animation, `None` when it is not queued.
    pub fn position(&self, animation_id: &str) -> Option<usize> {
        self.lock().position(animation_id)
    }

    /// Rough wait before an animation is processed.
    pub fn estimated_wait(&self, animation_id: &str) -> Option<Duration> {
        self.position(animation_id)
            .map(|position| Duration::from_secs(position as u64 * SECONDS_PER_POSITION))
    }

    /// Remove an animation from the queue. Returns `false` when it was not
    /// queued.
    pub fn remove(&self, animation_id: &str) -> bool {
        self.update(|state| match state.position(animation_id) {
            Some(position) => {
                state.items.remove(position - 1);
                state.refresh();
                true
            }
            None => false,
        })
    }

    pub fn pause(&self) {
        self.update(|state| {
            if state.status == QueueStatus::Paused {
                return false;
            }
            state.status = QueueStatus::Paused;
            true
        });
    }

    pub fn resume(&self) {
        self.update(|state| {
            if state.status != QueueStatus::Paused {
                return false;
            }
            state.status = QueueStatus::Idle;
            state.refresh();
            true
        });
    }

    /// Flag the queue as failed until the next change.
    pub fn mark_error(&self) {
        self.update(|state| {
            state.status = QueueStatus::Error;
            true
        });
    }

    pub fn status(&self) -> QueueSnapshot {
        self.lock().snapshot()
    }

    pub fn items(&self) -> Vec<QueueItem> {
        self.lock().items.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to status snapshots published after every change.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueSnapshot> {
        self.sender.subscribe()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply `change` and broadcast the new snapshot when it reports a
    /// modification.
    fn update(&self, change: impl FnOnce(&mut QueueState) -> bool) -> bool {
        let snapshot = {
            let mut state = self.lock();
            if !change(&mut state) {
                return false;
            }
            state.snapshot()
        };
        let _ = self.sender.send(snapshot);
        true
    }
}

impl Default for AnimationQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
