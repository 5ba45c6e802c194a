//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] fans out [`SessionEvent`]s to any number of subscribers.
//! It is shared via `Arc<EventBus>` between a session store and whoever
//! renders its progress.

use animator_core::status::LifecycleStatus;
use animator_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// SessionEvent
// ---------------------------------------------------------------------------

/// Something that happened to an animation session.
///
/// Constructed via [`SessionEvent::new`] and enriched with
/// [`with_status`](SessionEvent::with_status),
/// [`with_progress`](SessionEvent::with_progress) and
/// [`with_payload`](SessionEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub session_id: Uuid,

    /// Dot-separated event name, see `animator_core::session_events`.
    pub event_type: String,

    /// Lifecycle status after the event, `None` when idle.
    pub status: Option<LifecycleStatus>,

    /// Progress fraction after the event.
    pub progress: f64,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    pub timestamp: Timestamp,
}

impl SessionEvent {
    pub fn new(session_id: Uuid, event_type: impl Into<String>) -> Self {
        Self {
            session_id,
            event_type: event_type.into(),
            status: None,
            progress: 0.0,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_status(mut self, status: Option<LifecycleStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use animator_events::bus::{EventBus, SessionEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(SessionEvent::new(uuid::Uuid::nil(), "animation.reset"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// Slow receivers observe `RecvError::Lagged` once the buffer is full.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Dropped silently when nobody is subscribed.
    pub fn publish(&self, event: SessionEvent) {
        tracing::trace!(event_type = %event.event_type, session_id = %event.session_id, "Publishing session event");
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let session = Uuid::new_v4();

        bus.publish(
            SessionEvent::new(session, "animation.progress")
                .with_status(Some(LifecycleStatus::Processing))
                .with_progress(0.25)
                .with_payload(serde_json::json!({"job_id": "abc"})),
        );

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.session_id, session);
        assert_eq!(received.event_type, "animation.progress");
        assert_eq!(received.status, Some(LifecycleStatus::Processing));
        assert_eq!(received.progress, 0.25);
        assert_eq!(received.payload["job_id"], "abc");
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = EventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(SessionEvent::new(Uuid::nil(), "animation.reset"));

        assert_eq!(rx1.recv().await.unwrap().event_type, "animation.reset");
        assert_eq!(rx2.recv().await.unwrap().event_type, "animation.reset");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = EventBus::default();
        bus.publish(SessionEvent::new(Uuid::nil(), "orphan.event"));
    }

    #[test]
    fn new_event_is_idle_with_empty_payload() {
        let event = SessionEvent::new(Uuid::nil(), "bare.event");
        assert!(event.status.is_none());
        assert_eq!(event.progress, 0.0);
        assert!(event.payload.is_object());
    }
}
