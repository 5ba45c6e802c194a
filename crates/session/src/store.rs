//! Single source of truth for one animation session.
//!
//! [`AnimationSessionStore`] owns the source image, the configuration, the
//! [`AnimationLifecycle`] and at most one running backend task. Every
//! change is published three ways: a [`SessionEvent`] on the [`EventBus`],
//! a fresh [`SessionSnapshot`] on a watch channel and, for terminal
//! outcomes, a user-facing notification.
//!
//! Each run is tagged with the session epoch it was started under. The
//! backend feeds events through a [`SessionSink`] carrying that epoch, so
//! anything a superseded or cancelled run still emits is discarded.

use std::sync::{Arc, Mutex, MutexGuard};

use animator_client::{BackendKind, JobBackend, JobRequest, LifecycleSink};
use animator_core::config::AnimationConfig;
use animator_core::error::CoreError;
use animator_core::lifecycle::{AnimationLifecycle, JobHandle, LifecycleEvent};
use animator_core::session_events::{
    EVENT_CANCELED, EVENT_COMPLETED, EVENT_FAILED, EVENT_IMAGE_CHANGED, EVENT_PROGRESS,
    EVENT_RESET, EVENT_STATUS_CHANGED, EVENT_SUBMITTED,
};
use animator_core::source_image::SourceImage;
use animator_core::status::LifecycleStatus;
use animator_core::video::AnimatedVideo;
use animator_events::{EventBus, NotificationCenter, SessionEvent};
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::queue::{AnimationQueue, QueuePriority};

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Point-in-time view of a session, suitable for rendering.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub image: Option<SourceImage>,
    pub config: Option<AnimationConfig>,
    pub status: Option<LifecycleStatus>,
    pub progress: f64,
    pub job: Option<JobHandle>,
    pub result: Option<AnimatedVideo>,
    pub error: Option<String>,
    pub status_message: Option<String>,
    /// Extrapolated from progress so far; only known while PROCESSING.
    pub estimated_seconds_remaining: Option<f64>,
    pub is_processing: bool,
    pub is_generate_disabled: bool,
    pub is_download_disabled: bool,
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

/// The backend task of the current run.
struct ActiveTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    queue_key: String,
}

struct SessionState {
    image: Option<SourceImage>,
    config: Option<AnimationConfig>,
    lifecycle: AnimationLifecycle,
    /// Bumped on every start and reset.
    epoch: u64,
    task: Option<ActiveTask>,
    processing_started: Option<Instant>,
}

impl SessionState {
    fn is_processing(&self) -> bool {
        self.lifecycle.is_active()
    }

    fn estimated_seconds_remaining(&self) -> Option<f64> {
        if self.lifecycle.status() != Some(LifecycleStatus::Processing) {
            return None;
        }
        let progress = self.lifecycle.progress();
        let started = self.processing_started?;
        if progress <= 0.0 {
            return None;
        }
        let elapsed = started.elapsed().as_secs_f64();
        Some(elapsed * (1.0 - progress) / progress)
    }
}

struct Shared {
    session_id: Uuid,
    state: Mutex<SessionState>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    events: Arc<EventBus>,
    notifications: Arc<NotificationCenter>,
    queue: Arc<AnimationQueue>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn snapshot_of(&self, state: &SessionState) -> SessionSnapshot {
        let lifecycle = &state.lifecycle;
        let is_processing = state.is_processing();
        SessionSnapshot {
            session_id: self.session_id,
            image: state.image.clone(),
            config: state.config.clone(),
            status: lifecycle.status(),
            progress: lifecycle.progress(),
            job: lifecycle.job().cloned(),
            result: lifecycle.result().cloned(),
            error: lifecycle.error().map(str::to_string),
            status_message: lifecycle
                .status()
                .map(|status| status.message(lifecycle.progress(), lifecycle.error())),
            estimated_seconds_remaining: state.estimated_seconds_remaining(),
            is_processing,
            is_generate_disabled: state.image.is_none() || is_processing,
            is_download_disabled: lifecycle.result().is_none(),
        }
    }

    /// Publish an event describing the current state and refresh the
    /// observable snapshot.
    fn publish(&self, state: &SessionState, event_type: &str, payload: serde_json::Value) {
        self.events.publish(
            SessionEvent::new(self.session_id, event_type)
                .with_status(state.lifecycle.status())
                .with_progress(state.lifecycle.progress())
                .with_payload(payload),
        );
        self.snapshot_tx.send_replace(self.snapshot_of(state));
    }

    /// Take the active task out of the session, stop it and drop it from
    /// the queue. The only place a run is released.
    fn release_task(&self, state: &mut SessionState) {
        if let Some(task) = state.task.take() {
            task.cancel.cancel();
            self.queue.remove(&task.queue_key);
            // Detached: the run observes the token and returns on its own.
            drop(task.handle);
        }
        state.processing_started = None;
    }
}

// ---------------------------------------------------------------------------
// SessionSink
// ---------------------------------------------------------------------------

/// Lifecycle sink handed to a backend run, bound to the epoch it started in.
struct SessionSink {
    shared: Arc<Shared>,
    epoch: u64,
}

impl LifecycleSink for SessionSink {
    fn apply(&self, event: LifecycleEvent) -> bool {
        let shared = &self.shared;
        let mut state = shared.lock();
        if state.epoch != self.epoch || !state.is_processing() {
            tracing::debug!(event = %event.name(), epoch = self.epoch, "Discarding stale lifecycle event");
            return false;
        }

        let name = event.name();
        let submitted = match &event {
            LifecycleEvent::Submitted(handle) => Some(handle.job_id.clone()),
            _ => None,
        };
        let is_progress = matches!(event, LifecycleEvent::Progress(_));

        let changed = match state.lifecycle.advance(event) {
            Ok(changed) => changed,
            Err(e) => {
                tracing::warn!(event = %name, error = %e, "Rejected lifecycle event");
                return true;
            }
        };

        if let Some(job_id) = submitted {
            tracing::info!(session_id = %shared.session_id, job_id = %job_id, "Job submitted");
            shared.publish(&state, EVENT_SUBMITTED, serde_json::json!({ "job_id": job_id }));
        }
        if is_progress {
            shared.publish(&state, EVENT_PROGRESS, serde_json::Value::Null);
        }

        match changed {
            Some(LifecycleStatus::Processing) => {
                state.processing_started = Some(Instant::now());
                shared.publish(&state, EVENT_STATUS_CHANGED, serde_json::Value::Null);
            }
            Some(LifecycleStatus::Completed) => {
                shared.release_task(&mut state);
                let video = state.lifecycle.result().cloned();
                tracing::info!(
                    session_id = %shared.session_id,
                    url = video.as_ref().map(|v| v.url.as_str()).unwrap_or_default(),
                    "Animation completed",
                );
                shared.publish(&state, EVENT_COMPLETED, serde_json::json!({ "video": video }));
                shared.notifications.success("Animation complete!");
            }
            Some(LifecycleStatus::Failed) => {
                shared.release_task(&mut state);
                let reason = state.lifecycle.error().unwrap_or("Unknown error").to_string();
                tracing::warn!(session_id = %shared.session_id, error = %reason, "Animation failed");
                shared.publish(&state, EVENT_FAILED, serde_json::json!({ "error": reason }));
                shared.notifications.error(format!("Animation failed: {reason}"));
            }
            Some(status) => {
                tracing::debug!(session_id = %shared.session_id, status = %status, "Status changed");
                shared.publish(&state, EVENT_STATUS_CHANGED, serde_json::Value::Null);
            }
            None => {}
        }

        state.is_processing()
    }
}

// ---------------------------------------------------------------------------
// AnimationSessionStore
// ---------------------------------------------------------------------------

/// One user's animation session.
///
/// Must be used from within a tokio runtime: starting a run spawns the
/// backend task.
pub struct AnimationSessionStore {
    shared: Arc<Shared>,
    backend: Arc<dyn JobBackend>,
}

impl AnimationSessionStore {
    /// Create a session that reports through the given hub instances.
    pub fn new(
        backend: Arc<dyn JobBackend>,
        events: Arc<EventBus>,
        notifications: Arc<NotificationCenter>,
        queue: Arc<AnimationQueue>,
    ) -> Self {
        let session_id = Uuid::now_v7();
        let state = SessionState {
            image: None,
            config: None,
            lifecycle: AnimationLifecycle::new(),
            epoch: 0,
            task: None,
            processing_started: None,
        };
        let (snapshot_tx, _) = watch::channel(SessionSnapshot {
            session_id,
            image: None,
            config: None,
            status: None,
            progress: 0.0,
            job: None,
            result: None,
            error: None,
            status_message: None,
            estimated_seconds_remaining: None,
            is_processing: false,
            is_generate_disabled: true,
            is_download_disabled: true,
        });

        tracing::debug!(session_id = %session_id, backend = backend.kind().as_str(), "Session created");

        Self {
            shared: Arc::new(Shared {
                session_id,
                state: Mutex::new(state),
                snapshot_tx,
                events,
                notifications,
                queue,
            }),
            backend,
        }
    }

    /// Create a session with private event bus, notification center and
    /// queue.
    pub fn with_backend(backend: Arc<dyn JobBackend>) -> Self {
        Self::new(
            backend,
            Arc::new(EventBus::default()),
            Arc::new(NotificationCenter::new()),
            Arc::new(AnimationQueue::new()),
        )
    }

    pub fn session_id(&self) -> Uuid {
        self.shared.session_id
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.shared.events
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.shared.notifications
    }

    pub fn queue(&self) -> &Arc<AnimationQueue> {
        &self.shared.queue
    }

    // -- image and configuration --------------------------------------------

    /// Replace the source image.
    ///
    /// Clears any previous result, error and progress. The configuration
    /// survives; a default one is created for the first image. Rejected
    /// while a job is active.
    pub fn set_source_image(&self, image: SourceImage) -> Result<(), CoreError> {
        let shared = &self.shared;
        let mut state = shared.lock();
        if state.is_processing() {
            return Err(CoreError::Conflict(
                "Cannot change the image while an animation is processing".into(),
            ));
        }

        tracing::info!(
            session_id = %shared.session_id,
            file_name = %image.file_name,
            width = image.width,
            height = image.height,
            "Source image set",
        );
        let payload = serde_json::json!({
            "image_id": image.id,
            "file_name": image.file_name,
            "width": image.width,
            "height": image.height,
        });

        state.image = Some(image);
        if state.config.is_none() {
            state.config = Some(AnimationConfig::default());
        }
        state.lifecycle.reset();
        shared.publish(&state, EVENT_IMAGE_CHANGED, payload);
        Ok(())
    }

    /// Validate an upload and make it the source image.
    ///
    /// Nothing changes when validation fails.
    pub fn load_image(
        &self,
        file_name: impl Into<String>,
        mime_type: &str,
        data: Vec<u8>,
        url: impl Into<String>,
    ) -> Result<(), CoreError> {
        let image = SourceImage::from_upload(file_name, mime_type, data, url)?;
        self.set_source_image(image)
    }

    /// Apply a change to the configuration.
    ///
    /// The change is made on a copy and committed only when it and the
    /// resulting configuration are valid. A running job keeps the
    /// configuration it was started with.
    pub fn update_config<F>(&self, change: F) -> Result<(), CoreError>
    where
        F: FnOnce(&mut AnimationConfig) -> Result<(), CoreError>,
    {
        let shared = &self.shared;
        let mut state = shared.lock();
        let Some(current) = state.config.as_ref() else {
            return Err(CoreError::Validation(
                "Upload an image before configuring the animation".into(),
            ));
        };

        let mut next = current.clone();
        change(&mut next)?;
        next.validate()?;

        tracing::debug!(session_id = %shared.session_id, config = ?next, "Configuration updated");
        state.config = Some(next);
        shared.snapshot_tx.send_replace(shared.snapshot_of(&state));
        Ok(())
    }

    // -- processing -------------------------------------------------------------

    /// Start animating the current image with the current configuration.
    ///
    /// A no-op returning `false` when there is no image or configuration
    /// or a job is already active.
    pub fn start_processing(&self) -> bool {
        let shared = &self.shared;
        let mut state = shared.lock();

        let (Some(image), Some(config)) = (state.image.clone(), state.config.clone()) else {
            return false;
        };
        if !state.lifecycle.start(Some(&image), Some(&config)) {
            return false;
        }

        // A finished run may still be winding down.
        shared.release_task(&mut state);
        state.epoch += 1;
        let epoch = state.epoch;

        let queue_key = format!("{}-{epoch}", shared.session_id);
        shared.queue.add(queue_key.as_str(), QueuePriority::Normal);

        let cancel = CancellationToken::new();
        let sink: Arc<dyn LifecycleSink> = Arc::new(SessionSink {
            shared: Arc::clone(shared),
            epoch,
        });
        let backend = Arc::clone(&self.backend);
        let request = JobRequest { image, config };
        let run_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            backend.run(request, sink, run_cancel).await;
        });

        state.task = Some(ActiveTask {
            cancel,
            handle,
            queue_key,
        });

        tracing::info!(
            session_id = %shared.session_id,
            epoch,
            backend = self.backend.kind().as_str(),
            "Processing started",
        );
        shared.publish(&state, EVENT_STATUS_CHANGED, serde_json::Value::Null);
        true
    }

    /// Cancel the active job.
    ///
    /// Returns `false` when nothing is active. A job already accepted by
    /// a remote backend is abandoned there in the background.
    pub fn cancel_processing(&self) -> bool {
        let shared = &self.shared;
        let mut state = shared.lock();

        let job = state.lifecycle.job().cloned();
        if !state.lifecycle.cancel() {
            return false;
        }
        shared.release_task(&mut state);

        tracing::info!(session_id = %shared.session_id, "Processing cancelled");
        shared.publish(&state, EVENT_CANCELED, serde_json::Value::Null);
        shared.notifications.info("Animation was canceled");
        drop(state);

        if let Some(job) = job {
            self.abandon(job);
        }
        true
    }

    /// Return to an empty session, stopping any active job.
    pub fn reset_all(&self) {
        let shared = &self.shared;
        let mut state = shared.lock();

        let job = state.lifecycle.job().cloned();
        shared.release_task(&mut state);
        state.epoch += 1;
        state.lifecycle.reset();
        state.image = None;
        state.config = None;

        tracing::info!(session_id = %shared.session_id, "Session reset");
        shared.publish(&state, EVENT_RESET, serde_json::Value::Null);
        drop(state);

        if let Some(job) = job {
            self.abandon(job);
        }
    }

    /// Location of the finished animation, `None` until COMPLETED.
    pub fn download_video(&self) -> Option<String> {
        let state = self.shared.lock();
        let video = state.lifecycle.result()?;
        tracing::info!(
            session_id = %self.shared.session_id,
            video_id = %video.id,
            url = %video.url,
            "Video download requested",
        );
        Some(video.url.clone())
    }

    fn abandon(&self, job: JobHandle) {
        let backend = Arc::clone(&self.backend);
        tokio::spawn(async move {
            backend.abandon(&job).await;
        });
    }

    // -- observation ------------------------------------------------------------

    pub fn is_processing(&self) -> bool {
        self.shared.lock().is_processing()
    }

    /// `true` without an image or while a job is active.
    pub fn is_generate_disabled(&self) -> bool {
        let state = self.shared.lock();
        state.image.is_none() || state.is_processing()
    }

    /// `true` until a result is available.
    pub fn is_download_disabled(&self) -> bool {
        self.shared.lock().lifecycle.result().is_none()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.shared.lock();
        self.shared.snapshot_of(&state)
    }

    /// Receiver that observes every snapshot change.
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.snapshot_tx.subscribe()
    }

    /// Subscribe to session events on the event bus.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }
}

impl Drop for AnimationSessionStore {
    fn drop(&mut self) {
        let mut state = self.shared.lock();
        state.epoch += 1;
        self.shared.release_task(&mut state);
    }
}
