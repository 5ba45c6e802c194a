//! Event type names published on the session event bus.
//!
//! Used by the session store when broadcasting lifecycle updates and by
//! subscribers that render them (CLI progress output, tests).

/// Lifecycle entered a new status.
pub const EVENT_STATUS_CHANGED: &str = "animation.status_changed";

/// Progress changed while PROCESSING.
pub const EVENT_PROGRESS: &str = "animation.progress";

/// A remote backend accepted the job.
pub const EVENT_SUBMITTED: &str = "animation.submitted";

/// Result is ready.
pub const EVENT_COMPLETED: &str = "animation.completed";

/// Job failed.
pub const EVENT_FAILED: &str = "animation.failed";

/// Job was cancelled by the user.
pub const EVENT_CANCELED: &str = "animation.canceled";

/// Session returned to idle.
pub const EVENT_RESET: &str = "animation.reset";

/// A new source image replaced the previous one.
pub const EVENT_IMAGE_CHANGED: &str = "animation.image_changed";
