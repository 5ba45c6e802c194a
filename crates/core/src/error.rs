use crate::status::LifecycleStatus;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid lifecycle transition from {from:?} on {event}")]
    InvalidTransition {
        /// Status the lifecycle was in, `None` when idle.
        from: Option<LifecycleStatus>,
        /// Short name of the rejected event.
        event: String,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
