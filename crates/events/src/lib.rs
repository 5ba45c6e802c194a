//! Session event bus and notification infrastructure.
//!
//! - [`EventBus`]: in-process publish/subscribe hub for [`SessionEvent`]s,
//!   backed by `tokio::sync::broadcast`.
//! - [`NotificationCenter`]: user-facing notifications with a bounded,
//!   newest-first history.

pub mod bus;
pub mod notifications;

pub use bus::{EventBus, SessionEvent};
pub use notifications::{Notification, NotificationCenter, NotificationKind};
