//! Fire-and-forget user notifications.
//!
//! A [`Notifier`] accepts a [`Notification`] and does its best to show it.
//! It never reports failure back to the caller: a notification that can't be
//! delivered is logged and forgotten.

mod command;
#[cfg(feature = "mock")]
mod mock;
mod noop;

pub use crate::command::CommandNotifier;
#[cfg(feature = "mock")]
pub use crate::mock::RecordingNotifier;
pub use crate::noop::NoopNotifier;
use async_trait::async_trait;
use std::sync::Arc;

pub type NotifierHandle = Arc<dyn Notifier + Send + Sync>;

/// Something worth telling the user about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Opened when the notification is clicked, on backends that support it.
    pub link: String,
}
impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>, link: impl Into<String>) -> Self {
        Self { title: title.into(), body: body.into(), link: link.into() }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Name of the backend, for logging.
    fn name(&self) -> &str;

    /// Deliver `notification`, or silently fail trying.
    async fn notify(&self, notification: &Notification);
}

/// Pick the best notifier available on this system, falling back to
/// [`NoopNotifier`] when there isn't one.
pub fn detect() -> NotifierHandle {
    match CommandNotifier::discover() {
        Some(notifier) => {
            tracing::debug!(backend = notifier.name(), "Desktop notifications enabled");
            Arc::new(notifier)
        },
        None => {
            tracing::info!("No supported notification backend found; notifications disabled");
            Arc::new(NoopNotifier)
        },
    }
}
