use crate::{Notification, Notifier};
use async_trait::async_trait;

/// Drops every notification on the floor.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    fn name(&self) -> &str {
        "noop"
    }

    async fn notify(&self, notification: &Notification) {
        tracing::trace!(title = %notification.title, body = %notification.body, "Notification discarded");
    }
}
