//! In-memory notifier for testing.

use crate::{Notification, Notifier};
use async_trait::async_trait;
use std::sync::Mutex;

/// Keeps every notification it receives so tests can assert on them.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    received: Mutex<Vec<Notification>>,
}
impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything received so far, oldest first.
    pub fn received(&self) -> Vec<Notification> {
        self.received.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn notify(&self, notification: &Notification) {
        if let Ok(mut received) = self.received.lock() {
            received.push(notification.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_in_order() {
        let notifier = RecordingNotifier::new();
        notifier.notify(&Notification::new("t", "first", "file:///a")).await;
        notifier.notify(&Notification::new("t", "second", "file:///b")).await;
        let bodies: Vec<_> = notifier.received().into_iter().map(|n| n.body).collect();
        assert_eq!(bodies, ["first", "second"]);
    }
}
