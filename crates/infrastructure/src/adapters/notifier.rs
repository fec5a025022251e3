//! Notification adapters.

use classdesk_application::ports::Notifier;
use classdesk_domain::{Notification, NotificationLevel};
use tokio::sync::broadcast;

/// Writes notifications to the log at a level matching their severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let message = notification.message.as_str();
        match notification.level {
            NotificationLevel::Error => tracing::error!(target: "classdesk::notify", "{message}"),
            NotificationLevel::Warning => tracing::warn!(target: "classdesk::notify", "{message}"),
            NotificationLevel::Info | NotificationLevel::Success => {
                tracing::info!(target: "classdesk::notify", "{message}");
            }
        }
    }
}

/// Publishes notifications on a broadcast channel for a UI to render.
///
/// Sending never blocks. Slow receivers miss old notifications rather than
/// holding up the request path.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: broadcast::Sender<Notification>,
}

impl ChannelNotifier {
    /// Creates a notifier keeping up to `capacity` unread notifications per
    /// receiver.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to notifications sent from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for ChannelNotifier {
    fn default() -> Self {
        Self::new(32)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        if self.sender.send(notification).is_err() {
            tracing::trace!("notification dropped, no subscribers");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_channel_notifier_delivers_in_order() {
        let notifier = ChannelNotifier::default();
        let mut receiver = notifier.subscribe();

        notifier.notify(Notification::error("Resource not found"));
        notifier.notify(Notification::success("Logged out successfully"));

        assert_eq!(
            receiver.recv().await.unwrap(),
            Notification::error("Resource not found")
        );
        assert_eq!(
            receiver.recv().await.unwrap().level,
            NotificationLevel::Success
        );
    }

    #[test]
    fn test_notify_without_subscribers_does_not_fail() {
        ChannelNotifier::new(0).notify(Notification::info("nobody listening"));
        TracingNotifier.notify(Notification::info("logged only"));
    }
}
