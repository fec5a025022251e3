//! Notification port

use classdesk_domain::Notification;

/// Port for user-visible notifications (toasts, status lines).
///
/// `notify` is called inline on the error path and must not block.
pub trait Notifier: Send + Sync {
    /// Shows a notification.
    fn notify(&self, notification: Notification);
}

/// Discards notifications.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn notify(&self, _notification: Notification) {}
}
