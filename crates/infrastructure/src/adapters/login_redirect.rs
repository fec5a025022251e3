//! Login redirect adapter.

use std::sync::Arc;

use classdesk_application::ports::LoginRedirect;
use tokio::sync::watch;

/// Publishes the login route on a watch channel when the session ends.
///
/// A UI router watches the receiver and navigates when the value changes.
/// The value is `None` until the first redirect. Clones share the channel.
#[derive(Debug, Clone)]
pub struct WatchLoginRedirect {
    route: String,
    sender: Arc<watch::Sender<Option<String>>>,
}

impl WatchLoginRedirect {
    /// Creates a redirect to `route`, e.g. `/login`.
    #[must_use]
    pub fn new(route: impl Into<String>) -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            route: route.into(),
            sender: Arc::new(sender),
        }
    }

    /// Subscribes to redirect requests.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.sender.subscribe()
    }

    /// Returns true once a redirect has been requested.
    #[must_use]
    pub fn requested(&self) -> bool {
        self.sender.borrow().is_some()
    }
}

impl LoginRedirect for WatchLoginRedirect {
    fn redirect_to_login(&self) {
        tracing::debug!(route = %self.route, "redirecting to login");
        self.sender.send_replace(Some(self.route.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_redirect_publishes_route() {
        let redirect = WatchLoginRedirect::new("/login");
        let receiver = redirect.subscribe();
        assert!(!redirect.requested());

        redirect.redirect_to_login();

        assert!(redirect.requested());
        assert!(receiver.has_changed().unwrap_or(false));
        assert_eq!(receiver.borrow().as_deref(), Some("/login"));
    }
}
