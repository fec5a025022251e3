//! User-visible notifications raised by the API client.

use serde::{Deserialize, Serialize};

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    /// Neutral information.
    Info,
    /// An operation completed.
    Success,
    /// Something needs attention but nothing failed.
    Warning,
    /// An operation failed.
    Error,
}

/// A short message meant for a toast or status line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Severity.
    pub level: NotificationLevel,
    /// Text shown to the user.
    pub message: String,
}

impl Notification {
    /// Creates an error notification.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    /// Creates a success notification.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    /// Creates an informational notification.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
        }
    }
}
