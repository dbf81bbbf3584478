//! User-facing notifications ("toasts") for account operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    /// The operation completed.
    Success,
    /// The operation failed or was refused.
    Error,
    /// Neutral information.
    Info,
}

impl std::fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A short message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Severity of the outcome.
    pub level: NotificationLevel,
    /// Text shown to the user.
    pub message: String,
    /// When the notification was created.
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// A success notification.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, message)
    }

    /// An error notification.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, message)
    }

    /// An informational notification.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Info, message)
    }

    fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Broadcasts notifications to every interested surface.
///
/// Notifications are not kept for subscribers that join later.
#[derive(Debug, Clone)]
pub struct NotificationBroadcaster {
    sender: broadcast::Sender<Notification>,
}

impl NotificationBroadcaster {
    /// Creates a broadcaster buffering up to `capacity` notifications per
    /// subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receives every notification sent after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Sends a notification; returns how many subscribers will see it.
    pub fn send(&self, notification: Notification) -> usize {
        // Err only means nobody is listening
        self.sender.send(notification).unwrap_or(0)
    }

    /// Returns the number of live receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationBroadcaster {
    fn default() -> Self {
        Self::new(32)
    }
}
