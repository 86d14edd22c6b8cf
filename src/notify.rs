//! Transient status notifications ("toasts") and their expiry timer.

use crate::event::{AppEvent, EventSink};
use std::time::Duration;
use tracing::debug;

/// How long a toast stays up unless something replaces it
pub const DEFAULT_NOTIFICATION_DELAY: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// Identifies one emission of a notification, so a stale expiry can be told
/// apart from the expiry of the notification currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotificationId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub severity: Severity,
}

/// Schedules notification expiry events on the shared pipeline
#[derive(Debug)]
pub struct NotificationTimer {
    sink: EventSink,
    delay: Duration,
    next_id: u64,
}

impl NotificationTimer {
    pub fn new(sink: EventSink, delay: Duration) -> Self {
        Self {
            sink,
            delay,
            next_id: 0,
        }
    }

    /// Create a notification and schedule its expiry.
    ///
    /// The expiry arrives as [`AppEvent::NotificationExpired`] carrying the
    /// returned notification's id after the configured delay.
    pub fn submit(&mut self, message: impl Into<String>, severity: Severity) -> Notification {
        let id = NotificationId(self.next_id);
        self.next_id += 1;

        let sink = self.sink.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            sink.send(AppEvent::NotificationExpired(id));
        });

        let notification = Notification {
            id,
            message: message.into(),
            severity,
        };
        debug!(id = id.0, severity = severity.label(), message = %notification.message, "Notification");
        notification
    }
}
