use chrono::{DateTime, Utc};
use shared::{domain::MatchId, protocol::Match};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Transient, non-blocking message for the viewer (a toast in a GUI, a line
/// on stderr in the CLI).
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub detail: String,
    pub raised_at: DateTime<Utc>,
}

impl Notification {
    pub fn success(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Success, title, detail)
    }

    pub fn error(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(NotificationLevel::Error, title, detail)
    }

    fn new(level: NotificationLevel, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            detail: detail.into(),
            raised_at: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    SnapshotUpdated(Match),
    SnapshotInvalidated(MatchId),
    Notification(Notification),
}
