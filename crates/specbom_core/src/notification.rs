use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

/// Transient, dismissable message raised by an action or a background failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
    pub raised_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationCenter {
    next_id: u64,
    lifetime: Duration,
    active: Vec<Notification>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(Duration::seconds(5))
    }
}

impl NotificationCenter {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            next_id: 1,
            lifetime,
            active: Vec::new(),
        }
    }

    /// Raises a notification. Its expiry clock starts on the next `expire` call.
    pub fn push(&mut self, level: NotificationLevel, message: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.active.push(Notification {
            id,
            level,
            message: message.into(),
            raised_at: None,
        });
        id
    }

    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.active.len();
        self.active.retain(|n| n.id != id);
        before != self.active.len()
    }

    /// Stamps fresh notifications with `now` and drops those past their lifetime.
    /// Returns true if anything was removed.
    pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
        for notification in &mut self.active {
            notification.raised_at.get_or_insert(now);
        }
        let lifetime = self.lifetime;
        let before = self.active.len();
        self.active.retain(|n| {
            n.raised_at
                .is_none_or(|at| now.signed_duration_since(at) < lifetime)
        });
        before != self.active.len()
    }

    pub fn active(&self) -> &[Notification] {
        &self.active
    }
}
