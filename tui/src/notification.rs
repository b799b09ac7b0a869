//! Notification center: short messages shown over the panel.
//!
//! Failed writes, refused commands and confirmations all end up here. Each
//! entry expires after its TTL; the center keeps at most `max` entries and
//! drops the oldest when full.

use serde::{Deserialize, Serialize};


/// Category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Info,
    Warning,
    Error,
    Success,
}

impl NotificationType {
    pub fn label(&self) -> &'static str {
        match self {
            NotificationType::Info => "info",
            NotificationType::Warning => "warn",
            NotificationType::Error => "error",
            NotificationType::Success => "ok",
        }
    }
}


/// A single notification entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub notification_type: NotificationType,
    /// One line of text. Newlines are flattened on push.
    pub body: String,
    pub created_ms: u64,
    /// `None` persists until pushed out by newer entries.
    pub ttl_ms: Option<u64>,
}

impl Notification {
    pub fn is_expired(&self, now_ms: u64) -> bool {
        match self.ttl_ms {
            Some(ttl) => now_ms.saturating_sub(self.created_ms) >= ttl,
            None => false,
        }
    }

    pub fn summary(&self) -> String {
        format!("[{}] {}", self.notification_type.label(), self.body)
    }
}


/// Bounded queue of notifications, newest last.
#[derive(Debug)]
pub struct NotificationCenter {
    items: Vec<Notification>,
    max: usize,
    next_id: u64,
}

impl NotificationCenter {
    pub fn new(max: usize) -> Self {
        NotificationCenter {
            items: Vec::new(),
            max: max.max(1),
            next_id: 1,
        }
    }

    /// Add a notification and return its id.
    pub fn push(
        &mut self,
        notification_type: NotificationType,
        body: &str,
        now_ms: u64,
        ttl_ms: Option<u64>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        if self.items.len() >= self.max {
            self.items.remove(0);
        }
        self.items.push(Notification {
            id,
            notification_type,
            body: body.lines().map(str::trim).collect::<Vec<_>>().join(" "),
            created_ms: now_ms,
            ttl_ms,
        });
        id
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn prune(&mut self, now_ms: u64) -> usize {
        let before = self.items.len();
        self.items.retain(|n| !n.is_expired(now_ms));
        before - self.items.len()
    }

    /// Most recent entry still alive at `now_ms`.
    pub fn latest(&self, now_ms: u64) -> Option<&Notification> {
        self.items.iter().rev().find(|n| !n.is_expired(now_ms))
    }

    pub fn all(&self) -> &[Notification] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_assigns_increasing_ids() {
        let mut center = NotificationCenter::new(10);
        let a = center.push(NotificationType::Info, "a", 0, None);
        let b = center.push(NotificationType::Info, "b", 0, None);
        assert!(b > a);
        assert_eq!(center.len(), 2);
    }

    #[test]
    fn oldest_is_dropped_when_full() {
        let mut center = NotificationCenter::new(2);
        center.push(NotificationType::Info, "one", 0, None);
        center.push(NotificationType::Info, "two", 0, None);
        center.push(NotificationType::Info, "three", 0, None);
        let bodies: Vec<&str> = center.all().iter().map(|n| n.body.as_str()).collect();
        assert_eq!(bodies, vec!["two", "three"]);
    }

    #[test]
    fn body_is_flattened_to_one_line() {
        let mut center = NotificationCenter::new(4);
        center.push(NotificationType::Error, "could not save\n  disk full", 0, None);
        assert_eq!(center.all()[0].body, "could not save disk full");
    }

    #[test]
    fn expired_entries_are_pruned() {
        let mut center = NotificationCenter::new(4);
        center.push(NotificationType::Warning, "short", 1_000, Some(500));
        center.push(NotificationType::Info, "sticky", 1_000, None);
        assert_eq!(center.latest(1_200).unwrap().body, "sticky");
        assert_eq!(center.prune(1_500), 1);
        assert_eq!(center.len(), 1);
    }

    #[test]
    fn latest_skips_expired() {
        let mut center = NotificationCenter::new(4);
        center.push(NotificationType::Info, "old", 0, None);
        center.push(NotificationType::Error, "new", 100, Some(50));
        assert_eq!(center.latest(120).unwrap().body, "new");
        assert_eq!(center.latest(200).unwrap().body, "old");
    }

    #[test]
    fn summary_has_label() {
        let mut center = NotificationCenter::new(4);
        center.push(NotificationType::Error, "disengage to reboot", 0, None);
        assert_eq!(center.all()[0].summary(), "[error] disengage to reboot");
    }
}
