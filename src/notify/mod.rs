//! Transient notification queue.
//!
//! Push events become short-lived, user-dismissable entries rendered as a
//! capped stack. Newest first; pushing past the cap drops the oldest entry
//! together with its expiry deadline, so there is never a timer referencing
//! a missing entry. Expiry is a fixed timeout from creation, not renewed.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::services::time_source::SharedTimeSource;

/// Unique, monotonic notification id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(u64);

/// Notification category; decides styling and default TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Ephemeral connectivity notices (short TTL).
    Connectivity,
    /// A new record arrived.
    Insert,
    /// An existing record changed.
    Update,
    /// Something the user should read (longest TTL).
    Alert,
}

impl NotificationKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            NotificationKind::Connectivity => "~",
            NotificationKind::Insert => "+",
            NotificationKind::Update => "*",
            NotificationKind::Alert => "!",
        }
    }
}

/// One entry in the stack. The expiry deadline lives inside the entry, so
/// dropping the entry is also the cancellation of its timer.
#[derive(Debug, Clone)]
pub struct NotificationEntry {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Wall-clock creation time, for display.
    pub created_at: DateTime<Local>,
    pub ttl: Duration,
    expires_at: Instant,
}

/// Bounded, insertion-ordered, self-expiring notification collection.
pub struct NotificationQueue {
    time: SharedTimeSource,
    entries: VecDeque<NotificationEntry>,
    cap: usize,
    next_id: u64,
}

impl NotificationQueue {
    pub fn new(time: SharedTimeSource, cap: usize) -> Self {
        Self {
            time,
            entries: VecDeque::new(),
            cap,
            next_id: 0,
        }
    }

    /// Prepend a new entry. If the queue exceeds the cap the oldest entry is
    /// dropped immediately, expiry timer and all, independent of its TTL.
    pub fn push(
        &mut self,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        ttl: Duration,
    ) -> NotificationId {
        self.next_id += 1;
        let id = NotificationId(self.next_id);
        let entry = NotificationEntry {
            id,
            kind,
            title: title.into(),
            message: message.into(),
            created_at: Local::now(),
            ttl,
            expires_at: self.time.deadline_in(ttl),
        };
        self.entries.push_front(entry);

        while self.entries.len() > self.cap {
            if let Some(dropped) = self.entries.pop_back() {
                tracing::debug!(id = dropped.id.0, "Notification dropped by cap");
            }
        }
        id
    }

    /// Remove an entry immediately. Removing an absent (already expired or
    /// dismissed) id is a no-op, not an error.
    pub fn dismiss(&mut self, id: NotificationId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Dismiss the newest entry, if any.
    pub fn dismiss_front(&mut self) -> Option<NotificationId> {
        self.entries.pop_front().map(|e| e.id)
    }

    /// Drop entries whose deadline has passed. Returns the expired ids.
    pub fn tick(&mut self) -> Vec<NotificationId> {
        let now = self.time.now();
        let mut expired = Vec::new();
        self.entries.retain(|e| {
            if now >= e.expires_at {
                expired.push(e.id);
                false
            } else {
                true
            }
        });
        expired
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &NotificationEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::time_source::TestTimeSource;
    use std::sync::Arc;

    const TTL: Duration = Duration::from_millis(8_000);

    fn queue(cap: usize) -> (NotificationQueue, Arc<TestTimeSource>) {
        let time = TestTimeSource::shared();
        let queue = NotificationQueue::new(time.clone(), cap);
        (queue, time)
    }

    #[test]
    fn push_orders_newest_first() {
        let (mut q, _) = queue(5);
        q.push(NotificationKind::Insert, "first", "", TTL);
        q.push(NotificationKind::Insert, "second", "", TTL);

        let titles: Vec<_> = q.entries().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[test]
    fn cap_drops_oldest() {
        let (mut q, _) = queue(5);
        for i in 0..6 {
            q.push(NotificationKind::Insert, format!("n{i}"), "", TTL);
        }
        assert_eq!(q.len(), 5);
        let titles: Vec<_> = q.entries().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["n5", "n4", "n3", "n2", "n1"]);
    }

    #[test]
    fn dropped_entry_timer_cannot_resurface() {
        let (mut q, time) = queue(2);
        let first = q.push(NotificationKind::Insert, "a", "", TTL);
        q.push(NotificationKind::Insert, "b", "", TTL);
        q.push(NotificationKind::Insert, "c", "", TTL); // drops "a"

        // When "a"'s deadline passes, tick must not report it: its timer
        // went with the entry.
        time.advance(TTL + Duration::from_secs(1));
        let expired = q.tick();
        assert!(!expired.contains(&first));
        assert_eq!(expired.len(), 2);
        assert!(q.is_empty());
    }

    #[test]
    fn entries_expire_independently() {
        let (mut q, time) = queue(5);
        let short = q.push(
            NotificationKind::Connectivity,
            "net",
            "",
            Duration::from_millis(5_000),
        );
        time.advance(Duration::from_millis(2_000));
        let long = q.push(NotificationKind::Alert, "alert", "", Duration::from_millis(10_000));

        time.advance(Duration::from_millis(3_000)); // t=5s: short is due
        assert_eq!(q.tick(), vec![short]);
        assert_eq!(q.len(), 1);

        time.advance(Duration::from_millis(7_000)); // t=12s: long is due
        assert_eq!(q.tick(), vec![long]);
        assert!(q.is_empty());
    }

    #[test]
    fn dismiss_then_expiry_is_a_noop() {
        let (mut q, time) = queue(5);
        let id = q.push(NotificationKind::Update, "x", "", TTL);
        assert!(q.dismiss(id));

        // The deadline passing afterwards removes nothing and reports
        // nothing: no double-remove.
        time.advance(TTL + Duration::from_secs(1));
        assert!(q.tick().is_empty());
        assert!(!q.dismiss(id));
    }

    #[test]
    fn expiry_then_dismiss_is_a_noop() {
        let (mut q, time) = queue(5);
        let id = q.push(NotificationKind::Update, "x", "", TTL);
        time.advance(TTL);
        assert_eq!(q.tick(), vec![id]);
        assert!(!q.dismiss(id));
    }

    #[test]
    fn dismiss_front_removes_newest() {
        let (mut q, _) = queue(5);
        q.push(NotificationKind::Insert, "old", "", TTL);
        let newest = q.push(NotificationKind::Insert, "new", "", TTL);
        assert_eq!(q.dismiss_front(), Some(newest));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn ids_are_monotonic() {
        let (mut q, _) = queue(5);
        let a = q.push(NotificationKind::Insert, "a", "", TTL);
        let b = q.push(NotificationKind::Insert, "b", "", TTL);
        assert!(b > a);
    }
}
