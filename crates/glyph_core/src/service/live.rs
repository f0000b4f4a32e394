//! Live query subscriptions.
//!
//! # Responsibility
//! - Keep one `watch` channel per subscribed query shape holding the latest
//!   full snapshot.
//! - Republish snapshots after every committed write.
//! - Tear down queries whose last subscriber left longer than the grace
//!   period ago.
//!
//! # Invariants
//! - Teardown is lazy: it happens on the next subscribe or refresh, never on
//!   a timer.
//! - A failed refresh keeps the previous snapshot and leaves the channel open.
//! - Subscribers are only woken when the snapshot actually changed.

use crate::model::note::{Note, NoteId};
use crate::model::tag::{NoteWithTags, Tag};
use crate::repo::note_repo::{NoteRepository, SqliteNoteRepository};
use crate::repo::read_model::{note_with_tags, notes_with_tags};
use crate::repo::tag_repo::{SqliteTagRepository, TagRepository};
use crate::repo::RepoResult;
use log::{debug, warn};
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Receiving side of a live query.
///
/// Dropping every `Subscription` of a query starts its grace period.
#[derive(Debug, Clone)]
pub struct Subscription<T> {
    // Declared before `receiver` so the departure is stamped before the
    // receiver count drops.
    _presence: Arc<Presence>,
    receiver: watch::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    fn new(receiver: watch::Receiver<T>, left_at: &Arc<Mutex<Option<Instant>>>) -> Self {
        Self {
            _presence: Arc::new(Presence {
                left_at: Arc::clone(left_at),
            }),
            receiver,
        }
    }

    /// Latest published snapshot, without marking it as seen.
    pub fn snapshot(&self) -> T {
        self.receiver.borrow().clone()
    }

    /// `true` when a snapshot newer than the last seen one is available.
    pub fn has_changed(&self) -> bool {
        self.receiver.has_changed().unwrap_or(false)
    }

    /// Returns the new snapshot if one arrived since the last call, without
    /// waiting.
    pub fn try_next(&mut self) -> Option<T> {
        if !self.has_changed() {
            return None;
        }
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Waits for the next snapshot. Returns `None` once the store is closed.
    pub async fn changed(&mut self) -> Option<T> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }
}

/// Stamps the slot's departure time when the last clone of one
/// subscription is dropped.
#[derive(Debug)]
struct Presence {
    left_at: Arc<Mutex<Option<Instant>>>,
}

impl Drop for Presence {
    fn drop(&mut self) {
        if let Ok(mut left_at) = self.left_at.lock() {
            *left_at = Some(Instant::now());
        }
    }
}

struct LiveSlot<T> {
    sender: watch::Sender<T>,
    left_at: Arc<Mutex<Option<Instant>>>,
}

impl<T> LiveSlot<T> {
    /// When the last subscriber left, or `None` while someone is subscribed.
    fn idle_since(&self, now: Instant) -> Option<Instant> {
        if self.sender.receiver_count() > 0 {
            return None;
        }
        let left_at = self.left_at.lock().ok().and_then(|left_at| *left_at);
        Some(left_at.unwrap_or(now))
    }
}

/// All live queries of one shape, keyed by query parameters.
struct LiveQueries<K, T> {
    shape: &'static str,
    slots: BTreeMap<K, LiveSlot<T>>,
}

impl<K, T> LiveQueries<K, T>
where
    K: Ord + Clone + std::fmt::Debug,
    T: Clone + PartialEq,
{
    fn new(shape: &'static str) -> Self {
        Self {
            shape,
            slots: BTreeMap::new(),
        }
    }

    fn len(&self) -> usize {
        self.slots.len()
    }

    fn subscribe(
        &mut self,
        key: K,
        now: Instant,
        grace: Duration,
        load: impl FnOnce(&K) -> RepoResult<T>,
    ) -> RepoResult<Subscription<T>> {
        self.sweep(now, grace);
        if let Some(slot) = self.slots.get(&key) {
            return Ok(Subscription::new(slot.sender.subscribe(), &slot.left_at));
        }

        let snapshot = load(&key)?;
        let (sender, receiver) = watch::channel(snapshot);
        let left_at = Arc::new(Mutex::new(None));
        let subscription = Subscription::new(receiver, &left_at);
        debug!(
            "event=live_query_start module=live status=ok shape={} key={:?}",
            self.shape, key
        );
        self.slots.insert(key, LiveSlot { sender, left_at });
        Ok(subscription)
    }

    /// Drops slots whose last subscriber left `grace` or longer ago.
    fn sweep(&mut self, now: Instant, grace: Duration) {
        let shape = self.shape;
        self.slots.retain(|key, slot| {
            let Some(idle_since) = slot.idle_since(now) else {
                return true;
            };
            let keep = now.saturating_duration_since(idle_since) < grace;
            if !keep {
                debug!("event=live_query_stop module=live status=ok shape={shape} key={key:?}");
            }
            keep
        });
    }

    fn refresh(&mut self, now: Instant, grace: Duration, mut load: impl FnMut(&K) -> RepoResult<T>) {
        self.sweep(now, grace);
        for (key, slot) in &self.slots {
            match load(key) {
                Ok(snapshot) => {
                    slot.sender.send_if_modified(|current| {
                        if *current == snapshot {
                            return false;
                        }
                        *current = snapshot;
                        true
                    });
                }
                Err(err) => warn!(
                    "event=live_query_refresh module=live status=error shape={} key={:?} error={}",
                    self.shape, key, err
                ),
            }
        }
    }
}

/// Registry of every live query shape the store serves.
pub(crate) struct LiveRegistry {
    grace: Duration,
    notes: LiveQueries<(), Vec<Note>>,
    notes_with_tags: LiveQueries<(), Vec<NoteWithTags>>,
    tags: LiveQueries<(), Vec<Tag>>,
    search: LiveQueries<String, Vec<Note>>,
    note_with_tags: LiveQueries<NoteId, Option<NoteWithTags>>,
}

impl LiveRegistry {
    pub(crate) fn new(grace: Duration) -> Self {
        Self {
            grace,
            notes: LiveQueries::new("notes"),
            notes_with_tags: LiveQueries::new("notes_with_tags"),
            tags: LiveQueries::new("tags"),
            search: LiveQueries::new("search"),
            note_with_tags: LiveQueries::new("note_with_tags"),
        }
    }

    /// Number of live (subscribed or in-grace) queries across all shapes.
    pub(crate) fn len(&self) -> usize {
        self.notes.len()
            + self.notes_with_tags.len()
            + self.tags.len()
            + self.search.len()
            + self.note_with_tags.len()
    }

    pub(crate) fn subscribe_notes(
        &mut self,
        conn: &Connection,
        now: Instant,
    ) -> RepoResult<Subscription<Vec<Note>>> {
        self.notes.subscribe((), now, self.grace, |_| {
            SqliteNoteRepository::new(conn).list_notes()
        })
    }

    pub(crate) fn subscribe_notes_with_tags(
        &mut self,
        conn: &Connection,
        now: Instant,
    ) -> RepoResult<Subscription<Vec<NoteWithTags>>> {
        self.notes_with_tags
            .subscribe((), now, self.grace, |_| notes_with_tags(conn))
    }

    pub(crate) fn subscribe_tags(
        &mut self,
        conn: &Connection,
        now: Instant,
    ) -> RepoResult<Subscription<Vec<Tag>>> {
        self.tags.subscribe((), now, self.grace, |_| {
            SqliteTagRepository::new(conn).list_tags()
        })
    }

    pub(crate) fn subscribe_search(
        &mut self,
        conn: &Connection,
        now: Instant,
        query: &str,
    ) -> RepoResult<Subscription<Vec<Note>>> {
        self.search.subscribe(query.to_string(), now, self.grace, |key| {
            SqliteNoteRepository::new(conn).search_notes(key)
        })
    }

    pub(crate) fn subscribe_note_with_tags(
        &mut self,
        conn: &Connection,
        now: Instant,
        id: NoteId,
    ) -> RepoResult<Subscription<Option<NoteWithTags>>> {
        self.note_with_tags
            .subscribe(id, now, self.grace, |key| note_with_tags(conn, *key))
    }

    /// Recomputes every live query against the committed state.
    pub(crate) fn refresh(&mut self, conn: &Connection, now: Instant) {
        let grace = self.grace;
        self.notes.refresh(now, grace, |_| {
            SqliteNoteRepository::new(conn).list_notes()
        });
        self.notes_with_tags
            .refresh(now, grace, |_| notes_with_tags(conn));
        self.tags.refresh(now, grace, |_| {
            SqliteTagRepository::new(conn).list_tags()
        });
        self.search.refresh(now, grace, |key| {
            SqliteNoteRepository::new(conn).search_notes(key)
        });
        self.note_with_tags
            .refresh(now, grace, |key| note_with_tags(conn, *key));
    }
}

#[cfg(test)]
mod tests {
    use super::LiveQueries;
    use crate::repo::RepoError;
    use std::time::{Duration, Instant};

    const GRACE: Duration = Duration::from_secs(5);

    #[test]
    fn refresh_publishes_only_changed_snapshots() {
        let mut queries: LiveQueries<(), u32> = LiveQueries::new("counter");
        let now = Instant::now();
        let mut sub = queries.subscribe((), now, GRACE, |_| Ok(1)).unwrap();
        assert_eq!(sub.snapshot(), 1);
        assert!(!sub.has_changed());

        queries.refresh(now, GRACE, |_| Ok(1));
        assert!(sub.try_next().is_none());

        queries.refresh(now, GRACE, |_| Ok(2));
        assert_eq!(sub.try_next(), Some(2));
        assert!(sub.try_next().is_none());
    }

    #[test]
    fn failed_refresh_keeps_previous_snapshot_and_channel() {
        let mut queries: LiveQueries<(), u32> = LiveQueries::new("counter");
        let now = Instant::now();
        let mut sub = queries.subscribe((), now, GRACE, |_| Ok(1)).unwrap();

        queries.refresh(now, GRACE, |_| Err(RepoError::Unavailable("disk".to_string())));
        assert_eq!(sub.snapshot(), 1);
        assert_eq!(queries.len(), 1);

        queries.refresh(now, GRACE, |_| Ok(3));
        assert_eq!(sub.try_next(), Some(3));
    }

    #[test]
    fn idle_query_survives_grace_then_is_torn_down() {
        let mut queries: LiveQueries<(), u32> = LiveQueries::new("counter");
        let sub = queries.subscribe((), Instant::now(), GRACE, |_| Ok(1)).unwrap();
        drop(sub);
        let dropped = Instant::now();

        queries.refresh(dropped, GRACE, |_| Ok(2));
        assert_eq!(queries.len(), 1);

        queries.refresh(dropped + Duration::from_secs(1), GRACE, |_| Ok(3));
        assert_eq!(queries.len(), 1);

        queries.refresh(dropped + GRACE, GRACE, |_| Ok(4));
        assert_eq!(queries.len(), 0);
    }

    #[test]
    fn grace_is_measured_from_the_drop_not_the_next_sweep() {
        let mut queries: LiveQueries<(), u32> = LiveQueries::new("counter");
        let sub = queries.subscribe((), Instant::now(), GRACE, |_| Ok(1)).unwrap();
        drop(sub);
        let dropped = Instant::now();

        queries.refresh(dropped + GRACE + Duration::from_secs(1), GRACE, |_| {
            panic!("expired live query should not be refreshed")
        });
        assert_eq!(queries.len(), 0);
    }

    #[test]
    fn grace_starts_when_the_last_clone_is_dropped() {
        let mut queries: LiveQueries<(), u32> = LiveQueries::new("counter");
        let sub = queries.subscribe((), Instant::now(), GRACE, |_| Ok(1)).unwrap();
        let clone = sub.clone();
        drop(sub);

        queries.refresh(Instant::now() + GRACE * 2, GRACE, |_| Ok(2));
        assert_eq!(queries.len(), 1);
        assert_eq!(clone.snapshot(), 2);
    }

    #[test]
    fn resubscribe_within_grace_reuses_current_snapshot() {
        let mut queries: LiveQueries<(), u32> = LiveQueries::new("counter");
        let start = Instant::now();
        drop(queries.subscribe((), start, GRACE, |_| Ok(1)).unwrap());
        queries.refresh(start, GRACE, |_| Ok(2));

        let sub = queries
            .subscribe((), start + Duration::from_secs(1), GRACE, |_| {
                panic!("live query should be reused")
            })
            .unwrap();
        assert_eq!(sub.snapshot(), 2);
        assert_eq!(queries.len(), 1);
    }

    #[test]
    fn keys_are_independent() {
        let mut queries: LiveQueries<String, usize> = LiveQueries::new("search");
        let now = Instant::now();
        let mut short = queries
            .subscribe("a".to_string(), now, GRACE, |key| Ok(key.len()))
            .unwrap();
        let long = queries
            .subscribe("abc".to_string(), now, GRACE, |key| Ok(key.len()))
            .unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(short.snapshot(), 1);
        assert_eq!(long.snapshot(), 3);

        queries.refresh(now, GRACE, |key| Ok(key.len() * 10));
        assert_eq!(short.try_next(), Some(10));
        assert_eq!(long.snapshot(), 30);
    }
}
