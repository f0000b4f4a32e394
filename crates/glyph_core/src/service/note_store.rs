//! Note/tag store facade.
//!
//! # Responsibility
//! - Expose every note, tag and association command/query of the core.
//! - Wrap each write in one `IMMEDIATE` transaction and republish live
//!   queries after commit.
//! - Translate repository errors into `StoreError` (kind + operation).
//!
//! # Invariants
//! - The store is the only writer of its connection.
//! - Live subscribers observe a write before the write call returns.
//! - Timestamps come from the injected `Clock`, never from SQLite.

use crate::config::StoreConfig;
use crate::db::open_location;
use crate::error::{ErrorKind, Operation, StoreError, StoreResult};
use crate::model::draft::NoteDraft;
use crate::model::note::{Note, NoteId};
use crate::model::tag::{NoteWithTags, Tag, TagId};
use crate::repo::note_repo::{NoteRepository, SqliteNoteRepository};
use crate::repo::read_model::{note_with_tags, notes_with_tags};
use crate::repo::tag_repo::{SqliteTagRepository, TagRepository};
use crate::repo::{RepoError, RepoResult};
use crate::search::tag_filter::filter_by_tags;
use crate::service::clock::{Clock, SystemClock};
use crate::service::live::{LiveRegistry, Subscription};
use crate::service::seed::seed_welcome_notes;
use log::{debug, error, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use std::time::Instant;

/// Synchronous note/tag store owning one SQLite connection.
///
/// Construct once with [`NoteStore::open`], share it through
/// [`crate::StoreHandle`] for async callers, and finish with
/// [`NoteStore::close`].
pub struct NoteStore {
    conn: Connection,
    clock: Box<dyn Clock>,
    live: LiveRegistry,
}

impl NoteStore {
    /// Opens the configured database using the system clock.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        Self::open_with_clock(config, Box::new(SystemClock))
    }

    /// Opens the configured database with a caller-supplied clock.
    pub fn open_with_clock(config: &StoreConfig, clock: Box<dyn Clock>) -> StoreResult<Self> {
        let opened = open_location(&config.database, config.busy_timeout())
            .map_err(|err| StoreError::new(Operation::Open, err.into()))?;
        let fresh = opened.is_fresh();
        let mut store = Self {
            conn: opened.conn,
            clock,
            live: LiveRegistry::new(config.subscription_grace()),
        };

        if fresh && config.seed_welcome_notes {
            let seeded = store.write(Operation::Open, |tx, now| seed_welcome_notes(tx, now))?;
            info!("event=store_seed module=store status=ok notes={seeded}");
        }

        Ok(store)
    }

    /// Closes the connection. Live subscriptions end with `None`.
    pub fn close(self) -> StoreResult<()> {
        let Self { conn, live, .. } = self;
        drop(live);
        conn.close()
            .map_err(|(_, err)| StoreError::new(Operation::Close, err.into()))?;
        info!("event=store_close module=store status=ok");
        Ok(())
    }

    /// Read-only access for diagnostics and integrity checks.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Number of live queries currently refreshed after writes.
    pub fn live_query_count(&self) -> usize {
        self.live.len()
    }

    // ---- notes ----

    /// Inserts a note stamped with the current time and returns its id.
    pub fn create_note(&mut self, title: &str, content: &str) -> StoreResult<NoteId> {
        self.write(Operation::CreateNote, |tx, now| {
            SqliteNoteRepository::new(tx).insert_note(title, content, now)
        })
    }

    /// Overwrites title/content and refreshes the timestamp.
    ///
    /// # Errors
    /// - `NotFound` when `id` does not exist.
    pub fn update_note(&mut self, id: NoteId, title: &str, content: &str) -> StoreResult<()> {
        self.write(Operation::UpdateNote, |tx, now| {
            SqliteNoteRepository::new(tx).update_note(id, title, content, now)
        })
    }

    /// Deletes a note and every link referencing it.
    ///
    /// Idempotent: returns `false` when the note did not exist.
    pub fn delete_note(&mut self, id: NoteId) -> StoreResult<bool> {
        self.write(Operation::DeleteNote, |tx, _| {
            SqliteNoteRepository::new(tx).delete_note(id)
        })
    }

    /// Deletes every note and link. Tags are kept.
    pub fn delete_all_notes(&mut self) -> StoreResult<usize> {
        self.write(Operation::DeleteAllNotes, |tx, _| {
            SqliteNoteRepository::new(tx).delete_all_notes()
        })
    }

    /// # Errors
    /// - `NotFound` when `id` does not exist.
    pub fn get_note(&self, id: NoteId) -> StoreResult<Note> {
        self.read(Operation::GetNote, |conn| {
            SqliteNoteRepository::new(conn)
                .get_note(id)?
                .ok_or(RepoError::NoteNotFound(id))
        })
    }

    /// All notes, newest first; ties by ascending id.
    pub fn list_notes(&self) -> StoreResult<Vec<Note>> {
        self.read(Operation::ListNotes, |conn| {
            SqliteNoteRepository::new(conn).list_notes()
        })
    }

    /// Case-insensitive substring search over title or content.
    ///
    /// The empty query returns the same result as [`NoteStore::list_notes`].
    /// Whitespace in the query is significant.
    pub fn search(&self, query: &str) -> StoreResult<Vec<Note>> {
        self.read(Operation::Search, |conn| {
            SqliteNoteRepository::new(conn).search_notes(query)
        })
    }

    /// Highest currently assigned note id.
    ///
    /// Advisory only: a concurrent create can take the next id. Editors should
    /// use [`NoteDraft`] with [`NoteStore::save_note`] instead of predicting.
    pub fn last_id(&self) -> StoreResult<Option<NoteId>> {
        self.read(Operation::LastId, |conn| {
            SqliteNoteRepository::new(conn).last_note_id()
        })
    }

    /// Persists an editor draft together with its full tag set.
    ///
    /// Creates the note when the draft is new (blank fields included),
    /// otherwise updates it; then makes its links match the draft's tags,
    /// detaching dropped tags and attaching new ones. Everything runs
    /// in one transaction. On success the draft is bound to the saved id.
    ///
    /// # Errors
    /// - `NotFound` when the draft's note or one of its tags was deleted.
    pub fn save_note(&mut self, draft: &mut NoteDraft) -> StoreResult<NoteWithTags> {
        let saved = self.write(Operation::SaveNote, |tx, now| {
            let notes = SqliteNoteRepository::new(tx);
            let id = match draft.id() {
                Some(id) => {
                    notes.update_note(id, draft.title(), draft.content(), now)?;
                    id
                }
                None => notes.insert_note(draft.title(), draft.content(), now)?,
            };

            let tags = SqliteTagRepository::new(tx);
            let wanted: BTreeSet<TagId> = draft.tag_ids().collect();
            let mut kept = BTreeSet::new();
            for link in tags.links_for_note(id)? {
                if wanted.contains(&link.tag_id) {
                    kept.insert(link.tag_id);
                } else {
                    tags.detach_tag(link)?;
                }
            }
            for tag_id in wanted.difference(&kept) {
                tags.attach_tag(id, *tag_id)?;
            }

            note_with_tags(tx, id)?.ok_or(RepoError::NoteNotFound(id))
        })?;
        draft.bind(&saved);
        Ok(saved)
    }

    // ---- tags ----

    /// Creates a tag. Returns `None` when the name already exists; use
    /// [`NoteStore::find_tag_by_name`] to get the existing id.
    ///
    /// # Errors
    /// - `InvalidInput` for blank names.
    pub fn create_tag(&mut self, name: &str) -> StoreResult<Option<TagId>> {
        self.write(Operation::CreateTag, |tx, _| {
            SqliteTagRepository::new(tx).insert_tag(name)
        })
    }

    /// # Errors
    /// - `NotFound` when `id` does not exist.
    /// - `ConstraintViolation` when another tag already uses `name`.
    pub fn rename_tag(&mut self, id: TagId, name: &str) -> StoreResult<()> {
        self.write(Operation::RenameTag, |tx, _| {
            SqliteTagRepository::new(tx).rename_tag(id, name)
        })
    }

    /// Deletes a tag and, atomically, every link referencing it.
    ///
    /// Idempotent: returns `false` when the tag did not exist.
    pub fn delete_tag(&mut self, id: TagId) -> StoreResult<bool> {
        self.write(Operation::DeleteTag, |tx, _| {
            SqliteTagRepository::new(tx).delete_tag(id)
        })
    }

    /// All tags ordered by name, case-insensitively.
    pub fn list_tags(&self) -> StoreResult<Vec<Tag>> {
        self.read(Operation::ListTags, |conn| {
            SqliteTagRepository::new(conn).list_tags()
        })
    }

    pub fn find_tag_by_name(&self, name: &str) -> StoreResult<Option<Tag>> {
        self.read(Operation::FindTagByName, |conn| {
            SqliteTagRepository::new(conn).find_tag_by_name(name)
        })
    }

    /// Links a tag to a note. Attaching an existing pair is a no-op.
    ///
    /// # Errors
    /// - `NotFound` when the note or the tag does not exist.
    pub fn attach_tag(&mut self, note_id: NoteId, tag_id: TagId) -> StoreResult<()> {
        self.write(Operation::AttachTag, |tx, _| {
            SqliteTagRepository::new(tx).attach_tag(note_id, tag_id)
        })
    }

    /// Removes every link of a note and returns how many were removed.
    pub fn detach_all_tags(&mut self, note_id: NoteId) -> StoreResult<usize> {
        self.write(Operation::DetachAllTags, |tx, _| {
            SqliteTagRepository::new(tx).detach_all_tags(note_id)
        })
    }

    /// # Errors
    /// - `NotFound` when `id` does not exist.
    pub fn get_note_with_tags(&self, id: NoteId) -> StoreResult<NoteWithTags> {
        self.read(Operation::GetNoteWithTags, |conn| {
            note_with_tags(conn, id)?.ok_or(RepoError::NoteNotFound(id))
        })
    }

    /// Every note with its tags, ordered like [`NoteStore::list_notes`].
    pub fn list_notes_with_tags(&self) -> StoreResult<Vec<NoteWithTags>> {
        self.read(Operation::ListNotesWithTags, notes_with_tags)
    }

    /// Notes carrying every tag in `selected` (AND filter).
    pub fn list_notes_with_all_tags(
        &self,
        selected: &BTreeSet<TagId>,
    ) -> StoreResult<Vec<NoteWithTags>> {
        self.read(Operation::FilterByTags, |conn| {
            Ok(filter_by_tags(notes_with_tags(conn)?, selected))
        })
    }

    // ---- live queries ----

    pub fn subscribe_notes(&mut self) -> StoreResult<Subscription<Vec<Note>>> {
        self.live
            .subscribe_notes(&self.conn, Instant::now())
            .map_err(|err| failed(Operation::Subscribe, Instant::now(), err))
    }

    pub fn subscribe_notes_with_tags(&mut self) -> StoreResult<Subscription<Vec<NoteWithTags>>> {
        self.live
            .subscribe_notes_with_tags(&self.conn, Instant::now())
            .map_err(|err| failed(Operation::Subscribe, Instant::now(), err))
    }

    pub fn subscribe_tags(&mut self) -> StoreResult<Subscription<Vec<Tag>>> {
        self.live
            .subscribe_tags(&self.conn, Instant::now())
            .map_err(|err| failed(Operation::Subscribe, Instant::now(), err))
    }

    /// Live search results; queries are keyed by their exact text.
    pub fn subscribe_search(&mut self, query: &str) -> StoreResult<Subscription<Vec<Note>>> {
        self.live
            .subscribe_search(&self.conn, Instant::now(), query)
            .map_err(|err| failed(Operation::Subscribe, Instant::now(), err))
    }

    /// Live view of one note; the snapshot becomes `None` once it is deleted.
    pub fn subscribe_note_with_tags(
        &mut self,
        id: NoteId,
    ) -> StoreResult<Subscription<Option<NoteWithTags>>> {
        self.live
            .subscribe_note_with_tags(&self.conn, Instant::now(), id)
            .map_err(|err| failed(Operation::Subscribe, Instant::now(), err))
    }

    fn write<T>(
        &mut self,
        operation: Operation,
        apply: impl FnOnce(&Transaction<'_>, i64) -> RepoResult<T>,
    ) -> StoreResult<T> {
        let started_at = Instant::now();
        let now_ms = self.clock.now_ms();
        match in_transaction(&mut self.conn, now_ms, apply) {
            Ok(value) => {
                self.live.refresh(&self.conn, Instant::now());
                info!(
                    "event={operation} module=store status=ok duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => Err(failed(operation, started_at, err)),
        }
    }

    fn read<T>(
        &self,
        operation: Operation,
        query: impl FnOnce(&Connection) -> RepoResult<T>,
    ) -> StoreResult<T> {
        let started_at = Instant::now();
        match query(&self.conn) {
            Ok(value) => {
                debug!(
                    "event={operation} module=store status=ok duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => Err(failed(operation, started_at, err)),
        }
    }
}

fn in_transaction<T>(
    conn: &mut Connection,
    now_ms: i64,
    apply: impl FnOnce(&Transaction<'_>, i64) -> RepoResult<T>,
) -> RepoResult<T> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let value = apply(&tx, now_ms)?;
    tx.commit()?;
    Ok(value)
}

// Error text is logged only for storage failures; other kinds can echo
// user-entered names.
fn failed(operation: Operation, started_at: Instant, err: RepoError) -> StoreError {
    let err = StoreError::new(operation, err);
    let duration_ms = started_at.elapsed().as_millis();
    match err.kind() {
        ErrorKind::StorageUnavailable => error!(
            "event={operation} module=store status=error kind={} duration_ms={duration_ms} error={}",
            err.kind(),
            err.repo_error()
        ),
        kind => warn!(
            "event={operation} module=store status=error kind={kind} duration_ms={duration_ms}"
        ),
    }
    err
}
