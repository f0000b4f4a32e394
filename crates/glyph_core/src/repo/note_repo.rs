//! Note repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide note CRUD, ordered listing and substring search over `notes`.
//!   Search filters the ordered listing with `Note::matches_text` so case
//!   folding is Unicode-aware, which SQLite `LIKE` is not.
//! - Remove a note's links together with the note itself.
//!
//! # Invariants
//! - Note lists are always sorted by `timestamp DESC, id ASC`.
//! - `delete_note` removes `note_tag_links` rows before the parent row; the
//!   caller wraps both statements in one transaction.
//! - Ids come from `AUTOINCREMENT` and are never reused.

use crate::model::note::{Note, NoteId};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const NOTE_SELECT_SQL: &str = "SELECT id, title, content, timestamp FROM notes";
const NOTE_ORDER_SQL: &str = "ORDER BY timestamp DESC, id ASC";

/// Repository interface for note operations.
pub trait NoteRepository {
    /// Inserts one note and returns its store-assigned id.
    fn insert_note(&self, title: &str, content: &str, timestamp: i64) -> RepoResult<NoteId>;
    /// Overwrites title/content and refreshes the timestamp.
    fn update_note(&self, id: NoteId, title: &str, content: &str, timestamp: i64)
        -> RepoResult<()>;
    /// Deletes one note and its links. Returns `false` when nothing existed.
    fn delete_note(&self, id: NoteId) -> RepoResult<bool>;
    /// Deletes every note and link. Returns the number of notes removed.
    fn delete_all_notes(&self) -> RepoResult<usize>;
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    fn note_exists(&self, id: NoteId) -> RepoResult<bool>;
    fn list_notes(&self) -> RepoResult<Vec<Note>>;
    /// Case-insensitive substring search over title or content.
    /// Only the empty query matches every note.
    fn search_notes(&self, query: &str) -> RepoResult<Vec<Note>>;
    /// Highest currently assigned note id.
    fn last_note_id(&self) -> RepoResult<Option<NoteId>>;
}

/// SQLite-backed note repository.
///
/// Accepts a plain connection or an open `Transaction` (via deref).
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn insert_note(&self, title: &str, content: &str, timestamp: i64) -> RepoResult<NoteId> {
        self.conn.execute(
            "INSERT INTO notes (title, content, timestamp) VALUES (?1, ?2, ?3);",
            params![title, content, timestamp],
        )?;
        Ok(NoteId(self.conn.last_insert_rowid()))
    }

    fn update_note(
        &self,
        id: NoteId,
        title: &str,
        content: &str,
        timestamp: i64,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notes
             SET
                title = ?2,
                content = ?3,
                timestamp = ?4
             WHERE id = ?1;",
            params![id.0, title, content, timestamp],
        )?;

        if changed == 0 {
            return Err(RepoError::NoteNotFound(id));
        }

        Ok(())
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<bool> {
        self.conn
            .execute("DELETE FROM note_tag_links WHERE note_id = ?1;", [id.0])?;
        let changed = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?1;", [id.0])?;
        Ok(changed > 0)
    }

    fn delete_all_notes(&self) -> RepoResult<usize> {
        self.conn.execute("DELETE FROM note_tag_links;", [])?;
        let changed = self.conn.execute("DELETE FROM notes;", [])?;
        Ok(changed)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let note = self
            .conn
            .query_row(
                &format!("{NOTE_SELECT_SQL} WHERE id = ?1;"),
                [id.0],
                parse_note_row,
            )
            .optional()?;
        Ok(note)
    }

    fn note_exists(&self, id: NoteId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM notes WHERE id = ?1);",
            [id.0],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTE_SELECT_SQL} {NOTE_ORDER_SQL};"))?;
        let notes = stmt
            .query_map([], parse_note_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notes)
    }

    fn search_notes(&self, query: &str) -> RepoResult<Vec<Note>> {
        let notes = self.list_notes()?;
        if query.is_empty() {
            return Ok(notes);
        }
        Ok(notes
            .into_iter()
            .filter(|note| note.matches_text(query))
            .collect())
    }

    fn last_note_id(&self) -> RepoResult<Option<NoteId>> {
        let id: Option<i64> = self
            .conn
            .query_row("SELECT MAX(id) FROM notes;", [], |row| row.get(0))?;
        Ok(id.map(NoteId))
    }
}

fn parse_note_row(row: &Row<'_>) -> rusqlite::Result<Note> {
    Ok(Note {
        id: NoteId(row.get("id")?),
        title: row.get("title")?,
        content: row.get("content")?,
        timestamp: row.get("timestamp")?,
    })
}
