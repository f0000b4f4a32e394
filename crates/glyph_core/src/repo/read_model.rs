//! `NoteWithTags` assembly over the note and tag repositories.

use crate::model::note::NoteId;
use crate::model::tag::NoteWithTags;
use crate::repo::note_repo::{NoteRepository, SqliteNoteRepository};
use crate::repo::tag_repo::{SqliteTagRepository, TagRepository};
use crate::repo::RepoResult;
use rusqlite::Connection;

/// Joins one note with its tags. `None` when the note does not exist.
pub fn note_with_tags(conn: &Connection, id: NoteId) -> RepoResult<Option<NoteWithTags>> {
    let Some(note) = SqliteNoteRepository::new(conn).get_note(id)? else {
        return Ok(None);
    };
    let tags = SqliteTagRepository::new(conn).tags_for_note(id)?;
    Ok(Some(NoteWithTags { note, tags }))
}

/// Every note with its tags, ordered like `list_notes`.
pub fn notes_with_tags(conn: &Connection) -> RepoResult<Vec<NoteWithTags>> {
    let notes = SqliteNoteRepository::new(conn).list_notes()?;
    let mut tags_by_note = SqliteTagRepository::new(conn).tags_by_note()?;
    Ok(notes
        .into_iter()
        .map(|note| {
            let tags = tags_by_note.remove(&note.id).unwrap_or_default();
            NoteWithTags { note, tags }
        })
        .collect())
}
