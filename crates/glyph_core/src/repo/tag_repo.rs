//! Tag repository and note/tag association index.
//!
//! # Responsibility
//! - Own tag rows and `note_tag_links` rows (`NoteTagLink`).
//! - Resolve tag sets for one note or for every note at once.
//!
//! # Invariants
//! - Tag names are unique; duplicate inserts are dropped, not errored.
//! - `delete_tag` removes links before the tag row; the caller wraps both
//!   statements in one transaction.
//! - Tags are always ordered by `name COLLATE NOCASE, name, id`.

use crate::model::note::NoteId;
use crate::model::tag::{NoteTagLink, Tag, TagId};
use crate::repo::note_repo::{NoteRepository, SqliteNoteRepository};
use crate::repo::{normalize_tag_name, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;

const TAG_ORDER_SQL: &str = "ORDER BY t.name COLLATE NOCASE ASC, t.name ASC, t.id ASC";

/// Repository interface for tags and note/tag links.
pub trait TagRepository {
    /// Inserts a tag. Returns `None` when the name is already taken.
    fn insert_tag(&self, name: &str) -> RepoResult<Option<TagId>>;
    fn rename_tag(&self, id: TagId, name: &str) -> RepoResult<()>;
    /// Deletes one tag and its links. Returns `false` when nothing existed.
    fn delete_tag(&self, id: TagId) -> RepoResult<bool>;
    fn get_tag(&self, id: TagId) -> RepoResult<Option<Tag>>;
    fn find_tag_by_name(&self, name: &str) -> RepoResult<Option<Tag>>;
    fn list_tags(&self) -> RepoResult<Vec<Tag>>;
    /// Insert-or-replace of one link. Both sides must exist.
    fn attach_tag(&self, note_id: NoteId, tag_id: TagId) -> RepoResult<()>;
    /// Removes one link. Returns `false` when it did not exist.
    fn detach_tag(&self, link: NoteTagLink) -> RepoResult<bool>;
    /// Removes every link of a note. Returns the number of links removed.
    fn detach_all_tags(&self, note_id: NoteId) -> RepoResult<usize>;
    /// Raw link rows of one note, ordered by tag id.
    fn links_for_note(&self, note_id: NoteId) -> RepoResult<Vec<NoteTagLink>>;
    fn tags_for_note(&self, note_id: NoteId) -> RepoResult<Vec<Tag>>;
    /// Tag sets of every note that has at least one link.
    fn tags_by_note(&self) -> RepoResult<BTreeMap<NoteId, Vec<Tag>>>;
}

/// SQLite-backed tag repository.
///
/// Accepts a plain connection or an open `Transaction` (via deref).
pub struct SqliteTagRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTagRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn tag_exists(&self, id: TagId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM tags WHERE id = ?1);",
            [id.0],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl TagRepository for SqliteTagRepository<'_> {
    fn insert_tag(&self, name: &str) -> RepoResult<Option<TagId>> {
        let name = normalize_tag_name(name)?;
        let changed = self
            .conn
            .execute("INSERT OR IGNORE INTO tags (name) VALUES (?1);", [name])?;
        if changed == 0 {
            return Ok(None);
        }
        Ok(Some(TagId(self.conn.last_insert_rowid())))
    }

    fn rename_tag(&self, id: TagId, name: &str) -> RepoResult<()> {
        let name = normalize_tag_name(name)?;
        if let Some(existing) = self.find_tag_by_name(name)? {
            if existing.id != id {
                return Err(RepoError::DuplicateTagName(name.to_string()));
            }
        }

        let changed = self.conn.execute(
            "UPDATE tags SET name = ?2 WHERE id = ?1;",
            params![id.0, name],
        )?;
        if changed == 0 {
            return Err(RepoError::TagNotFound(id));
        }
        Ok(())
    }

    fn delete_tag(&self, id: TagId) -> RepoResult<bool> {
        self.conn
            .execute("DELETE FROM note_tag_links WHERE tag_id = ?1;", [id.0])?;
        let changed = self.conn.execute("DELETE FROM tags WHERE id = ?1;", [id.0])?;
        Ok(changed > 0)
    }

    fn get_tag(&self, id: TagId) -> RepoResult<Option<Tag>> {
        let tag = self
            .conn
            .query_row(
                "SELECT t.id, t.name FROM tags t WHERE t.id = ?1;",
                [id.0],
                parse_tag_row,
            )
            .optional()?;
        Ok(tag)
    }

    fn find_tag_by_name(&self, name: &str) -> RepoResult<Option<Tag>> {
        let tag = self
            .conn
            .query_row(
                "SELECT t.id, t.name FROM tags t WHERE t.name = ?1;",
                [name.trim()],
                parse_tag_row,
            )
            .optional()?;
        Ok(tag)
    }

    fn list_tags(&self) -> RepoResult<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT t.id, t.name FROM tags t {TAG_ORDER_SQL};"))?;
        let tags = stmt
            .query_map([], parse_tag_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    fn attach_tag(&self, note_id: NoteId, tag_id: TagId) -> RepoResult<()> {
        if !SqliteNoteRepository::new(self.conn).note_exists(note_id)? {
            return Err(RepoError::NoteNotFound(note_id));
        }
        if !self.tag_exists(tag_id)? {
            return Err(RepoError::TagNotFound(tag_id));
        }

        self.conn.execute(
            "INSERT OR REPLACE INTO note_tag_links (note_id, tag_id) VALUES (?1, ?2);",
            params![note_id.0, tag_id.0],
        )?;
        Ok(())
    }

    fn detach_tag(&self, link: NoteTagLink) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM note_tag_links WHERE note_id = ?1 AND tag_id = ?2;",
            params![link.note_id.0, link.tag_id.0],
        )?;
        Ok(changed > 0)
    }

    fn links_for_note(&self, note_id: NoteId) -> RepoResult<Vec<NoteTagLink>> {
        let mut stmt = self.conn.prepare(
            "SELECT note_id, tag_id FROM note_tag_links WHERE note_id = ?1 ORDER BY tag_id ASC;",
        )?;
        let links = stmt
            .query_map([note_id.0], |row| {
                Ok(NoteTagLink {
                    note_id: NoteId(row.get("note_id")?),
                    tag_id: TagId(row.get("tag_id")?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(links)
    }

    fn detach_all_tags(&self, note_id: NoteId) -> RepoResult<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM note_tag_links WHERE note_id = ?1;", [note_id.0])?;
        Ok(changed)
    }

    fn tags_for_note(&self, note_id: NoteId) -> RepoResult<Vec<Tag>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT t.id, t.name
             FROM note_tag_links l
             INNER JOIN tags t ON t.id = l.tag_id
             WHERE l.note_id = ?1
             {TAG_ORDER_SQL};"
        ))?;
        let tags = stmt
            .query_map([note_id.0], parse_tag_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    fn tags_by_note(&self) -> RepoResult<BTreeMap<NoteId, Vec<Tag>>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT l.note_id, t.id, t.name
             FROM note_tag_links l
             INNER JOIN tags t ON t.id = l.tag_id
             {TAG_ORDER_SQL};"
        ))?;
        let mut rows = stmt.query([])?;
        let mut grouped: BTreeMap<NoteId, Vec<Tag>> = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let note_id = NoteId(row.get("note_id")?);
            grouped.entry(note_id).or_default().push(parse_tag_row(row)?);
        }
        Ok(grouped)
    }
}

fn parse_tag_row(row: &Row<'_>) -> rusqlite::Result<Tag> {
    Ok(Tag {
        id: TagId(row.get("id")?),
        name: row.get("name")?,
    })
}

#[cfg(test)]
mod tests {
    use super::{SqliteTagRepository, TagRepository};
    use crate::db::open_db_in_memory;
    use crate::model::tag::{NoteTagLink, TagId};
    use crate::repo::note_repo::{NoteRepository, SqliteNoteRepository};
    use crate::repo::RepoError;

    #[test]
    fn duplicate_insert_is_dropped() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteTagRepository::new(&conn);
        let first = repo.insert_tag("Work").unwrap();
        assert!(first.is_some());
        assert_eq!(repo.insert_tag("Work").unwrap(), None);
        assert_eq!(repo.insert_tag("  Work  ").unwrap(), None);
        assert_eq!(repo.list_tags().unwrap().len(), 1);
    }

    #[test]
    fn list_tags_orders_case_insensitively() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteTagRepository::new(&conn);
        for name in ["beta", "Alpha", "gamma", "alpha"] {
            repo.insert_tag(name).unwrap();
        }
        let names: Vec<String> = repo
            .list_tags()
            .unwrap()
            .into_iter()
            .map(|tag| tag.name)
            .collect();
        assert_eq!(names, vec!["Alpha", "alpha", "beta", "gamma"]);
    }

    #[test]
    fn rename_rejects_names_owned_by_other_tags() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteTagRepository::new(&conn);
        let work = repo.insert_tag("Work").unwrap().unwrap();
        repo.insert_tag("Life").unwrap();

        let err = repo.rename_tag(work, "Life").unwrap_err();
        assert!(matches!(err, RepoError::DuplicateTagName(_)));

        repo.rename_tag(work, "Work").unwrap();
        repo.rename_tag(work, "Job").unwrap();
        assert_eq!(repo.get_tag(work).unwrap().unwrap().name, "Job");

        let missing = repo.rename_tag(TagId(999), "Other").unwrap_err();
        assert!(matches!(missing, RepoError::TagNotFound(TagId(999))));
    }

    #[test]
    fn attach_checks_both_sides() {
        let conn = open_db_in_memory().unwrap();
        let notes = SqliteNoteRepository::new(&conn);
        let tags = SqliteTagRepository::new(&conn);
        let note = notes.insert_note("n", "", 1).unwrap();
        let tag = tags.insert_tag("t").unwrap().unwrap();

        assert!(matches!(
            tags.attach_tag(note, TagId(77)),
            Err(RepoError::TagNotFound(TagId(77)))
        ));
        tags.attach_tag(note, tag).unwrap();
        tags.attach_tag(note, tag).unwrap();
        assert_eq!(tags.tags_for_note(note).unwrap().len(), 1);
        assert_eq!(tags.detach_all_tags(note).unwrap(), 1);
        assert!(tags.tags_for_note(note).unwrap().is_empty());
    }

    #[test]
    fn links_for_note_lists_and_detaches_single_links() {
        let conn = open_db_in_memory().unwrap();
        let notes = SqliteNoteRepository::new(&conn);
        let tags = SqliteTagRepository::new(&conn);
        let note = notes.insert_note("n", "", 1).unwrap();
        let other = notes.insert_note("o", "", 1).unwrap();
        let work = tags.insert_tag("Work").unwrap().unwrap();
        let life = tags.insert_tag("Life").unwrap().unwrap();
        tags.attach_tag(note, life).unwrap();
        tags.attach_tag(note, work).unwrap();
        tags.attach_tag(other, work).unwrap();

        let links = tags.links_for_note(note).unwrap();
        assert_eq!(
            links,
            vec![
                NoteTagLink { note_id: note, tag_id: work },
                NoteTagLink { note_id: note, tag_id: life },
            ]
        );

        assert!(tags.detach_tag(links[0]).unwrap());
        assert!(!tags.detach_tag(links[0]).unwrap());
        assert_eq!(
            tags.links_for_note(note).unwrap(),
            vec![NoteTagLink { note_id: note, tag_id: life }]
        );
        assert_eq!(tags.links_for_note(other).unwrap().len(), 1);
    }
}
