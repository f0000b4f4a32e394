//! Editor-side note handle.
//!
//! A draft is the UI's working copy of a note. A new draft has no id and no
//! row; it becomes a real note on its first `save_note`, so callers never
//! have to guess the next id before the note exists.

use crate::model::note::NoteId;
use crate::model::tag::{NoteWithTags, Tag, TagId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDraft {
    id: Option<NoteId>,
    title: String,
    content: String,
    tags: Vec<Tag>,
}

impl NoteDraft {
    /// Blank draft for a note that does not exist yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Draft pre-filled from a stored note and its tags.
    pub fn from_existing(existing: &NoteWithTags) -> Self {
        Self {
            id: Some(existing.note.id),
            title: existing.note.title.clone(),
            content: existing.note.content.clone(),
            tags: existing.tags.clone(),
        }
    }

    pub fn id(&self) -> Option<NoteId> {
        self.id
    }

    /// `true` until the first successful save.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn tag_ids(&self) -> impl Iterator<Item = TagId> + '_ {
        self.tags.iter().map(|tag| tag.id)
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Adds `tag` unless a tag with the same id is already present.
    pub fn add_tag(&mut self, tag: Tag) -> bool {
        if self.tags.iter().any(|current| current.id == tag.id) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    pub fn remove_tag(&mut self, tag_id: TagId) -> bool {
        let before = self.tags.len();
        self.tags.retain(|tag| tag.id != tag_id);
        self.tags.len() != before
    }

    /// Rebinds the draft to the persisted state returned by a save.
    pub(crate) fn bind(&mut self, saved: &NoteWithTags) {
        self.id = Some(saved.note.id);
        self.tags = saved.tags.clone();
    }
}
