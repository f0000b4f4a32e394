//! Tag records, note/tag links and the joined read model.

use crate::model::note::{Note, NoteId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Store-assigned tag identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(pub i64);

impl Display for TagId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Named label applicable to any number of notes. Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// One `note_tag_links` row: "note carries tag".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NoteTagLink {
    pub note_id: NoteId,
    pub tag_id: TagId,
}

/// A note with its resolved tag set. Recomputed on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteWithTags {
    pub note: Note,
    /// Ordered like `list_tags`.
    pub tags: Vec<Tag>,
}

impl NoteWithTags {
    pub fn tag_ids(&self) -> BTreeSet<TagId> {
        self.tags.iter().map(|tag| tag.id).collect()
    }

    pub fn has_tag(&self, tag_id: TagId) -> bool {
        self.tags.iter().any(|tag| tag.id == tag_id)
    }

    /// Returns `true` when this note carries every tag in `selected`.
    pub fn has_all_tags(&self, selected: &BTreeSet<TagId>) -> bool {
        selected.is_subset(&self.tag_ids())
    }
}
