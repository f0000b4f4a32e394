//! Conjunctive (AND) tag filter.
//!
//! A note qualifies only when it carries every selected tag. An empty
//! selection keeps every note.

use crate::model::tag::{NoteWithTags, TagId};
use std::collections::BTreeSet;

/// Keeps notes whose tag set is a superset of `selected`, preserving order.
pub fn filter_by_tags(notes: Vec<NoteWithTags>, selected: &BTreeSet<TagId>) -> Vec<NoteWithTags> {
    if selected.is_empty() {
        return notes;
    }
    notes
        .into_iter()
        .filter(|item| item.has_all_tags(selected))
        .collect()
}
