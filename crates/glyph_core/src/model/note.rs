//! Note record.

use crate::search::text::contains_ignore_case;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Store-assigned note identifier. Strictly increasing, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub i64);

impl Display for NoteId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Snapshot of one persisted note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    /// May be empty.
    pub title: String,
    /// May be empty.
    pub content: String,
    /// Unix epoch milliseconds of the last save.
    pub timestamp: i64,
}

impl Note {
    /// Case-insensitive substring match over title or content.
    ///
    /// This is the predicate behind `search`. Only the empty query matches
    /// every note.
    pub fn matches_text(&self, query: &str) -> bool {
        contains_ignore_case(&self.title, query) || contains_ignore_case(&self.content, query)
    }
}

#[cfg(test)]
mod tests {
    use super::{Note, NoteId};

    fn note(title: &str, content: &str) -> Note {
        Note {
            id: NoteId(1),
            title: title.to_string(),
            content: content.to_string(),
            timestamp: 0,
        }
    }

    #[test]
    fn matches_text_checks_title_and_content_ignoring_case() {
        let item = note("Shopping List", "milk, bread, COFFEE");
        assert!(item.matches_text("shopping"));
        assert!(item.matches_text("coffee"));
        assert!(!item.matches_text("tea"));
    }

    #[test]
    fn only_empty_query_matches_everything() {
        assert!(note("", "").matches_text(""));
        assert!(!note("a", "b").matches_text("   "));
    }

    #[test]
    fn matches_accented_text_in_any_case() {
        let item = note("Reunião de Equipe", "Módulo concluído");
        assert!(item.matches_text("REUNIÃO"));
        assert!(item.matches_text("MÓDULO"));
    }
}
