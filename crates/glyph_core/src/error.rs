//! Caller-facing error contract.
//!
//! # Responsibility
//! - Report the failure kind and the failing operation for every store call.
//!
//! # Invariants
//! - Errors are returned per call and never delivered through subscriptions.
//! - `kind` is derived from the underlying repository error, never guessed.

use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure taxonomy exposed to the UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Referenced note or tag id does not exist.
    NotFound,
    /// Composite-key, unique or foreign-key invariant would be broken.
    ConstraintViolation,
    /// Database cannot be opened or written, or holds unreadable rows.
    StorageUnavailable,
    /// Caller-supplied value is unusable (for example a blank tag name).
    InvalidInput,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::ConstraintViolation => "constraint_violation",
            Self::StorageUnavailable => "storage_unavailable",
            Self::InvalidInput => "invalid_input",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store commands and queries, named after the public contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Open,
    Close,
    CreateNote,
    UpdateNote,
    DeleteNote,
    DeleteAllNotes,
    GetNote,
    ListNotes,
    Search,
    LastId,
    SaveNote,
    CreateTag,
    RenameTag,
    DeleteTag,
    ListTags,
    FindTagByName,
    AttachTag,
    DetachAllTags,
    GetNoteWithTags,
    ListNotesWithTags,
    FilterByTags,
    Subscribe,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
            Self::CreateNote => "create_note",
            Self::UpdateNote => "update_note",
            Self::DeleteNote => "delete_note",
            Self::DeleteAllNotes => "delete_all_notes",
            Self::GetNote => "get_note",
            Self::ListNotes => "list_notes",
            Self::Search => "search",
            Self::LastId => "last_id",
            Self::SaveNote => "save_note",
            Self::CreateTag => "create_tag",
            Self::RenameTag => "rename_tag",
            Self::DeleteTag => "delete_tag",
            Self::ListTags => "list_tags",
            Self::FindTagByName => "find_tag_by_name",
            Self::AttachTag => "attach_tag",
            Self::DetachAllTags => "detach_all_tags",
            Self::GetNoteWithTags => "get_note_with_tags",
            Self::ListNotesWithTags => "list_notes_with_tags",
            Self::FilterByTags => "filter_by_tags",
            Self::Subscribe => "subscribe",
        }
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by every `NoteStore` / `StoreHandle` call.
#[derive(Debug)]
pub struct StoreError {
    operation: Operation,
    source: RepoError,
}

impl StoreError {
    pub fn new(operation: Operation, source: RepoError) -> Self {
        Self { operation, source }
    }

    pub(crate) fn unavailable(operation: Operation, message: impl Into<String>) -> Self {
        Self::new(operation, RepoError::Unavailable(message.into()))
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    pub fn repo_error(&self) -> &RepoError {
        &self.source
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed ({}): {}", self.operation, self.kind(), self.source)
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorKind, Operation, StoreError};
    use crate::model::note::NoteId;
    use crate::repo::RepoError;

    #[test]
    fn display_names_operation_and_kind() {
        let err = StoreError::new(Operation::GetNote, RepoError::NoteNotFound(NoteId(4)));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.operation(), Operation::GetNote);
        assert_eq!(err.to_string(), "get_note failed (not_found): note not found: 4");
    }

    #[test]
    fn unavailable_maps_to_storage_unavailable() {
        let err = StoreError::unavailable(Operation::Close, "worker panicked");
        assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
        assert!(!err.is_not_found());
    }
}
