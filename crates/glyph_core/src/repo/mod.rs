//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for notes and tags.
//! - Isolate SQLite query details from store orchestration.
//!
//! # Invariants
//! - Repositories never open or commit transactions; callers pass a
//!   connection or an open transaction and own atomicity.
//! - Repository APIs return semantic errors (`NoteNotFound`, `TagNotFound`)
//!   in addition to DB transport errors.

use crate::db::DbError;
use crate::error::ErrorKind;
use crate::model::note::NoteId;
use crate::model::tag::TagId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod note_repo;
pub mod read_model;
pub mod tag_repo;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NoteNotFound(NoteId),
    TagNotFound(TagId),
    /// Another tag already uses this name.
    DuplicateTagName(String),
    /// Tag name is blank after trimming.
    InvalidTagName(String),
    /// A persisted row could not be decoded.
    InvalidData(String),
    /// Store is unusable for reasons outside SQLite (poisoned lock, dead worker).
    Unavailable(String),
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoteNotFound(_) | Self::TagNotFound(_) => ErrorKind::NotFound,
            Self::DuplicateTagName(_) => ErrorKind::ConstraintViolation,
            Self::InvalidTagName(_) => ErrorKind::InvalidInput,
            Self::Db(err) if err.is_constraint_violation() => ErrorKind::ConstraintViolation,
            Self::Db(_) | Self::InvalidData(_) | Self::Unavailable(_) => {
                ErrorKind::StorageUnavailable
            }
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::TagNotFound(id) => write!(f, "tag not found: {id}"),
            Self::DuplicateTagName(name) => write!(f, "tag name already in use: `{name}`"),
            Self::InvalidTagName(name) => write!(f, "invalid tag name: `{name}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Unavailable(message) => write!(f, "store unavailable: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Trims a tag name; blank names are rejected.
pub fn normalize_tag_name(name: &str) -> RepoResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RepoError::InvalidTagName(name.to_string()));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::{normalize_tag_name, RepoError};
    use crate::db::DbError;
    use crate::error::ErrorKind;
    use rusqlite::ffi;

    #[test]
    fn normalize_tag_name_trims_and_rejects_blank() {
        assert_eq!(normalize_tag_name("  Work ").unwrap(), "Work");
        assert!(matches!(
            normalize_tag_name("   "),
            Err(RepoError::InvalidTagName(_))
        ));
    }

    #[test]
    fn sqlite_constraint_failures_map_to_constraint_violation() {
        let failure = rusqlite::Error::SqliteFailure(
            ffi::Error::new(ffi::SQLITE_CONSTRAINT_FOREIGNKEY),
            Some("FOREIGN KEY constraint failed".to_string()),
        );
        let err = RepoError::Db(DbError::Sqlite(failure));
        assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
    }

    #[test]
    fn other_sqlite_failures_map_to_storage_unavailable() {
        let failure = rusqlite::Error::SqliteFailure(ffi::Error::new(ffi::SQLITE_FULL), None);
        let err = RepoError::Db(DbError::Sqlite(failure));
        assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
    }
}
