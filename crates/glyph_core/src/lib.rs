//! Core data layer for Glyph notes.
//! This crate is the single authority over persisted notes, tags and their
//! associations.

pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use config::{ConfigError, DatabaseLocation, LoggingConfig, StoreConfig};
pub use error::{ErrorKind, Operation, StoreError, StoreResult};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::draft::NoteDraft;
pub use model::note::{Note, NoteId};
pub use model::tag::{NoteTagLink, NoteWithTags, Tag, TagId};
pub use repo::note_repo::{NoteRepository, SqliteNoteRepository};
pub use repo::tag_repo::{SqliteTagRepository, TagRepository};
pub use repo::{RepoError, RepoResult};
pub use search::tag_filter::filter_by_tags;
pub use service::clock::{Clock, SystemClock};
pub use service::handle::StoreHandle;
pub use service::live::Subscription;
pub use service::note_store::NoteStore;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
