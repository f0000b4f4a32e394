//! Note/tag domain model.
//!
//! # Responsibility
//! - Define the records persisted by the store (`Note`, `Tag`, `NoteTagLink`).
//! - Define read models and editor handles built on top of them.
//!
//! # Invariants
//! - Ids are assigned by the store and never supplied for new rows.
//! - Deletion is permanent; there are no tombstones.

pub mod draft;
pub mod note;
pub mod tag;
