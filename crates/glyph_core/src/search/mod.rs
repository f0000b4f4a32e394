//! Query helpers shared by the store and its callers.
//!
//! # Responsibility
//! - Unicode-aware case-insensitive substring matching for note search.
//! - Apply the conjunctive tag filter over note snapshots.

pub mod tag_filter;
pub mod text;
