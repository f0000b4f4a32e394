//! Store services.
//!
//! # Responsibility
//! - Orchestrate repository calls into the note/tag command/query contract.
//! - Keep UI layers decoupled from storage details and threading.

pub mod clock;
pub mod handle;
pub mod live;
pub mod note_store;
mod seed;
