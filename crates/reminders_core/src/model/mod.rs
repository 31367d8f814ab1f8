//! Note domain model.
//!
//! # Responsibility
//! - Define the note entity, its identity and its attachments.
//!
//! # Invariants
//! - A note owns its resources and its conflicting snapshot outright.
//! - Notebooks and tags are referenced by guid only.

pub mod guid;
pub mod note;
pub mod resource;
