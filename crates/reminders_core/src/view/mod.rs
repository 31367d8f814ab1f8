//! Read-only views over the note set.
//!
//! # Responsibility
//! - Filter notes by notebook, tag, reminder and search-result state.
//! - Group notes into stable, non-localized section keys.
//!
//! # Invariants
//! - Deleted notes never appear in a view.
//! - View order is `updated DESC, guid ASC`.

pub mod notes_filter;
pub mod sections;
