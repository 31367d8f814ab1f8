//! Sync-facing side of the note core.
//!
//! # Responsibility
//! - Define the job queue interface notes schedule fetches through.
//! - Gate sync-owned note state behind [`handle::NoteSyncHandle`].
//! - Reconcile local edits with server-reported outcomes.
//!
//! # Invariants
//! - Conflicts are state, never errors. No automatic merge happens here.

pub mod handle;
pub mod jobs;
pub mod reconciler;
