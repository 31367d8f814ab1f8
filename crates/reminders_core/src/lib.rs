//! Core of the reminders note client.
//!
//! Holds the ENML content model, the note entity with its local cache
//! lifecycle, sync-state reconciliation and filtered note views. Network
//! transport and UI are collaborators reached through traits.

pub mod config;
pub mod content;
pub mod context;
pub mod events;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod sync;
pub mod view;

pub use config::{ConfigError, ConfigResult, CoreConfig};
pub use content::{derive_tagline, html_to_enml, EnmlDocument, SUPPORTED_TAGS, TAGLINE_LENGTH};
pub use context::{NoteCommands, NoteContext};
pub use events::{NoteChange, NoteObserver};
pub use logging::{
    default_log_level, init_from_config, init_logging, logging_status, LoggingError,
};
pub use model::guid::NoteGuid;
pub use model::note::Note;
pub use model::resource::{Resource, ResourceError, ResourceResult, ResourceStore};
pub use repo::note_files::{NoteFiles, NoteInfo, ResourceInfo};
pub use repo::{StorageError, StorageResult};
pub use service::notes_store::NotesStore;
pub use sync::handle::NoteSyncHandle;
pub use sync::jobs::{FetchKind, JobPriority, JobQueue};
pub use sync::reconciler::ConflictOutcome;
pub use view::notes_filter::NotesFilter;
pub use view::sections::SectionRole;

/// Minimal health-check API for smoke wiring.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
