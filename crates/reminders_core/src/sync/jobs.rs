//! Background job interface consumed by notes.

use crate::model::guid::NoteGuid;

/// Scheduling priority of a fetch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JobPriority {
    High,
    Medium,
    Low,
}

/// What a fetch job should download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchKind {
    /// Note content plus resource metadata.
    Content,
    /// Resource payloads only.
    ResourcesOnly,
}

/// Queue of network jobs run outside the owning context.
///
/// Completion is reported back through the `NotesStore` callbacks.
pub trait JobQueue: Send + Sync {
    fn enqueue_fetch(&self, guid: &NoteGuid, kind: FetchKind, priority: JobPriority);
}
