//! Typed change notifications emitted by notes.
//!
//! # Responsibility
//! - Name every observable note property as a [`NoteChange`].
//! - Fan changes out to subscribed [`NoteObserver`]s.
//!
//! # Invariants
//! - A change is emitted only after the mutation it names succeeded and
//!   actually altered the value.

use crate::model::guid::NoteGuid;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Observable note properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteChange {
    Guid,
    NotebookGuid,
    Created,
    Updated,
    Title,
    TagGuids,
    Content,
    Resources,
    Reminder,
    ReminderTime,
    ReminderDone,
    IsSearchResult,
    UpdateSequenceNumber,
    Loaded,
    Deleted,
    Loading,
    Synced,
    SyncError,
    Conflicting,
    ConflictingNote,
    RenderWidth,
}

/// Subscriber for note change notifications.
///
/// `guid` is the note's guid after the change; for [`NoteChange::Guid`] it is
/// the new value.
pub trait NoteObserver: Send + Sync {
    fn note_changed(&self, guid: &NoteGuid, change: NoteChange);
}

/// Subscription list owned by one note.
#[derive(Default)]
pub(crate) struct Observers(Vec<Arc<dyn NoteObserver>>);

impl Observers {
    pub(crate) fn subscribe(&mut self, observer: Arc<dyn NoteObserver>) {
        self.0.push(observer);
    }

    pub(crate) fn emit(&self, guid: &NoteGuid, change: NoteChange) {
        for observer in &self.0 {
            observer.note_changed(guid, change);
        }
    }
}

impl Debug for Observers {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Observers({})", self.0.len())
    }
}
