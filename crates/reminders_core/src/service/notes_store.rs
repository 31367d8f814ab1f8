//! Owning context for note instances.
//!
//! # Responsibility
//! - Keep every live [`Note`] keyed by guid.
//! - Route job-layer completions to the right note.
//! - Broadcast notebook/tag guid reassignments to all notes.
//!
//! # Invariants
//! - At most one `Note` per guid.
//! - Completions for guids no longer present are logged and dropped.
//!
//! # See also
//! - `sync::reconciler` for the transitions each callback applies.

use crate::context::NoteContext;
use crate::model::guid::NoteGuid;
use crate::model::note::Note;
use crate::repo::StorageResult;
use crate::sync::handle::NoteSyncHandle;
use crate::sync::reconciler::{self, ConflictOutcome};
use crate::view::notes_filter::NotesFilter;
use log::{info, warn};
use std::collections::HashMap;

/// All notes known to this process.
#[derive(Debug)]
pub struct NotesStore {
    context: NoteContext,
    notes: HashMap<NoteGuid, Note>,
}

impl NotesStore {
    pub fn new(context: NoteContext) -> Self {
        Self {
            context,
            notes: HashMap::new(),
        }
    }

    pub fn context(&self) -> &NoteContext {
        &self.context
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn note(&self, guid: &str) -> Option<&Note> {
        self.notes.get(guid)
    }

    pub fn note_mut(&mut self, guid: &str) -> Option<&mut Note> {
        self.notes.get_mut(guid)
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.notes.values()
    }

    /// Returns the note for `guid`, creating it from local files on first use.
    pub fn note_or_create(&mut self, guid: &NoteGuid, update_sequence_number: u32) -> &mut Note {
        let context = &self.context;
        self.notes
            .entry(guid.clone())
            .or_insert_with(|| Note::new(context.clone(), guid.clone(), update_sequence_number))
    }

    /// Creates a new unsynced note in `notebook_guid` and returns its guid.
    pub fn create_local_note(&mut self, notebook_guid: &str) -> NoteGuid {
        let note = Note::new_local(self.context.clone(), notebook_guid);
        let guid = note.guid().clone();
        info!(
            "event=note_create module=store status=ok guid={} notebook={}",
            guid, notebook_guid
        );
        self.notes.insert(guid.clone(), note);
        guid
    }

    /// Adds or replaces a note; returns the replaced one.
    pub fn insert(&mut self, note: Note) -> Option<Note> {
        self.notes.insert(note.guid().clone(), note)
    }

    /// Forgets a note without touching its files.
    pub fn evict(&mut self, guid: &str) -> Option<Note> {
        self.notes.remove(guid)
    }

    /// Hands out the privileged sync capability for one note.
    pub fn sync_handle(&mut self, guid: &str) -> Option<NoteSyncHandle<'_>> {
        self.notes.get_mut(guid).map(NoteSyncHandle::new)
    }

    fn known_handle(&mut self, guid: &str, callback: &str) -> Option<NoteSyncHandle<'_>> {
        let handle = self.notes.get_mut(guid).map(NoteSyncHandle::new);
        if handle.is_none() {
            warn!(
                "event=store_callback module=store status=skip callback={} guid={} reason=unknown_note",
                callback, guid
            );
        }
        handle
    }

    /// Flushes a note locally and asks the server to store it.
    ///
    /// A synced note gets a fresh local sequence number so it reads as
    /// modified until the server confirms.
    pub fn save_note(&mut self, guid: &str) -> StorageResult<()> {
        let Some(mut handle) = self.known_handle(guid, "save_note") else {
            return Ok(());
        };
        if handle.note().synced() {
            let next = handle.note().update_sequence_number().saturating_add(1);
            handle.set_update_sequence_number(next);
        }
        handle.sync_to_info_file()?;
        handle.sync_to_cache_file()?;
        handle.note().save();
        Ok(())
    }

    /// Marks a note deleted locally and asks the server to delete it.
    pub fn delete_note(&mut self, guid: &str) -> StorageResult<()> {
        let Some(mut handle) = self.known_handle(guid, "delete_note") else {
            return Ok(());
        };
        handle.set_deleted(true);
        handle.sync_to_info_file()?;
        handle.note().remove();
        Ok(())
    }

    /// Removes a note together with its local files.
    pub fn expunge_note(&mut self, guid: &str) -> StorageResult<Option<Note>> {
        if let Some(handle) = self.known_handle(guid, "expunge_note") {
            handle.delete_from_cache()?;
        }
        Ok(self.notes.remove(guid))
    }

    pub fn tag_note(&mut self, guid: &str, tag_guid: &str) -> StorageResult<()> {
        let changed = match self.notes.get_mut(guid) {
            Some(note) => note.add_tag(tag_guid),
            None => false,
        };
        if changed {
            self.save_note(guid)?;
        }
        Ok(())
    }

    pub fn untag_note(&mut self, guid: &str, tag_guid: &str) -> StorageResult<()> {
        let changed = match self.notes.get_mut(guid) {
            Some(note) => note.remove_tag(tag_guid),
            None => false,
        };
        if changed {
            self.save_note(guid)?;
        }
        Ok(())
    }

    pub fn on_loaded(&mut self, guid: &str, enml: &str) {
        if let Some(mut handle) = self.known_handle(guid, "on_loaded") {
            reconciler::content_loaded(&mut handle, enml);
        }
    }

    pub fn on_resource_loaded(
        &mut self,
        guid: &str,
        hash: &str,
        file_name: &str,
        mime_type: &str,
        data: Vec<u8>,
    ) {
        if let Some(mut handle) = self.known_handle(guid, "on_resource_loaded") {
            reconciler::resource_loaded(&mut handle, hash, file_name, mime_type, data);
        }
    }

    pub fn on_load_failed(&mut self, guid: &str, message: &str) {
        if let Some(mut handle) = self.known_handle(guid, "on_load_failed") {
            reconciler::load_failed(&mut handle, message);
        }
    }

    /// Routes a server version that differs from the local copy.
    pub fn on_conflict(&mut self, server: Note) -> Option<ConflictOutcome> {
        let guid = server.guid().clone();
        let mut handle = self.known_handle(guid.as_str(), "on_conflict")?;
        Some(reconciler::report_conflict(&mut handle, server))
    }

    pub fn on_sync_error(&mut self, guid: &str, message: &str) {
        if let Some(mut handle) = self.known_handle(guid, "on_sync_error") {
            reconciler::report_sync_error(&mut handle, message);
        }
    }

    pub fn on_saved(&mut self, guid: &str, usn: u32) {
        if let Some(mut handle) = self.known_handle(guid, "on_saved") {
            reconciler::report_saved(&mut handle, usn);
        }
    }

    /// Rekeys a note after the server assigned its real guid.
    ///
    /// A guid already owned by another note is refused; neither note changes.
    pub fn on_guid_assigned(&mut self, old_guid: &str, new_guid: NoteGuid) -> StorageResult<()> {
        if old_guid != new_guid.as_str() && self.notes.contains_key(new_guid.as_str()) {
            warn!(
                "event=store_callback module=store status=skip callback=on_guid_assigned guid={} new_guid={} reason=guid_taken",
                old_guid, new_guid
            );
            return Ok(());
        }
        let Some(mut note) = self.notes.remove(old_guid) else {
            warn!(
                "event=store_callback module=store status=skip callback=on_guid_assigned guid={} reason=unknown_note",
                old_guid
            );
            return Ok(());
        };
        let result = note.set_guid(new_guid);
        self.notes.insert(note.guid().clone(), note);
        result
    }

    /// Follows a notebook guid reassignment in every note.
    pub fn notebook_guid_changed(&mut self, old_guid: &str, new_guid: &str) {
        for note in self.notes.values_mut() {
            note.apply_notebook_guid_change(old_guid, new_guid);
        }
    }

    /// Follows a tag guid reassignment in every note.
    pub fn tag_guid_changed(&mut self, old_guid: &str, new_guid: &str) {
        for note in self.notes.values_mut() {
            note.apply_tag_guid_change(old_guid, new_guid);
        }
    }

    /// Notes accepted by `filter`, in view order.
    pub fn filtered(&self, filter: &NotesFilter) -> Vec<&Note> {
        filter.apply(self.notes.values())
    }
}
