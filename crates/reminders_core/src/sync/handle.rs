//! Privileged mutation capability for sync-owned note state.

use crate::model::note::Note;
use crate::repo::StorageResult;

/// Exclusive access to the sync-owned half of a [`Note`].
///
/// Only the crate hands these out (see `NotesStore::sync_handle`), so UI code
/// holding a plain `&mut Note` cannot fake server state.
#[derive(Debug)]
pub struct NoteSyncHandle<'a> {
    note: &'a mut Note,
}

impl<'a> NoteSyncHandle<'a> {
    pub(crate) fn new(note: &'a mut Note) -> Self {
        Self { note }
    }

    pub fn note(&self) -> &Note {
        &*self.note
    }

    pub fn note_mut(&mut self) -> &mut Note {
        &mut *self.note
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.note.set_loading(loading);
    }

    pub fn set_sync_error(&mut self, sync_error: bool) {
        self.note.set_sync_error(sync_error);
    }

    pub fn set_deleted(&mut self, deleted: bool) {
        self.note.set_deleted(deleted);
    }

    pub fn set_update_sequence_number(&mut self, update_sequence_number: u32) {
        self.note.set_update_sequence_number(update_sequence_number);
    }

    pub fn set_last_synced_sequence_number(&mut self, last_synced_sequence_number: u32) {
        self.note
            .set_last_synced_sequence_number(last_synced_sequence_number);
    }

    /// Settles `synced` and `needs_content_sync` after server state was
    /// installed without a sequence number change.
    pub fn recompute_synced(&mut self) {
        self.note.recompute_synced();
    }

    pub fn set_conflicting(&mut self, conflicting: bool) {
        self.note.set_conflicting(conflicting);
    }

    pub fn set_conflicting_note(&mut self, note: Option<Note>) {
        self.note.set_conflicting_note(note);
    }

    /// Adds or refreshes a resource; payloads are written to the cache.
    pub fn add_resource(&mut self, hash: &str, file_name: &str, mime_type: &str, data: Vec<u8>) {
        self.note.add_resource(hash, file_name, mime_type, data);
    }

    pub fn sync_to_info_file(&self) -> StorageResult<()> {
        self.note.sync_to_info_file()
    }

    pub fn sync_to_cache_file(&self) -> StorageResult<()> {
        self.note.sync_to_cache_file()
    }

    /// Removes both the cache and the info file.
    pub fn delete_from_cache(&self) -> StorageResult<()> {
        self.note.delete_from_cache()
    }
}
