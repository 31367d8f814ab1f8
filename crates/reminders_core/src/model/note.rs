//! Note entity.
//!
//! # Responsibility
//! - Aggregate metadata, content, resources, reminder and sync state.
//! - Own the cache-file / info-file persistence lifecycle of one note.
//! - Emit a typed [`NoteChange`] for every effective mutation.
//!
//! # Invariants
//! - `synced == (update_sequence_number == last_synced_sequence_number)`;
//!   reaching `synced` clears `needs_content_sync`.
//! - Getters never touch disk. Content is materialized through
//!   [`Note::ensure_loaded`] / [`Note::load`].
//! - Sync-owned state (loading, sequence numbers, conflicts, deletion) is
//!   mutated only through `NoteSyncHandle`.
//!
//! # See also
//! - `sync::reconciler` for the server-facing state transitions.

use crate::content::{resource_url, EnmlDocument, ENML_HEADER, EN_NOTE};
use crate::context::NoteContext;
use crate::events::{NoteChange, NoteObserver, Observers};
use crate::model::guid::NoteGuid;
use crate::model::resource::{Resource, ResourceResult, ResourceStore};
use crate::repo::note_files::{NoteFiles, NoteInfo, ResourceInfo};
use crate::repo::StorageResult;
use crate::sync::jobs::{FetchKind, JobPriority};
use log::{debug, info, warn};
use std::path::Path;
use std::sync::Arc;

/// Current wall clock as Unix epoch milliseconds.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// One note and its local state.
#[derive(Debug)]
pub struct Note {
    context: NoteContext,
    guid: NoteGuid,
    files: NoteFiles,
    notebook_guid: String,
    created: i64,
    updated: i64,
    title: String,
    tag_guids: Vec<String>,
    content: EnmlDocument,
    resources: ResourceStore,
    reminder_order: i64,
    reminder_time: Option<i64>,
    reminder_done_time: Option<i64>,
    deleted: bool,
    is_search_result: bool,
    update_sequence_number: u32,
    last_synced_sequence_number: u32,
    synced: bool,
    loading: bool,
    loaded: bool,
    needs_content_sync: bool,
    sync_error: bool,
    conflicting: bool,
    conflicting_note: Option<Box<Note>>,
    observers: Observers,
}

impl Note {
    /// Binds `guid` to its files and restores persisted metadata.
    ///
    /// An unreadable info file is logged and treated as absent.
    pub fn new(context: NoteContext, guid: NoteGuid, update_sequence_number: u32) -> Self {
        let mut note = Self::blank(context, guid, update_sequence_number);
        match note.files.read_info() {
            Ok(Some(info)) => note.restore(info),
            Ok(None) => {}
            Err(err) => warn!(
                "event=note_info_read module=note status=error guid={} error={}",
                note.guid, err
            ),
        }
        note.synced = note.update_sequence_number == note.last_synced_sequence_number;
        note
    }

    /// Creates an unsynced note composed on this device.
    pub fn new_local(context: NoteContext, notebook_guid: impl Into<String>) -> Self {
        let mut note = Self::blank(context, NoteGuid::new_local(), 1);
        let now = now_millis();
        note.notebook_guid = notebook_guid.into();
        note.created = now;
        note.updated = now;
        note.content = EnmlDocument::from_enml(format!("{ENML_HEADER}<{EN_NOTE}></{EN_NOTE}>"));
        note.loaded = true;
        note.needs_content_sync = true;
        note
    }

    /// Builds a snapshot of server state; nothing is read from disk.
    pub fn from_server(context: NoteContext, guid: NoteGuid, update_sequence_number: u32) -> Self {
        let mut note = Self::blank(context, guid, update_sequence_number);
        note.synced = update_sequence_number == 0;
        note
    }

    fn blank(context: NoteContext, guid: NoteGuid, update_sequence_number: u32) -> Self {
        let files = NoteFiles::new(context.storage_root(), &guid);
        Self {
            context,
            guid,
            files,
            notebook_guid: String::new(),
            created: 0,
            updated: 0,
            title: String::new(),
            tag_guids: Vec::new(),
            content: EnmlDocument::new(),
            resources: ResourceStore::new(),
            reminder_order: 0,
            reminder_time: None,
            reminder_done_time: None,
            deleted: false,
            is_search_result: false,
            update_sequence_number,
            last_synced_sequence_number: 0,
            synced: false,
            loading: false,
            loaded: false,
            needs_content_sync: false,
            sync_error: false,
            conflicting: false,
            conflicting_note: None,
            observers: Observers::default(),
        }
    }

    fn restore(&mut self, info: NoteInfo) {
        self.created = info.created;
        self.title = info.title;
        self.updated = info.updated;
        self.notebook_guid = info.notebook_guid;
        self.tag_guids = info.tag_guids;
        self.reminder_order = info.reminder_order;
        self.reminder_time = info.reminder_time;
        self.reminder_done_time = info.reminder_done_time;
        self.deleted = info.deleted;
        self.content.restore_tagline(info.tagline);
        self.last_synced_sequence_number = info.last_synced_sequence_number;
        self.needs_content_sync = info.needs_content_sync;
        let root = self.context.storage_root().to_path_buf();
        for (hash, resource) in info.resources {
            self.resources
                .add(&root, &hash, &resource.file_name, &resource.mime_type, Vec::new());
        }
    }

    /// Registers an observer for this note's changes.
    pub fn subscribe(&mut self, observer: Arc<dyn NoteObserver>) {
        self.observers.subscribe(observer);
    }

    fn notify(&self, change: NoteChange) {
        self.observers.emit(&self.guid, change);
    }

    pub fn context(&self) -> &NoteContext {
        &self.context
    }

    pub fn guid(&self) -> &NoteGuid {
        &self.guid
    }

    pub fn files(&self) -> &NoteFiles {
        &self.files
    }

    /// Moves the note to a new guid.
    ///
    /// The cache file follows the note and the old info file is dropped.
    /// Metadata and content are re-persisted under the new paths only when
    /// something had been persisted before. [`NoteChange::Guid`] is emitted
    /// once the move happened, even if re-persisting fails.
    pub fn set_guid(&mut self, guid: NoteGuid) -> StorageResult<()> {
        if guid == self.guid {
            return Ok(());
        }

        let persisted = self.files.has_info() || self.files.has_cache();
        let new_files = NoteFiles::new(self.context.storage_root(), &guid);
        self.files.rename_cache_to(&new_files)?;
        if let Err(err) = self.files.remove_info() {
            warn!(
                "event=note_info_remove module=note status=error guid={} error={}",
                self.guid, err
            );
        }

        info!(
            "event=note_guid_change module=note status=ok old={} new={}",
            self.guid, guid
        );
        self.files = new_files;
        self.guid = guid;

        let result = if persisted {
            self.sync_to_info_file()
                .and_then(|()| self.sync_to_cache_file())
        } else {
            Ok(())
        };
        self.notify(NoteChange::Guid);
        result
    }

    pub fn notebook_guid(&self) -> &str {
        &self.notebook_guid
    }

    pub fn set_notebook_guid(&mut self, notebook_guid: impl Into<String>) {
        let notebook_guid = notebook_guid.into();
        if self.notebook_guid != notebook_guid {
            self.notebook_guid = notebook_guid;
            self.notify(NoteChange::NotebookGuid);
        }
    }

    /// Unix epoch milliseconds.
    pub fn created(&self) -> i64 {
        self.created
    }

    pub fn set_created(&mut self, created: i64) {
        if self.created != created {
            self.created = created;
            self.notify(NoteChange::Created);
        }
    }

    /// Unix epoch milliseconds.
    pub fn updated(&self) -> i64 {
        self.updated
    }

    pub fn set_updated(&mut self, updated: i64) {
        if self.updated != updated {
            self.updated = updated;
            self.notify(NoteChange::Updated);
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        if self.title != title {
            self.title = title;
            self.notify(NoteChange::Title);
        }
    }

    pub fn tag_guids(&self) -> &[String] {
        &self.tag_guids
    }

    pub fn set_tag_guids(&mut self, tag_guids: Vec<String>) {
        if self.tag_guids != tag_guids {
            self.tag_guids = tag_guids;
            self.notify(NoteChange::TagGuids);
        }
    }

    /// Appends `tag_guid` unless already present.
    ///
    /// `NotesStore::tag_note` wraps this with a server save.
    pub fn add_tag(&mut self, tag_guid: &str) -> bool {
        if self.tag_guids.iter().any(|tag| tag == tag_guid) {
            return false;
        }
        self.tag_guids.push(tag_guid.to_string());
        self.notify(NoteChange::TagGuids);
        true
    }

    pub fn remove_tag(&mut self, tag_guid: &str) -> bool {
        let before = self.tag_guids.len();
        self.tag_guids.retain(|tag| tag != tag_guid);
        if self.tag_guids.len() == before {
            return false;
        }
        self.notify(NoteChange::TagGuids);
        true
    }

    /// Follows a notebook guid reassigned by the server.
    pub fn apply_notebook_guid_change(&mut self, old_guid: &str, new_guid: &str) {
        if self.notebook_guid == old_guid {
            self.notebook_guid = new_guid.to_string();
            self.notify(NoteChange::NotebookGuid);
        }
    }

    /// Follows a tag guid reassigned by the server.
    pub fn apply_tag_guid_change(&mut self, old_guid: &str, new_guid: &str) {
        if let Some(tag) = self.tag_guids.iter_mut().find(|tag| *tag == old_guid) {
            *tag = new_guid.to_string();
            self.notify(NoteChange::TagGuids);
        }
    }

    pub fn enml_content(&self) -> &str {
        self.content.enml()
    }

    /// Installs canonical content and marks the note loaded.
    ///
    /// Only a change to already loaded content counts as a local edit.
    pub fn set_enml_content(&mut self, enml: impl Into<String>) {
        if self.content.set_enml(enml) {
            self.notify(NoteChange::Content);
            if self.loaded {
                self.needs_content_sync = true;
            }
        }
        self.mark_loaded();
    }

    pub fn html_content(&self) -> String {
        self.content.to_html(self.guid.as_str())
    }

    pub fn rich_text_content(&self) -> String {
        self.content.to_rich_text(self.guid.as_str())
    }

    /// Applies an edited rich-text projection.
    pub fn set_rich_text_content(&mut self, rich_text: &str) {
        if self.rich_text_content() == rich_text {
            return;
        }
        if self.content.set_rich_text(rich_text) {
            self.notify(NoteChange::Content);
            self.needs_content_sync = true;
        }
    }

    pub fn plaintext_content(&self) -> String {
        self.content.to_plaintext()
    }

    pub fn tagline(&self) -> &str {
        self.content.tagline()
    }

    pub fn insert_text(&mut self, position: usize, text: &str) {
        self.content.insert_text(position, text);
        self.content_edited();
    }

    pub fn insert_link(&mut self, position: usize, url: &str) {
        self.content.insert_link(position, url);
        self.content_edited();
    }

    /// Toggles one todo; `todo_id` is `en-todo-<n>` or `<n>`.
    pub fn mark_todo(&mut self, todo_id: &str, checked: bool) -> bool {
        if !self.content.mark_todo(todo_id, checked) {
            return false;
        }
        self.content_edited();
        true
    }

    /// Imports `path` as a resource and embeds it at `position`.
    ///
    /// The imported file itself is left in place.
    pub fn attach_file(&mut self, position: usize, path: &Path) -> ResourceResult<()> {
        let resource = Resource::from_file(self.context.storage_root(), path)?;
        let hash = resource.hash().to_string();
        let file_name = resource.file_name().to_string();
        let mime_type = resource.mime_type().to_string();

        self.content.attach_file(position, &hash, &mime_type);
        self.resources.insert(resource);
        if let Err(err) = self.files.update_info(|info| {
            info.resources.insert(
                hash,
                ResourceInfo {
                    file_name,
                    mime_type,
                },
            );
        }) {
            warn!(
                "event=note_info_write module=note status=error guid={} error={}",
                self.guid, err
            );
        }

        self.notify(NoteChange::Resources);
        self.content_edited();
        Ok(())
    }

    fn content_edited(&mut self) {
        self.notify(NoteChange::Content);
        self.needs_content_sync = true;
    }

    pub fn render_width(&self) -> Option<u32> {
        self.content.render_width()
    }

    /// Display hint for embedded images; `None` means unconstrained.
    pub fn set_render_width(&mut self, render_width: Option<u32>) {
        if self.content.set_render_width(render_width) {
            self.notify(NoteChange::RenderWidth);
            self.notify(NoteChange::Content);
        }
    }

    pub fn reminder(&self) -> bool {
        self.reminder_order > 0
    }

    /// Turning a reminder on stamps the current time as its order.
    pub fn set_reminder(&mut self, reminder: bool) {
        if reminder && self.reminder_order == 0 {
            self.reminder_order = now_millis();
            self.notify(NoteChange::Reminder);
        } else if !reminder && self.reminder_order > 0 {
            self.reminder_order = 0;
            self.notify(NoteChange::Reminder);
        }
    }

    pub fn reminder_order(&self) -> i64 {
        self.reminder_order
    }

    pub fn set_reminder_order(&mut self, reminder_order: i64) {
        if self.reminder_order != reminder_order {
            self.reminder_order = reminder_order;
            self.notify(NoteChange::Reminder);
        }
    }

    pub fn has_reminder_time(&self) -> bool {
        self.reminder_time.is_some()
    }

    pub fn set_has_reminder_time(&mut self, has_reminder_time: bool) {
        if has_reminder_time && self.reminder_time.is_none() {
            self.reminder_time = Some(now_millis());
            self.notify(NoteChange::ReminderTime);
        } else if !has_reminder_time && self.reminder_time.is_some() {
            self.reminder_time = None;
            self.notify(NoteChange::ReminderTime);
        }
    }

    pub fn reminder_time(&self) -> Option<i64> {
        self.reminder_time
    }

    pub fn set_reminder_time(&mut self, reminder_time: Option<i64>) {
        if self.reminder_time != reminder_time {
            self.reminder_time = reminder_time;
            self.notify(NoteChange::ReminderTime);
        }
    }

    pub fn reminder_done(&self) -> bool {
        self.reminder_done_time.is_some()
    }

    pub fn set_reminder_done(&mut self, reminder_done: bool) {
        if reminder_done && self.reminder_done_time.is_none() {
            self.reminder_done_time = Some(now_millis());
            self.notify(NoteChange::ReminderDone);
        } else if !reminder_done && self.reminder_done_time.is_some() {
            self.reminder_done_time = None;
            self.notify(NoteChange::ReminderDone);
        }
    }

    pub fn reminder_done_time(&self) -> Option<i64> {
        self.reminder_done_time
    }

    pub fn set_reminder_done_time(&mut self, reminder_done_time: Option<i64>) {
        if self.reminder_done_time != reminder_done_time {
            self.reminder_done_time = reminder_done_time;
            self.notify(NoteChange::ReminderDone);
        }
    }

    pub fn deleted(&self) -> bool {
        self.deleted
    }

    pub fn is_search_result(&self) -> bool {
        self.is_search_result
    }

    pub fn set_is_search_result(&mut self, is_search_result: bool) {
        if self.is_search_result != is_search_result {
            self.is_search_result = is_search_result;
            self.notify(NoteChange::IsSearchResult);
        }
    }

    pub fn update_sequence_number(&self) -> u32 {
        self.update_sequence_number
    }

    pub fn last_synced_sequence_number(&self) -> u32 {
        self.last_synced_sequence_number
    }

    pub fn synced(&self) -> bool {
        self.synced
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn needs_content_sync(&self) -> bool {
        self.needs_content_sync
    }

    pub fn sync_error(&self) -> bool {
        self.sync_error
    }

    pub fn conflicting(&self) -> bool {
        self.conflicting
    }

    /// Server version parked while this note is in conflict.
    pub fn conflicting_note(&self) -> Option<&Note> {
        self.conflicting_note.as_deref()
    }

    pub fn resources(&self) -> &ResourceStore {
        &self.resources
    }

    pub fn resource(&self, hash: &str) -> Option<&Resource> {
        self.resources.get(hash)
    }

    /// URLs of every resource, flagged with whether the payload is on disk.
    pub fn resource_urls(&self) -> Vec<String> {
        self.resources
            .iter()
            .map(|resource| {
                format!(
                    "{}&loaded={}",
                    resource_url(self.guid.as_str(), resource.hash(), resource.mime_type()),
                    resource.is_cached()
                )
            })
            .collect()
    }

    /// `true` when a cache file exists for this note.
    pub fn is_cached(&self) -> bool {
        self.files.has_cache()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Loads content from the cache file if needed.
    ///
    /// Returns whether content is available afterwards.
    pub fn ensure_loaded(&mut self) -> bool {
        if !self.loaded && self.files.has_cache() {
            self.load_from_cache_file();
        }
        self.loaded
    }

    /// Makes content available: from cache synchronously, otherwise by
    /// scheduling a fetch. Missing resource payloads are fetched once content
    /// is present.
    pub fn load(&mut self, priority_high: bool) {
        if !self.ensure_loaded() {
            let priority = if priority_high {
                JobPriority::High
            } else {
                JobPriority::Medium
            };
            self.context
                .jobs()
                .enqueue_fetch(&self.guid, FetchKind::Content, priority);
            self.set_loading(true);
            return;
        }

        if !self.resources.all_cached() {
            let priority = if priority_high {
                JobPriority::High
            } else {
                JobPriority::Low
            };
            self.context
                .jobs()
                .enqueue_fetch(&self.guid, FetchKind::ResourcesOnly, priority);
        }
    }

    fn load_from_cache_file(&mut self) {
        match self.files.read_cache() {
            Ok(enml) => {
                if self.content.set_enml(enml.trim()) {
                    self.notify(NoteChange::Content);
                }
                debug!(
                    "event=note_cache_load module=note status=ok guid={}",
                    self.guid
                );
                self.mark_loaded();
            }
            Err(err) => warn!(
                "event=note_cache_load module=note status=error guid={} error={}",
                self.guid, err
            ),
        }
    }

    fn mark_loaded(&mut self) {
        if !self.loaded {
            self.loaded = true;
            self.notify(NoteChange::Loaded);
        }
    }

    /// Asks the server-side collaborator to save this note.
    pub fn save(&self) {
        self.context.commands().save_note(&self.guid);
    }

    /// Asks the server-side collaborator to delete this note.
    pub fn remove(&self) {
        self.context.commands().delete_note(&self.guid);
    }

    /// Snapshot of every persisted field.
    pub fn to_info(&self) -> NoteInfo {
        NoteInfo {
            created: self.created,
            title: self.title.clone(),
            updated: self.updated,
            notebook_guid: self.notebook_guid.clone(),
            tag_guids: self.tag_guids.clone(),
            reminder_order: self.reminder_order,
            reminder_time: self.reminder_time,
            reminder_done_time: self.reminder_done_time,
            deleted: self.deleted,
            tagline: self.content.tagline().to_string(),
            last_synced_sequence_number: self.last_synced_sequence_number,
            needs_content_sync: self.needs_content_sync,
            resources: self
                .resources
                .iter()
                .map(|resource| {
                    (
                        resource.hash().to_string(),
                        ResourceInfo {
                            file_name: resource.file_name().to_string(),
                            mime_type: resource.mime_type().to_string(),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Writes metadata to the info file; the stored tagline is kept.
    pub fn sync_to_info_file(&self) -> StorageResult<()> {
        let mut snapshot = self.to_info();
        self.files.update_info(|info| {
            snapshot.tagline = std::mem::take(&mut info.tagline);
            *info = snapshot;
        })
    }

    /// Writes the tagline and, once loaded, the canonical content.
    pub fn sync_to_cache_file(&self) -> StorageResult<()> {
        let tagline = self.content.tagline().to_string();
        self.files.update_info(|info| info.tagline = tagline)?;
        if !self.loaded {
            debug!(
                "event=note_cache_write module=note status=skip guid={} reason=not_loaded",
                self.guid
            );
            return Ok(());
        }
        self.files.write_cache(self.content.enml())
    }

    pub(crate) fn set_loading(&mut self, loading: bool) {
        if self.loading != loading {
            self.loading = loading;
            self.notify(NoteChange::Loading);
        }
    }

    pub(crate) fn set_sync_error(&mut self, sync_error: bool) {
        if self.sync_error != sync_error {
            self.sync_error = sync_error;
            self.notify(NoteChange::SyncError);
        }
    }

    pub(crate) fn set_deleted(&mut self, deleted: bool) {
        if self.deleted != deleted {
            self.deleted = deleted;
            self.notify(NoteChange::Deleted);
        }
    }

    pub(crate) fn set_update_sequence_number(&mut self, update_sequence_number: u32) {
        if self.update_sequence_number != update_sequence_number {
            self.update_sequence_number = update_sequence_number;
            self.notify(NoteChange::UpdateSequenceNumber);
            self.recompute_synced();
        }
    }

    pub(crate) fn set_last_synced_sequence_number(&mut self, last_synced_sequence_number: u32) {
        if self.last_synced_sequence_number != last_synced_sequence_number {
            self.last_synced_sequence_number = last_synced_sequence_number;
            self.recompute_synced();
        }
    }

    /// Re-derives `synced` from the sequence numbers; a synced note has no
    /// pending content.
    pub(crate) fn recompute_synced(&mut self) {
        let synced = self.update_sequence_number == self.last_synced_sequence_number;
        if synced {
            self.needs_content_sync = false;
        }
        if self.synced != synced {
            self.synced = synced;
            self.notify(NoteChange::Synced);
        }
    }

    pub(crate) fn set_conflicting(&mut self, conflicting: bool) {
        if self.conflicting != conflicting {
            self.conflicting = conflicting;
            self.notify(NoteChange::Conflicting);
        }
    }

    /// Replaces (and drops) any previous conflicting snapshot.
    pub(crate) fn set_conflicting_note(&mut self, note: Option<Note>) {
        self.conflicting_note = note.map(Box::new);
        self.notify(NoteChange::ConflictingNote);
    }

    pub(crate) fn add_resource(
        &mut self,
        hash: &str,
        file_name: &str,
        mime_type: &str,
        data: Vec<u8>,
    ) {
        let root = self.context.storage_root().to_path_buf();
        let updates_payload = !data.is_empty();
        let created = self
            .resources
            .add(&root, hash, file_name, mime_type, data);
        if created || updates_payload {
            self.notify(NoteChange::Resources);
        }
    }

    pub(crate) fn delete_from_cache(&self) -> StorageResult<()> {
        self.files.remove_cache()?;
        self.files.remove_info()
    }
}

impl Clone for Note {
    /// Deep copy for handing to another context; `loading` and observer
    /// subscriptions are not carried over.
    fn clone(&self) -> Self {
        Self {
            context: self.context.clone(),
            guid: self.guid.clone(),
            files: self.files.clone(),
            notebook_guid: self.notebook_guid.clone(),
            created: self.created,
            updated: self.updated,
            title: self.title.clone(),
            tag_guids: self.tag_guids.clone(),
            content: self.content.clone(),
            resources: self.resources.clone(),
            reminder_order: self.reminder_order,
            reminder_time: self.reminder_time,
            reminder_done_time: self.reminder_done_time,
            deleted: self.deleted,
            is_search_result: self.is_search_result,
            update_sequence_number: self.update_sequence_number,
            last_synced_sequence_number: self.last_synced_sequence_number,
            synced: self.synced,
            loading: false,
            loaded: self.loaded,
            needs_content_sync: self.needs_content_sync,
            sync_error: self.sync_error,
            conflicting: self.conflicting,
            conflicting_note: self.conflicting_note.clone(),
            observers: Observers::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Note;
    use crate::context::{NoteCommands, NoteContext};
    use crate::model::guid::NoteGuid;
    use crate::sync::jobs::{FetchKind, JobPriority, JobQueue};
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Jobs(Mutex<Vec<(FetchKind, JobPriority)>>);

    impl JobQueue for Jobs {
        fn enqueue_fetch(&self, _guid: &NoteGuid, kind: FetchKind, priority: JobPriority) {
            self.0.lock().unwrap().push((kind, priority));
        }
    }

    struct NoCommands;

    impl NoteCommands for NoCommands {
        fn save_note(&self, _guid: &NoteGuid) {}
        fn delete_note(&self, _guid: &NoteGuid) {}
    }

    fn context(root: &Path, jobs: Arc<Jobs>) -> NoteContext {
        NoteContext::new(root, jobs, Arc::new(NoCommands))
    }

    #[test]
    fn sequence_numbers_drive_synced_and_clear_content_sync() {
        let dir = tempfile::tempdir().unwrap();
        let mut note = Note::new(context(dir.path(), Arc::default()), NoteGuid::new("n"), 3);
        assert!(!note.synced());

        note.set_enml_content("<en-note>a</en-note>");
        note.set_enml_content("<en-note>b</en-note>");
        assert!(note.needs_content_sync());

        note.set_last_synced_sequence_number(3);
        assert!(note.synced());
        assert!(!note.needs_content_sync());

        note.set_update_sequence_number(4);
        assert!(!note.synced());
    }

    #[test]
    fn load_prefers_cache_then_schedules_fetches() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = Arc::new(Jobs::default());
        let mut missing = Note::new(context(dir.path(), jobs.clone()), NoteGuid::new("a"), 1);
        missing.load(false);
        assert!(missing.loading());
        assert!(!missing.is_loaded());

        let mut cached = Note::new(context(dir.path(), jobs.clone()), NoteGuid::new("b"), 1);
        std::fs::write(cached.files().cache_file(), "<en-note>hi</en-note>\n").unwrap();
        cached.add_resource("r1", "a.png", "image/png", Vec::new());
        cached.load(true);
        assert!(cached.is_loaded());
        assert_eq!(cached.enml_content(), "<en-note>hi</en-note>");

        assert_eq!(
            *jobs.0.lock().unwrap(),
            vec![
                (FetchKind::Content, JobPriority::Medium),
                (FetchKind::ResourcesOnly, JobPriority::High),
            ]
        );
    }

    #[test]
    fn info_file_survives_reconstruction() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), Arc::default());
        let mut note = Note::new(ctx.clone(), NoteGuid::new("n"), 7);
        note.set_title("Plan");
        note.set_tag_guids(vec!["t".to_string()]);
        note.set_enml_content("<en-note><div>body text</div></en-note>");
        note.set_last_synced_sequence_number(7);
        note.sync_to_info_file().unwrap();
        note.sync_to_cache_file().unwrap();

        let restored = Note::new(ctx, NoteGuid::new("n"), 7);
        assert_eq!(restored.to_info(), note.to_info());
        assert!(restored.synced());
        assert!(!restored.is_loaded());
        assert_eq!(restored.tagline(), "body text");
    }
}
