//! Sync state transitions driven by server outcomes.
//!
//! # Responsibility
//! - Decide between parking a server snapshot as a conflict and
//!   fast-forwarding the local copy.
//! - Apply fetch/save completions reported by the job layer.
//!
//! # Invariants
//! - A note with local changes is never overwritten by server state.
//! - `sync_error` is independent of `conflicting`.
//! - Flush failures are logged; they never undo an applied transition.

use crate::model::note::Note;
use crate::sync::handle::NoteSyncHandle;
use log::{info, warn};

/// Result of [`report_conflict`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictOutcome {
    /// Local changes exist; the server snapshot was parked next to them.
    Conflicting,
    /// No local changes; the local copy now mirrors the server.
    FastForwarded,
}

/// `true` when the note carries edits the server has not seen.
pub fn has_local_changes(note: &Note) -> bool {
    !note.synced() || note.needs_content_sync()
}

/// Handles a server version that differs from the local copy.
pub fn report_conflict(handle: &mut NoteSyncHandle<'_>, server: Note) -> ConflictOutcome {
    if has_local_changes(handle.note()) {
        info!(
            "event=note_conflict module=sync status=ok guid={} local_usn={} server_usn={}",
            handle.note().guid(),
            handle.note().update_sequence_number(),
            server.update_sequence_number()
        );
        handle.set_conflicting_note(Some(server));
        handle.set_conflicting(true);
        return ConflictOutcome::Conflicting;
    }

    fast_forward(handle, &server);
    ConflictOutcome::FastForwarded
}

fn fast_forward(handle: &mut NoteSyncHandle<'_>, server: &Note) {
    {
        let note = handle.note_mut();
        note.set_notebook_guid(server.notebook_guid());
        note.set_created(server.created());
        note.set_updated(server.updated());
        note.set_title(server.title());
        note.set_tag_guids(server.tag_guids().to_vec());
        note.set_reminder_order(server.reminder_order());
        note.set_reminder_time(server.reminder_time());
        note.set_reminder_done_time(server.reminder_done_time());
        if server.is_loaded() {
            note.set_enml_content(server.enml_content());
        }
    }
    handle.set_deleted(server.deleted());
    for resource in server.resources().iter() {
        handle.add_resource(
            resource.hash(),
            resource.file_name(),
            resource.mime_type(),
            resource.data().to_vec(),
        );
    }
    let usn = server.update_sequence_number();
    handle.set_update_sequence_number(usn);
    handle.set_last_synced_sequence_number(usn);
    handle.recompute_synced();
    handle.set_conflicting_note(None);
    handle.set_conflicting(false);
    flush(handle);
}

/// Drops the parked server snapshot after the conflict was resolved elsewhere.
pub fn clear_conflict(handle: &mut NoteSyncHandle<'_>) {
    handle.set_conflicting_note(None);
    handle.set_conflicting(false);
}

/// Records a failed server operation.
pub fn report_sync_error(handle: &mut NoteSyncHandle<'_>, message: &str) {
    warn!(
        "event=note_sync module=sync status=error guid={} error={}",
        handle.note().guid(),
        message
    );
    handle.set_sync_error(true);
}

/// Records a successful server save that assigned `usn`.
pub fn report_saved(handle: &mut NoteSyncHandle<'_>, usn: u32) {
    handle.set_update_sequence_number(usn);
    handle.set_last_synced_sequence_number(usn);
    handle.set_sync_error(false);
    if let Err(err) = handle.sync_to_info_file() {
        warn!(
            "event=note_info_write module=sync status=error guid={} error={}",
            handle.note().guid(),
            err
        );
    }
}

/// Installs fetched content and caches it.
pub fn content_loaded(handle: &mut NoteSyncHandle<'_>, enml: &str) {
    handle.note_mut().set_enml_content(enml);
    handle.recompute_synced();
    handle.set_loading(false);
    handle.set_sync_error(false);
    flush(handle);
}

/// Installs one fetched resource payload.
pub fn resource_loaded(
    handle: &mut NoteSyncHandle<'_>,
    hash: &str,
    file_name: &str,
    mime_type: &str,
    data: Vec<u8>,
) {
    handle.add_resource(hash, file_name, mime_type, data);
    if let Err(err) = handle.sync_to_info_file() {
        warn!(
            "event=note_info_write module=sync status=error guid={} error={}",
            handle.note().guid(),
            err
        );
    }
}

/// Ends a fetch that did not deliver.
pub fn load_failed(handle: &mut NoteSyncHandle<'_>, message: &str) {
    handle.set_loading(false);
    report_sync_error(handle, message);
}

fn flush(handle: &NoteSyncHandle<'_>) {
    let result = handle
        .sync_to_info_file()
        .and_then(|()| handle.sync_to_cache_file());
    if let Err(err) = result {
        warn!(
            "event=note_flush module=sync status=error guid={} error={}",
            handle.note().guid(),
            err
        );
    }
}

#[cfg(test)]
mod tests {
    use super::{content_loaded, has_local_changes, report_conflict, ConflictOutcome};
    use crate::context::{NoteCommands, NoteContext};
    use crate::model::guid::NoteGuid;
    use crate::model::note::Note;
    use crate::sync::handle::NoteSyncHandle;
    use crate::sync::jobs::{FetchKind, JobPriority, JobQueue};
    use std::sync::Arc;

    struct Noop;

    impl JobQueue for Noop {
        fn enqueue_fetch(&self, _guid: &NoteGuid, _kind: FetchKind, _priority: JobPriority) {}
    }

    impl NoteCommands for Noop {
        fn save_note(&self, _guid: &NoteGuid) {}
        fn delete_note(&self, _guid: &NoteGuid) {}
    }

    fn context(root: &std::path::Path) -> NoteContext {
        NoteContext::new(root, Arc::new(Noop), Arc::new(Noop))
    }

    #[test]
    fn unsynced_note_parks_server_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let mut local = Note::new(ctx.clone(), NoteGuid::new("n"), 5);
        local.set_title("mine");
        assert!(has_local_changes(&local));

        let mut server = Note::from_server(ctx, NoteGuid::new("n"), 9);
        server.set_title("theirs");

        let mut handle = NoteSyncHandle::new(&mut local);
        assert_eq!(report_conflict(&mut handle, server), ConflictOutcome::Conflicting);
        assert!(local.conflicting());
        assert_eq!(local.title(), "mine");
        assert_eq!(local.conflicting_note().unwrap().title(), "theirs");
    }

    #[test]
    fn synced_note_fast_forwards() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let mut local = Note::new(ctx.clone(), NoteGuid::new("n"), 5);
        NoteSyncHandle::new(&mut local).set_last_synced_sequence_number(5);
        assert!(!has_local_changes(&local));

        let mut server = Note::from_server(ctx, NoteGuid::new("n"), 9);
        server.set_title("theirs");
        server.set_enml_content("<en-note>server</en-note>");

        let mut handle = NoteSyncHandle::new(&mut local);
        assert_eq!(
            report_conflict(&mut handle, server),
            ConflictOutcome::FastForwarded
        );
        assert_eq!(local.title(), "theirs");
        assert_eq!(local.enml_content(), "<en-note>server</en-note>");
        assert_eq!(local.update_sequence_number(), 9);
        assert!(local.synced());
        assert!(!local.needs_content_sync());
        assert!(!local.conflicting());
    }

    #[test]
    fn fast_forward_at_equal_sequence_number_leaves_no_pending_content() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let mut local = Note::new(ctx.clone(), NoteGuid::new("n"), 5);
        local.set_enml_content("<en-note>old</en-note>");
        NoteSyncHandle::new(&mut local).set_last_synced_sequence_number(5);

        let mut server = Note::from_server(ctx.clone(), NoteGuid::new("n"), 5);
        server.set_enml_content("<en-note>new</en-note>");
        let mut handle = NoteSyncHandle::new(&mut local);
        assert_eq!(
            report_conflict(&mut handle, server),
            ConflictOutcome::FastForwarded
        );
        assert!(handle.note().synced());
        assert!(!handle.note().needs_content_sync());
        assert!(!has_local_changes(handle.note()));

        let mut next = Note::from_server(ctx, NoteGuid::new("n"), 5);
        next.set_title("renamed");
        assert_eq!(
            report_conflict(&mut handle, next),
            ConflictOutcome::FastForwarded
        );
        assert_eq!(local.enml_content(), "<en-note>new</en-note>");
    }

    #[test]
    fn reloaded_content_of_a_synced_note_is_not_a_local_edit() {
        let dir = tempfile::tempdir().unwrap();
        let mut local = Note::new(context(dir.path()), NoteGuid::new("n"), 2);
        local.set_enml_content("<en-note>cached</en-note>");
        let mut handle = NoteSyncHandle::new(&mut local);
        handle.set_last_synced_sequence_number(2);

        content_loaded(&mut handle, "<en-note>fresh</en-note>");
        assert!(handle.note().synced());
        assert!(!handle.note().needs_content_sync());
    }
}
