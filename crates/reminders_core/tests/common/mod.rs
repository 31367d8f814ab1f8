#![allow(dead_code)]

use reminders_core::content::ENML_HEADER;
use reminders_core::{
    FetchKind, JobPriority, JobQueue, NoteChange, NoteCommands, NoteContext, NoteGuid,
    NoteObserver,
};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Default)]
pub struct RecordingJobs {
    pub fetches: Mutex<Vec<(NoteGuid, FetchKind, JobPriority)>>,
}

impl JobQueue for RecordingJobs {
    fn enqueue_fetch(&self, guid: &NoteGuid, kind: FetchKind, priority: JobPriority) {
        self.fetches
            .lock()
            .unwrap()
            .push((guid.clone(), kind, priority));
    }
}

#[derive(Default)]
pub struct RecordingCommands {
    pub saved: Mutex<Vec<NoteGuid>>,
    pub deleted: Mutex<Vec<NoteGuid>>,
}

impl NoteCommands for RecordingCommands {
    fn save_note(&self, guid: &NoteGuid) {
        self.saved.lock().unwrap().push(guid.clone());
    }

    fn delete_note(&self, guid: &NoteGuid) {
        self.deleted.lock().unwrap().push(guid.clone());
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    pub changes: Mutex<Vec<(NoteGuid, NoteChange)>>,
}

impl RecordingObserver {
    pub fn count(&self, change: NoteChange) -> usize {
        self.changes
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, seen)| *seen == change)
            .count()
    }
}

impl NoteObserver for RecordingObserver {
    fn note_changed(&self, guid: &NoteGuid, change: NoteChange) {
        self.changes.lock().unwrap().push((guid.clone(), change));
    }
}

pub struct Harness {
    pub dir: TempDir,
    pub jobs: Arc<RecordingJobs>,
    pub commands: Arc<RecordingCommands>,
    pub context: NoteContext,
}

pub fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let jobs = Arc::new(RecordingJobs::default());
    let commands = Arc::new(RecordingCommands::default());
    let context = NoteContext::new(dir.path(), jobs.clone(), commands.clone());
    Harness {
        dir,
        jobs,
        commands,
        context,
    }
}

pub fn enml(body: &str) -> String {
    format!("{ENML_HEADER}<en-note>{body}</en-note>")
}
