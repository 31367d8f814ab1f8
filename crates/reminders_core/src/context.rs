//! Collaborators shared by every note of one store.

use crate::config::CoreConfig;
use crate::model::guid::NoteGuid;
use crate::sync::jobs::JobQueue;
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Server-side note commands the entity delegates to.
pub trait NoteCommands: Send + Sync {
    fn save_note(&self, guid: &NoteGuid);
    fn delete_note(&self, guid: &NoteGuid);
}

/// Storage root plus the job/command collaborators.
#[derive(Clone)]
pub struct NoteContext {
    storage_root: PathBuf,
    jobs: Arc<dyn JobQueue>,
    commands: Arc<dyn NoteCommands>,
}

impl NoteContext {
    pub fn new(
        storage_root: impl Into<PathBuf>,
        jobs: Arc<dyn JobQueue>,
        commands: Arc<dyn NoteCommands>,
    ) -> Self {
        Self {
            storage_root: storage_root.into(),
            jobs,
            commands,
        }
    }

    /// Binds a validated configuration to the collaborators.
    pub fn from_config(
        config: &CoreConfig,
        jobs: Arc<dyn JobQueue>,
        commands: Arc<dyn NoteCommands>,
    ) -> Self {
        Self::new(config.storage_root.clone(), jobs, commands)
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    pub fn jobs(&self) -> &dyn JobQueue {
        self.jobs.as_ref()
    }

    pub fn commands(&self) -> &dyn NoteCommands {
        self.commands.as_ref()
    }
}

impl Debug for NoteContext {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NoteContext")
            .field("storage_root", &self.storage_root)
            .finish_non_exhaustive()
    }
}
