//! Cache and info files of one note.
//!
//! # Responsibility
//! - Derive `note-<guid>.enml` / `note-<guid>.info` under the storage root.
//! - Read and write both files independently.
//!
//! # Invariants
//! - Info writes are read-modify-write so fields owned by another flush
//!   (the tagline) survive.
//! - Removing a file that does not exist succeeds.

use crate::model::guid::NoteGuid;
use crate::repo::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Metadata persisted in a note's info file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NoteInfo {
    /// Unix epoch milliseconds.
    pub created: i64,
    pub title: String,
    /// Unix epoch milliseconds.
    pub updated: i64,
    pub notebook_guid: String,
    pub tag_guids: Vec<String>,
    /// Reminder sort key; `0` means no reminder.
    pub reminder_order: i64,
    pub reminder_time: Option<i64>,
    pub reminder_done_time: Option<i64>,
    pub deleted: bool,
    /// First characters of the plaintext content, written with the cache file.
    pub tagline: String,
    pub last_synced_sequence_number: u32,
    pub needs_content_sync: bool,
    /// Keyed by content hash.
    pub resources: BTreeMap<String, ResourceInfo>,
}

/// Resource metadata; payloads live in their own files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceInfo {
    pub file_name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

/// File locations for one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFiles {
    cache_file: PathBuf,
    info_file: PathBuf,
}

impl NoteFiles {
    pub fn new(storage_root: &Path, guid: &NoteGuid) -> Self {
        Self {
            cache_file: storage_root.join(format!("note-{guid}.enml")),
            info_file: storage_root.join(format!("note-{guid}.info")),
        }
    }

    pub fn cache_file(&self) -> &Path {
        &self.cache_file
    }

    pub fn info_file(&self) -> &Path {
        &self.info_file
    }

    pub fn has_cache(&self) -> bool {
        self.cache_file.is_file()
    }

    pub fn has_info(&self) -> bool {
        self.info_file.is_file()
    }

    /// Returns `None` when no info file exists yet.
    pub fn read_info(&self) -> StorageResult<Option<NoteInfo>> {
        let raw = match std::fs::read_to_string(&self.info_file) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StorageError::io(&self.info_file, err)),
        };
        toml::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Decode {
                path: self.info_file.clone(),
                source,
            })
    }

    pub fn write_info(&self, info: &NoteInfo) -> StorageResult<()> {
        let encoded = toml::to_string(info)?;
        write_file(&self.info_file, encoded.as_bytes())
    }

    /// Applies `update` to the stored metadata (or defaults) and writes it back.
    pub fn update_info(&self, update: impl FnOnce(&mut NoteInfo)) -> StorageResult<()> {
        let mut info = self.read_info()?.unwrap_or_default();
        update(&mut info);
        self.write_info(&info)
    }

    pub fn read_cache(&self) -> StorageResult<String> {
        std::fs::read_to_string(&self.cache_file)
            .map_err(|err| StorageError::io(&self.cache_file, err))
    }

    pub fn write_cache(&self, enml: &str) -> StorageResult<()> {
        write_file(&self.cache_file, enml.as_bytes())
    }

    pub fn remove_info(&self) -> StorageResult<()> {
        remove_file(&self.info_file)
    }

    pub fn remove_cache(&self) -> StorageResult<()> {
        remove_file(&self.cache_file)
    }

    /// Moves the cache file to `target`'s location, if there is one.
    pub fn rename_cache_to(&self, target: &NoteFiles) -> StorageResult<()> {
        if !self.has_cache() {
            return Ok(());
        }
        std::fs::rename(&self.cache_file, &target.cache_file)
            .map_err(|err| StorageError::io(&self.cache_file, err))
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| StorageError::io(parent, err))?;
    }
    std::fs::write(path, bytes).map_err(|err| StorageError::io(path, err))
}

fn remove_file(path: &Path) -> StorageResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(StorageError::io(path, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::{NoteFiles, NoteInfo, ResourceInfo};
    use crate::model::guid::NoteGuid;
    use crate::repo::StorageError;

    #[test]
    fn paths_follow_guid() {
        let files = NoteFiles::new(std::path::Path::new("/data"), &NoteGuid::new("abc"));
        assert_eq!(files.cache_file(), std::path::Path::new("/data/note-abc.enml"));
        assert_eq!(files.info_file(), std::path::Path::new("/data/note-abc.info"));
    }

    #[test]
    fn info_roundtrips_with_resource_tables() {
        let dir = tempfile::tempdir().unwrap();
        let files = NoteFiles::new(dir.path(), &NoteGuid::new("n1"));
        assert!(files.read_info().unwrap().is_none());

        let mut info = NoteInfo {
            title: "Groceries".to_string(),
            tag_guids: vec!["t1".to_string(), "t2".to_string()],
            reminder_time: Some(1_700_000_000_000),
            last_synced_sequence_number: 42,
            ..NoteInfo::default()
        };
        info.resources.insert(
            "f00d".to_string(),
            ResourceInfo {
                file_name: "a.png".to_string(),
                mime_type: "image/png".to_string(),
            },
        );
        files.write_info(&info).unwrap();

        let raw = std::fs::read_to_string(files.info_file()).unwrap();
        assert!(raw.contains("lastSyncedSequenceNumber = 42"));
        assert!(raw.contains("[resources.f00d]"));
        assert_eq!(files.read_info().unwrap(), Some(info));
    }

    #[test]
    fn update_info_keeps_other_fields() {
        let dir = tempfile::tempdir().unwrap();
        let files = NoteFiles::new(dir.path(), &NoteGuid::new("n1"));
        files.update_info(|info| info.tagline = "hello".to_string()).unwrap();
        files.update_info(|info| info.title = "T".to_string()).unwrap();
        let info = files.read_info().unwrap().unwrap();
        assert_eq!(info.tagline, "hello");
        assert_eq!(info.title, "T");
    }

    #[test]
    fn garbage_info_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let files = NoteFiles::new(dir.path(), &NoteGuid::new("n1"));
        std::fs::write(files.info_file(), "title = [").unwrap();
        assert!(matches!(files.read_info(), Err(StorageError::Decode { .. })));
    }

    #[test]
    fn cache_rename_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let old = NoteFiles::new(dir.path(), &NoteGuid::new("a"));
        let new = NoteFiles::new(dir.path(), &NoteGuid::new("b"));
        old.write_cache("<en-note/>").unwrap();
        old.rename_cache_to(&new).unwrap();
        assert!(!old.has_cache());
        assert_eq!(new.read_cache().unwrap(), "<en-note/>");
        new.remove_cache().unwrap();
        new.remove_cache().unwrap();
        old.remove_info().unwrap();
    }
}
