//! Note attachments.
//!
//! # Responsibility
//! - Represent one binary attachment identified by its content hash.
//! - Cache payloads on disk under the storage root.
//! - Keep a per-note, hash-deduplicated resource set.
//!
//! # Invariants
//! - `hash` is unique inside one [`ResourceStore`].
//! - `is_cached()` reflects the payload file on disk, not the in-memory copy.

use log::{debug, warn};
use md5::{Digest, Md5};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";
const DEFAULT_EXTENSION: &str = "bin";

pub type ResourceResult<T> = Result<T, ResourceError>;

/// Resource payload I/O failure.
#[derive(Debug)]
pub enum ResourceError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for ResourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "resource i/o failed at `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ResourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Returns the MIME type for a file name, by extension.
pub fn mime_type_for(file_name: &str) -> &'static str {
    mime_guess::from_path(file_name)
        .first_raw()
        .unwrap_or(DEFAULT_MIME_TYPE)
}

/// Cache file extension: the file's own one when it fits `mime_type`,
/// otherwise the first registered for `mime_type`.
fn extension_for(file_name: &str, mime_type: &str) -> String {
    let Some(known) = mime_guess::get_mime_extensions_str(mime_type) else {
        return DEFAULT_EXTENSION.to_string();
    };
    let own = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match own {
        Some(ext) if known.contains(&ext.as_str()) => ext,
        _ => known
            .first()
            .map_or_else(|| DEFAULT_EXTENSION.to_string(), |ext| ext.to_string()),
    }
}

/// Hex MD5 of `data`, the hash the note service keys resources by.
pub fn content_hash(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// One attachment of a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    hash: String,
    file_name: String,
    mime_type: String,
    data: Vec<u8>,
    cache_path: PathBuf,
}

impl Resource {
    /// Creates a resource record. The payload is not written to disk.
    pub fn new(
        storage_root: &Path,
        hash: impl Into<String>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        let hash = hash.into();
        let file_name = file_name.into();
        let mime_type = mime_type.into();
        let extension = extension_for(&file_name, &mime_type);
        let cache_path = storage_root.join(format!("{hash}.{extension}"));
        Self {
            hash,
            file_name,
            mime_type,
            data,
            cache_path,
        }
    }

    /// Imports a local file: hashes it, derives the MIME type and caches it.
    pub fn from_file(storage_root: &Path, path: &Path) -> ResourceResult<Self> {
        let data = std::fs::read(path).map_err(|source| ResourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime_type = mime_type_for(&file_name);
        let hash = content_hash(&data);

        let mut resource = Self::new(storage_root, hash, file_name, mime_type, Vec::new());
        resource.set_data(data)?;
        debug!(
            "event=resource_import module=resource status=ok hash={} type={}",
            resource.hash, resource.mime_type
        );
        Ok(resource)
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// In-memory payload; empty until set or loaded.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    pub fn is_cached(&self) -> bool {
        self.cache_path.is_file()
    }

    /// Replaces the payload and writes it to the cache file.
    pub fn set_data(&mut self, data: Vec<u8>) -> ResourceResult<()> {
        if let Some(parent) = self.cache_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ResourceError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.cache_path, &data).map_err(|source| ResourceError::Io {
            path: self.cache_path.clone(),
            source,
        })?;
        self.data = data;
        Ok(())
    }
}

/// Hash-keyed resources of one note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceStore {
    resources: BTreeMap<String, Resource>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource, deduplicating by hash.
    ///
    /// An existing entry keeps its metadata; its payload is replaced only when
    /// `data` is non-empty. Returns `true` when a new entry was created.
    pub fn add(
        &mut self,
        storage_root: &Path,
        hash: &str,
        file_name: &str,
        mime_type: &str,
        data: Vec<u8>,
    ) -> bool {
        if let Some(existing) = self.resources.get_mut(hash) {
            if !data.is_empty() {
                if let Err(err) = existing.set_data(data) {
                    warn!(
                        "event=resource_write module=resource status=error hash={} error={}",
                        hash, err
                    );
                }
            }
            return false;
        }

        let mut resource = Resource::new(storage_root, hash, file_name, mime_type, Vec::new());
        if !data.is_empty() {
            if let Err(err) = resource.set_data(data) {
                warn!(
                    "event=resource_write module=resource status=error hash={} error={}",
                    hash, err
                );
            }
        }
        self.resources.insert(hash.to_string(), resource);
        true
    }

    /// Inserts an already built resource, replacing one with the same hash.
    pub fn insert(&mut self, resource: Resource) {
        self.resources.insert(resource.hash.clone(), resource);
    }

    pub fn get(&self, hash: &str) -> Option<&Resource> {
        self.resources.get(hash)
    }

    /// Resources in hash order.
    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// `true` when every resource payload is on disk.
    pub fn all_cached(&self) -> bool {
        self.resources.values().all(Resource::is_cached)
    }
}

#[cfg(test)]
mod tests {
    use super::{content_hash, mime_type_for, Resource, ResourceStore};

    #[test]
    fn mime_types_follow_extension() {
        assert_eq!(mime_type_for("photo.JPG"), "image/jpeg");
        assert_eq!(mime_type_for("scan.pdf"), "application/pdf");
        assert_eq!(mime_type_for("archive"), "application/octet-stream");
        assert_eq!(mime_type_for("cover.webp"), "image/webp");
        assert_eq!(
            mime_type_for("report.docx"),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
    }

    #[test]
    fn content_hash_is_hex_md5() {
        assert_eq!(content_hash(b""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn cache_path_uses_hash_and_extension() {
        let dir = tempfile::tempdir().unwrap();
        let resource = Resource::new(dir.path(), "abc", "a.png", "image/png", Vec::new());
        assert_eq!(resource.cache_path(), dir.path().join("abc.png"));
        let other = Resource::new(dir.path(), "def", "a", "application/x-foo", Vec::new());
        assert_eq!(other.cache_path(), dir.path().join("def.bin"));
        let photo = Resource::new(dir.path(), "f00", "IMG.JPG", "image/jpeg", Vec::new());
        assert_eq!(photo.cache_path(), dir.path().join("f00.jpg"));
        let renamed = Resource::new(dir.path(), "0ff", "scan", "application/pdf", Vec::new());
        assert_eq!(renamed.cache_path(), dir.path().join("0ff.pdf"));
    }

    #[test]
    fn duplicate_hash_updates_payload_only_when_non_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ResourceStore::new();
        assert!(store.add(dir.path(), "h1", "a.png", "image/png", b"one".to_vec()));
        assert!(!store.add(dir.path(), "h1", "b.png", "image/png", b"two".to_vec()));
        assert!(!store.add(dir.path(), "h1", "c.png", "image/png", Vec::new()));

        assert_eq!(store.len(), 1);
        let resource = store.get("h1").unwrap();
        assert_eq!(resource.data(), b"two");
        assert_eq!(resource.file_name(), "a.png");
        assert!(resource.is_cached());
    }

    #[test]
    fn from_file_hashes_and_caches() {
        let source_dir = tempfile::tempdir().unwrap();
        let storage = tempfile::tempdir().unwrap();
        let path = source_dir.path().join("pic.gif");
        std::fs::write(&path, b"GIF89a").unwrap();

        let resource = Resource::from_file(storage.path(), &path).unwrap();
        assert_eq!(resource.hash(), content_hash(b"GIF89a"));
        assert_eq!(resource.mime_type(), "image/gif");
        assert_eq!(resource.file_name(), "pic.gif");
        assert!(resource.is_cached());
        assert!(path.exists());
    }
}
