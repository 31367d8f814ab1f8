//! File-backed persistence for note metadata and content.
//!
//! # Responsibility
//! - Map a note guid onto its cache (`.enml`) and info (`.info`) files.
//! - Encode/decode note metadata as TOML.
//!
//! # Invariants
//! - Both files of one note live directly under the storage root.
//! - Missing files are "not persisted yet", never an error.

pub mod note_files;

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub type StorageResult<T> = Result<T, StorageError>;

/// Local storage failure for cache/info files.
#[derive(Debug)]
pub enum StorageError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Decode {
        path: PathBuf,
        source: toml::de::Error,
    },
    Encode(toml::ser::Error),
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "storage i/o failed at `{}`: {source}", path.display())
            }
            Self::Decode { path, source } => {
                write!(f, "invalid note info file `{}`: {source}", path.display())
            }
            Self::Encode(err) => write!(f, "failed to encode note info: {err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Decode { source, .. } => Some(source),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<toml::ser::Error> for StorageError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Encode(value)
    }
}
