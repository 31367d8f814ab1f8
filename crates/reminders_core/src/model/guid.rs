//! Note identity.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Prefix of guids minted locally before the server assigns a real one.
pub const LOCAL_GUID_PREFIX: &str = "local-";

/// Server-assigned (or local placeholder) note identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteGuid(String);

impl NoteGuid {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Mints a placeholder guid for a note composed offline.
    pub fn new_local() -> Self {
        Self(format!("{LOCAL_GUID_PREFIX}{}", Uuid::new_v4()))
    }

    /// `true` until the server has assigned the note a guid.
    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_GUID_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for NoteGuid {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NoteGuid {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NoteGuid {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NoteGuid {
    fn from(value: String) -> Self {
        Self(value)
    }
}
