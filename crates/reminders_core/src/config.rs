//! Core configuration.
//!
//! # Responsibility
//! - Load storage/logging settings from TOML.
//! - Validate paths and levels before anything touches disk.
//!
//! # Invariants
//! - `storage_root` and `log_dir` are absolute after validation.
//! - `log_level` is one of `trace|debug|info|warn|error`.

use crate::logging::{default_log_level, normalize_level};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration loading/validation failure.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// Settings for one note core instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreConfig {
    /// Directory holding note cache/info files and resource payloads.
    pub storage_root: PathBuf,
    /// Rolling log directory; logging stays off when unset.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default = "default_level_string")]
    pub log_level: String,
}

fn default_level_string() -> String {
    default_log_level().to_string()
}

impl CoreConfig {
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
            log_dir: None,
            log_level: default_level_string(),
        }
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(raw: &str) -> ConfigResult<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Checks paths and normalizes the log level in place.
    pub fn validate(&mut self) -> ConfigResult<()> {
        if !self.storage_root.is_absolute() {
            return Err(ConfigError::Invalid(format!(
                "storage_root must be an absolute path, got `{}`",
                self.storage_root.display()
            )));
        }
        if let Some(log_dir) = &self.log_dir {
            if !log_dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{}`",
                    log_dir.display()
                )));
            }
        }
        let level = normalize_level(&self.log_level)
            .map_err(|err| ConfigError::Invalid(err.to_string()))?;
        self.log_level = level.to_string();
        Ok(())
    }

    /// Creates the storage root if it does not exist yet.
    pub fn ensure_storage_root(&self) -> ConfigResult<()> {
        std::fs::create_dir_all(&self.storage_root).map_err(|source| ConfigError::Io {
            path: self.storage_root.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use crate::logging::default_log_level;

    #[test]
    fn parses_and_normalizes() {
        let config = CoreConfig::from_toml_str(
            "storage_root = \"/var/lib/reminders\"\nlog_dir = \"/var/log/reminders\"\nlog_level = \"WARNING\"\n",
        )
        .unwrap();
        assert_eq!(config.storage_root, std::path::Path::new("/var/lib/reminders"));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn defaults_log_level_by_build_mode() {
        let config = CoreConfig::from_toml_str("storage_root = \"/data\"").unwrap();
        assert_eq!(config.log_level, default_log_level());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn rejects_relative_paths_and_unknown_levels() {
        assert!(matches!(
            CoreConfig::from_toml_str("storage_root = \"data\""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CoreConfig::from_toml_str("storage_root = \"/data\"\nlog_level = \"loud\""),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CoreConfig::from_toml_str("storage_root = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_and_create_storage_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("store");
        let path = dir.path().join("core.toml");
        std::fs::write(&path, format!("storage_root = {:?}\n", root.to_str().unwrap())).unwrap();

        let config = CoreConfig::load(&path).unwrap();
        config.ensure_storage_root().unwrap();
        assert!(root.is_dir());
    }
}
