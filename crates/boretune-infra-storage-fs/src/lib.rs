use boretune_ports::storage::{SettingsDto, StorageError, StoragePort};
use log::debug;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

const SETTINGS_FILE: &str = "settings.json";

/// Settings kept as pretty-printed JSON in one directory.
///
/// Only settings that validate are written or handed back. Saves go through
/// a temporary file in the same directory, so a crash never leaves half a
/// file behind.
pub struct FsStorage {
    dir: PathBuf,
}

impl FsStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<config dir>/boretune`
    pub fn default_dir() -> Result<PathBuf, StorageError> {
        let base = dirs_next::config_dir().ok_or(StorageError::NoConfigDir)?;
        Ok(base.join("boretune"))
    }

    /// Storage in [`FsStorage::default_dir`].
    pub fn in_config_dir() -> Result<Self, StorageError> {
        Self::default_dir().map(Self::new)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }

    fn parse(path: &Path, data: &[u8]) -> Result<SettingsDto, StorageError> {
        let settings: SettingsDto =
            serde_json::from_slice(data).map_err(|e| StorageError::Malformed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        settings.validate().map_err(|source| StorageError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(settings)
    }

    fn write_atomically(&self, path: &Path, data: &[u8]) -> Result<(), StorageError> {
        let write_error = |e: std::io::Error| StorageError::Write {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        fs::create_dir_all(&self.dir).map_err(write_error)?;
        let mut file = NamedTempFile::new_in(&self.dir).map_err(write_error)?;
        file.write_all(data).map_err(write_error)?;
        file.persist(path).map_err(|e| write_error(e.error))?;
        Ok(())
    }
}

impl StoragePort for FsStorage {
    fn load_settings(&self) -> Result<SettingsDto, StorageError> {
        let path = self.settings_path();
        match fs::read(&path) {
            Ok(data) => Self::parse(&path, &data),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no settings at {}, using defaults", path.display());
                Ok(SettingsDto::default())
            }
            Err(e) => Err(StorageError::Read {
                path,
                reason: e.to_string(),
            }),
        }
    }

    fn save_settings(&self, settings: &SettingsDto) -> Result<(), StorageError> {
        let path = self.settings_path();
        settings.validate().map_err(|source| StorageError::Invalid {
            path: path.clone(),
            source,
        })?;
        let data = serde_json::to_vec_pretty(settings).map_err(|e| StorageError::Write {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        self.write_atomically(&path, &data)
    }
}
