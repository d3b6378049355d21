//! File-backed token storage
//!
//! Each key is a file inside a single directory. Used where no OS keyring
//! is available (headless Linux, containers).

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use directories::ProjectDirs;

use crate::error::{Result, WoodstoveError};
use crate::storage::TokenStorage;

/// [`TokenStorage`] storing one file per key.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Uses `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`WoodstoveError::Storage`] if the directory cannot be created.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .context("Failed to create token directory")
            .map_err(|e| WoodstoveError::Storage(format!("{e:#}")))?;
        Ok(Self { dir })
    }

    /// Uses the platform data directory (e.g. `~/.local/share/woodstove`).
    ///
    /// # Errors
    ///
    /// Returns [`WoodstoveError::Storage`] if the data directory cannot be
    /// determined or created.
    pub fn in_data_dir() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "woodstove", "woodstove")
            .ok_or_else(|| WoodstoveError::Storage("Could not determine data directory".into()))?;
        Self::new(proj_dirs.data_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(WoodstoveError::Storage(format!("invalid storage key: {key:?}")).into());
        }
        Ok(self.dir.join(key))
    }
}

impl TokenStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents.trim_end().to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(WoodstoveError::Io(e).into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        std::fs::write(&path, value).map_err(WoodstoveError::Io)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .map_err(WoodstoveError::Io)?;
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WoodstoveError::Io(e).into()),
        }
    }
}
