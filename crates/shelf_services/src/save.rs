//! Snapshot persistence
//!
//! The registry produces snapshot text; this stores it between sessions.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("failed to read snapshot '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write snapshot '{}'", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One snapshot file on disk.
#[derive(Debug, Clone)]
pub struct SnapshotSlot {
    path: PathBuf,
}

impl SnapshotSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored text, or `None` if nothing was saved yet.
    pub fn read(&self) -> Result<Option<String>, SaveError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SaveError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    pub fn write(&self, text: &str) -> Result<(), SaveError> {
        let write_err = |source| SaveError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(write_err)?;
        }
        std::fs::write(&self.path, text).map_err(write_err)?;
        tracing::info!(path = %self.path.display(), bytes = text.len(), "snapshot saved");
        Ok(())
    }
}
