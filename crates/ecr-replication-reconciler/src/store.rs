//! Local persistence of the managed record.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ReconcileError, Result};
use crate::state::ManagedRecord;

/// JSON file holding at most one [`ManagedRecord`].
///
/// # Examples
///
/// ```rust
/// use ecr_replication_reconciler::StateFile;
///
/// let dir = tempfile::tempdir().unwrap();
/// let store = StateFile::new(dir.path().join("state.json"));
/// assert!(store.load().unwrap().is_none());
/// ```
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    /// Creates a store at `path`. Nothing is touched until the first call.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the record, `None` when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::State`] if the file cannot be read or parsed.
    pub fn load(&self) -> Result<Option<ManagedRecord>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.error(err)),
        };

        let record = serde_json::from_slice(&bytes)
            .map_err(|e| self.error(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        debug!(path = %self.path.display(), "loaded state");
        Ok(Some(record))
    }

    /// Saves the record, replacing the file atomically.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::State`] if the file cannot be written.
    pub fn save(&self, record: &ManagedRecord) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.error(e))?;
        }

        let json = serde_json::to_vec_pretty(record)
            .map_err(|e| self.error(io::Error::new(io::ErrorKind::InvalidData, e)))?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|e| self.error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.error(e))?;

        debug!(path = %self.path.display(), state = %record.state, "saved state");
        Ok(())
    }

    /// Persists `record`, or removes the file when there is none.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::State`] if the file cannot be written or removed.
    pub fn store(&self, record: Option<&ManagedRecord>) -> Result<()> {
        match record {
            Some(record) => self.save(record),
            None => self.clear(),
        }
    }

    /// Removes the file. Missing files are not an error.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::State`] if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(self.error(err)),
        }
    }

    fn error(&self, source: io::Error) -> ReconcileError {
        ReconcileError::State {
            path: self.path.clone(),
            source,
        }
    }
}
