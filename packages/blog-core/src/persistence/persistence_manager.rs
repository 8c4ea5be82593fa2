//! Persistence manager for the snapshot file.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::config::BlogConfig;
use crate::database::Database;
use crate::error::BlogError;

use super::io_utils::{classify_io_error, retry_io_operation};
use super::snapshot::{Snapshot, SnapshotFile};

/// Snapshot file name inside the data directory.
pub const SNAPSHOT_FILE: &str = "snapshot.json";

/// Reads and writes the store snapshot in a data directory.
#[derive(Debug, Clone)]
pub struct PersistenceManager {
    /// Data directory path
    data_dir: PathBuf,
    /// Maximum retry attempts for transient I/O errors
    max_retries: u32,
    /// Delay between retry attempts in milliseconds
    retry_delay_ms: u64,
}

impl PersistenceManager {
    /// Creates a persistence manager for `data_dir` using the retry
    /// settings from `config`.
    pub fn new(data_dir: impl Into<PathBuf>, config: &BlogConfig) -> Self {
        Self {
            data_dir: data_dir.into(),
            max_retries: config.persistence_max_retries,
            retry_delay_ms: config.persistence_retry_delay_ms,
        }
    }

    /// Creates a persistence manager when the config names a data directory.
    pub fn from_config(config: &BlogConfig) -> Option<Self> {
        config
            .data_dir
            .as_ref()
            .map(|dir| Self::new(dir.clone(), config))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(SNAPSHOT_FILE)
    }

    /// Writes the current contents of `db` to disk.
    pub fn save_snapshot(&self, db: &Database) -> Result<(), BlogError> {
        let snapshot = db.snapshot()?;
        let file = SnapshotFile::seal(&snapshot)?;
        let bytes = serde_json::to_vec_pretty(&file)?;
        retry_io_operation(
            || self.write_atomic(&bytes),
            self.max_retries,
            self.retry_delay_ms,
            "save_snapshot",
        )?;
        tracing::debug!(
            "Saved snapshot with {} posts and {} categories to {}",
            snapshot.posts.len(),
            snapshot.categories.len(),
            self.snapshot_path().display()
        );
        Ok(())
    }

    /// Reads the snapshot from disk.
    ///
    /// # Returns
    /// `Ok(None)` when no snapshot has been written yet.
    pub fn load_snapshot(&self) -> Result<Option<Snapshot>, BlogError> {
        let path = self.snapshot_path();
        if !path.exists() {
            return Ok(None);
        }

        let contents = retry_io_operation(
            || read_file(&path),
            self.max_retries,
            self.retry_delay_ms,
            "load_snapshot",
        )?;
        let file: SnapshotFile = serde_json::from_slice(&contents).map_err(|e| {
            BlogError::DataCorruption(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        file.open().map(Some)
    }

    /// Loads the snapshot into a new database, if one exists.
    pub fn load_database(&self) -> Result<Option<Database>, BlogError> {
        self.load_snapshot()?
            .map(Database::from_snapshot)
            .transpose()
    }

    fn write_atomic(&self, bytes: &[u8]) -> Result<(), BlogError> {
        fs::create_dir_all(&self.data_dir)
            .map_err(|e| classify_io_error(e, "Failed to create data directory"))?;

        let temp_path = self.data_dir.join(format!("{}.tmp", SNAPSHOT_FILE));
        let final_path = self.snapshot_path();

        let mut file = File::create(&temp_path)
            .map_err(|e| classify_io_error(e, "Failed to create temp file"))?;
        file.write_all(bytes)
            .map_err(|e| classify_io_error(e, "Failed to write snapshot"))?;
        file.sync_all()
            .map_err(|e| classify_io_error(e, "Failed to sync snapshot"))?;

        fs::rename(&temp_path, &final_path)
            .map_err(|e| classify_io_error(e, "Failed to rename snapshot file"))?;
        Ok(())
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, BlogError> {
    let mut file =
        File::open(path).map_err(|e| classify_io_error(e, "Failed to open snapshot file"))?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)
        .map_err(|e| classify_io_error(e, "Failed to read snapshot file"))?;
    Ok(contents)
}
