//! Timestamped backups of files before they are rewritten
//!
//! Each run gets one snapshot directory under
//! `<project>/.sharpen-backup/<YYYYMMDD-HHMMSS>`. Originals are stored flat
//! by file name; name clashes within a snapshot get `_1`, `_2`, ... suffixes.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, Local, NaiveDateTime};
use tracing::{debug, info, warn};

/// Directory created in the project root to hold snapshots
pub const BACKUP_DIR_NAME: &str = ".sharpen-backup";

/// Snapshot directory name format
pub const SNAPSHOT_FORMAT: &str = "%Y%m%d-%H%M%S";

#[derive(thiserror::Error, Debug)]
pub enum BackupError {
    #[error("Failed to create backup directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write backup {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read backup directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Backup target has no file name: {0}")]
    NoFileName(PathBuf),
}

#[derive(Debug, Clone)]
pub struct BackupManager {
    base_dir: PathBuf,
    timestamp: NaiveDateTime,
}

impl BackupManager {
    /// Snapshot named after the current local time
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self::with_timestamp(project_root, Local::now().naive_local())
    }

    pub fn with_timestamp(project_root: impl AsRef<Path>, timestamp: NaiveDateTime) -> Self {
        Self {
            base_dir: project_root.as_ref().join(BACKUP_DIR_NAME),
            timestamp,
        }
    }

    /// `<project>/.sharpen-backup`
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// The directory this run writes into
    pub fn snapshot_dir(&self) -> PathBuf {
        self.base_dir
            .join(self.timestamp.format(SNAPSHOT_FORMAT).to_string())
    }

    /// Store `content` as the original of `path`, returning the backup location
    pub fn backup(&self, path: &Path, content: &str) -> Result<PathBuf, BackupError> {
        let dir = self.snapshot_dir();
        fs::create_dir_all(&dir).map_err(|source| BackupError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let file_name = path
            .file_name()
            .ok_or_else(|| BackupError::NoFileName(path.to_path_buf()))?;
        let mut target = dir.join(file_name);

        if target.exists() {
            let stem = Path::new(file_name)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let extension = Path::new(file_name)
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default();
            let mut counter = 1;
            while target.exists() {
                target = dir.join(format!("{stem}_{counter}{extension}"));
                counter += 1;
            }
        }

        fs::write(&target, content).map_err(|source| BackupError::Write {
            path: target.clone(),
            source,
        })?;
        debug!(original = %path.display(), backup = %target.display(), "Backed up file");
        Ok(target)
    }

    /// Files stored in this run's snapshot, sorted
    pub fn available(&self) -> Result<Vec<PathBuf>, BackupError> {
        let dir = self.snapshot_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&dir).map_err(|source| BackupError::ReadDir {
            path: dir.clone(),
            source,
        })?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        Ok(files)
    }

    /// Remove snapshots older than `keep_days` days, returning how many
    pub fn cleanup(&self, keep_days: u32) -> Result<usize, BackupError> {
        let cutoff = Local::now().naive_local() - Duration::days(i64::from(keep_days));
        self.cleanup_before(cutoff)
    }

    /// Remove snapshots stamped before `cutoff`
    ///
    /// Only directories whose names parse as snapshot timestamps are
    /// considered, and the current snapshot is always kept.
    pub fn cleanup_before(&self, cutoff: NaiveDateTime) -> Result<usize, BackupError> {
        if !self.base_dir.exists() {
            return Ok(0);
        }
        let entries = fs::read_dir(&self.base_dir).map_err(|source| BackupError::ReadDir {
            path: self.base_dir.clone(),
            source,
        })?;

        let current = self.snapshot_dir();
        let mut removed = 0;
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if !path.is_dir() || path == current {
                continue;
            }
            let stamp = entry
                .file_name()
                .to_str()
                .and_then(|name| NaiveDateTime::parse_from_str(name, SNAPSHOT_FORMAT).ok());
            let Some(stamp) = stamp else {
                continue;
            };
            if stamp < cutoff {
                match fs::remove_dir_all(&path) {
                    Ok(()) => removed += 1,
                    Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove old backup"),
                }
            }
        }

        if removed > 0 {
            info!(removed, "Removed old backup snapshots");
        }
        Ok(removed)
    }
}
