//! C# source discovery.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use sharpen_core::SourceFile;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::backup::BACKUP_DIR_NAME;

/// Directories never descended into
pub const SKIPPED_DIRS: &[&str] = &["bin", "obj", ".git", "node_modules", BACKUP_DIR_NAME];

#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("Path does not exist: {0}")]
    NotFound(PathBuf),

    #[error("Failed to walk {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Collect the `.cs` files under `root`, sorted by path
///
/// `root` may also name a single file, which is returned as-is regardless
/// of its extension. Files that are not valid UTF-8 are skipped.
pub fn scan(root: &Path) -> Result<Vec<SourceFile>, ScanError> {
    if !root.exists() {
        return Err(ScanError::NotFound(root.to_path_buf()));
    }

    if root.is_file() {
        return Ok(read_source(root)?.into_iter().collect());
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry));

    for entry in walker {
        let entry = entry.map_err(|source| ScanError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && is_csharp_file(entry.path()) {
            if let Some(file) = read_source(entry.path())? {
                files.push(file);
            }
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    debug!(root = %root.display(), files = files.len(), "Scanned for C# sources");
    Ok(files)
}

/// `.cs` extension, any case
pub fn is_csharp_file(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("cs"))
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}

fn read_source(path: &Path) -> Result<Option<SourceFile>, ScanError> {
    let bytes = fs::read(path).map_err(|source| ScanError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    match String::from_utf8(bytes) {
        Ok(content) => Ok(Some(SourceFile::new(path, content))),
        Err(_) => {
            warn!(path = %path.display(), "Skipping file that is not valid UTF-8");
            Ok(None)
        }
    }
}
