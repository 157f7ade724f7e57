//! Folder intake: listing and moving the files the pipeline works on.
//!
//! The scanning device drops PDFs into the scan folder; the pipeline moves
//! them into the work folder before touching them, so a half-written file the
//! device is still flushing is never opened twice and a crashed run leaves an
//! obvious trail. Moves refuse to overwrite — an existing destination is a
//! skip, reported to the caller, never data loss.

use crate::error::SplitError;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, trace};

/// Create a folder (and parents) if it does not exist yet.
pub fn ensure_folder(path: &Path) -> Result<(), SplitError> {
    fs::create_dir_all(path).map_err(|e| SplitError::FolderInaccessible {
        path: path.to_path_buf(),
        source: e,
    })
}

/// List files with the given extension in `folder`, oldest first by creation
/// time, capped to `limit` when given.
///
/// The extension comparison is case-insensitive (`pdf` matches `SCAN001.PDF`).
pub fn oldest_files(
    folder: &Path,
    extension: &str,
    limit: Option<usize>,
) -> Result<Vec<PathBuf>, SplitError> {
    let entries = fs::read_dir(folder).map_err(|e| SplitError::FolderInaccessible {
        path: folder.to_path_buf(),
        source: e,
    })?;

    let mut files: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SplitError::FolderInaccessible {
            path: folder.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() || !has_extension(&path, extension) {
            continue;
        }
        // Creation time is unsupported on some filesystems; modification time
        // is the closest stand-in for "oldest scan first".
        let stamp = entry
            .metadata()
            .and_then(|m| m.created().or_else(|_| m.modified()))
            .unwrap_or(SystemTime::UNIX_EPOCH);
        files.push((stamp, path));
    }

    files.sort_by_key(|(stamp, _)| *stamp);
    let mut files: Vec<PathBuf> = files.into_iter().map(|(_, path)| path).collect();
    if let Some(limit) = limit {
        files.truncate(limit);
    }
    Ok(files)
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case(extension))
        .unwrap_or(false)
}

/// Move a file, creating the destination's parent folders as needed.
///
/// Returns `Ok(false)` without touching anything when the destination already
/// exists.
pub fn move_file(from: &Path, to: &Path) -> Result<bool, SplitError> {
    if let Some(parent) = to.parent() {
        ensure_folder(parent)?;
    }

    if to.exists() {
        debug!("not moving {}: {} already exists", from.display(), to.display());
        return Ok(false);
    }

    if fs::rename(from, to).is_err() {
        // rename fails across filesystems; fall back to copy + delete
        fs::copy(from, to).map_err(|e| SplitError::MoveFailed {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: e,
        })?;
        fs::remove_file(from).map_err(|e| SplitError::MoveFailed {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: e,
        })?;
    }

    trace!("moved {} to {}", from.display(), to.display());
    Ok(true)
}

/// Move up to `limit` of the oldest matching files from `from_folder` into
/// `to_folder`. Returns how many files were moved.
pub fn sweep_into(
    from_folder: &Path,
    to_folder: &Path,
    extension: &str,
    limit: usize,
) -> Result<usize, SplitError> {
    let files = oldest_files(from_folder, extension, Some(limit))?;
    let mut moved = 0;
    for file in &files {
        let Some(name) = file.file_name() else {
            continue;
        };
        if move_file(file, &to_folder.join(name))? {
            moved += 1;
        }
    }
    Ok(moved)
}
