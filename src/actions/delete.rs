//! Verified file deletion and empty directory removal.
//!
//! # Overview
//!
//! This module provides the single-item operations behind the executor:
//! - Permanent file deletion after a TOCTOU check against the scanned record
//! - Removal of directories that are still empty at removal time
//! - Validation that a selection never deletes its kept copy
//!
//! Deletion is permanent. Nothing is moved to a trash folder.
//!
//! # Example
//!
//! ```no_run
//! use treedupe::actions::delete::delete_verified;
//! use treedupe::scanner::FileRecord;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let record = FileRecord::new(PathBuf::from("/path/to/duplicate.txt"), 10, SystemTime::now());
//! match delete_verified(&record) {
//!     Ok(result) => println!("Deleted: {}", result.path.display()),
//!     Err(e) => eprintln!("Failed: {}", e),
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;

use crate::duplicates::Selection;
use crate::scanner::FileRecord;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// File was modified since scan (TOCTOU protection).
    #[error("file modified since scan: {0}")]
    Modified(PathBuf),

    /// The kept copy of a group is gone or changed, so its duplicates were left alone.
    #[error("kept copy unavailable, group skipped: {0}")]
    KeptCopyUnavailable(PathBuf),

    /// A selection listed its kept file for deletion.
    #[error("refusing to delete kept copy: {0}")]
    WouldDeleteKept(PathBuf),

    /// A directory gained entries after the scan.
    #[error("directory no longer empty: {0}")]
    DirectoryNotEmpty(PathBuf),

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Classify an I/O error by kind.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::Modified(p)
            | Self::KeptCopyUnavailable(p)
            | Self::WouldDeleteKept(p)
            | Self::DirectoryNotEmpty(p)
            | Self::Io { path: p, .. } => p,
        }
    }
}

/// Result of a successful deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteResult {
    /// Path that was deleted.
    pub path: PathBuf,
    /// Size of the deleted file in bytes.
    pub size: u64,
}

/// File metadata snapshot for TOCTOU verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSnapshot {
    /// Path to the file.
    pub path: PathBuf,
    /// File size in bytes.
    pub size: u64,
    /// Last modification time.
    pub mtime: Option<SystemTime>,
}

impl FileSnapshot {
    /// Snapshot of a file as the scan saw it.
    #[must_use]
    pub fn from_record(record: &FileRecord) -> Self {
        Self {
            path: record.path.clone(),
            size: record.size,
            mtime: Some(record.modified),
        }
    }

    /// Create a snapshot of a file's current state.
    ///
    /// Symlinks are followed, matching how the walker records them.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or can't be accessed.
    pub fn capture(path: &Path) -> Result<Self, DeleteError> {
        let metadata = fs::metadata(path).map_err(|e| DeleteError::from_io(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            size: metadata.len(),
            mtime: metadata.modified().ok(),
        })
    }

    /// Verify that the file still matches this snapshot.
    ///
    /// # Errors
    ///
    /// Returns error if file was modified, deleted, or can't be accessed.
    pub fn verify(&self) -> Result<(), DeleteError> {
        let current = Self::capture(&self.path)?;

        if let (Some(orig), Some(curr)) = (self.mtime, current.mtime) {
            if orig != curr {
                log::warn!(
                    "File modified since scan: {} (mtime changed)",
                    self.path.display()
                );
                return Err(DeleteError::Modified(self.path.clone()));
            }
        }

        if self.size != current.size {
            log::warn!(
                "File modified since scan: {} (size changed from {} to {})",
                self.path.display(),
                self.size,
                current.size
            );
            return Err(DeleteError::Modified(self.path.clone()));
        }

        Ok(())
    }
}

/// Permanently delete a scanned file after verifying it is unchanged.
///
/// A symlink record removes the link itself, never its target.
///
/// # Errors
///
/// - `Modified` if size or mtime changed since the scan
/// - `NotFound` / `PermissionDenied` / `Io` from the filesystem
pub fn delete_verified(record: &FileRecord) -> Result<DeleteResult, DeleteError> {
    FileSnapshot::from_record(record).verify()?;

    fs::remove_file(&record.path).map_err(|e| {
        log::error!("Delete failed for {}: {}", record.path.display(), e);
        DeleteError::from_io(&record.path, e)
    })?;

    log::debug!(
        "Deleted: {} ({} bytes)",
        record.path.display(),
        record.size
    );

    Ok(DeleteResult {
        path: record.path.clone(),
        size: record.size,
    })
}

/// Remove a directory if it is still empty.
///
/// # Errors
///
/// - `DirectoryNotEmpty` if anything appeared in it since the scan
/// - `NotFound` / `PermissionDenied` / `Io` from the filesystem
pub fn remove_empty_dir(path: &Path) -> Result<(), DeleteError> {
    // The listing handle must be closed before removal (Windows refuses otherwise)
    let is_empty = fs::read_dir(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .next()
        .is_none();
    if !is_empty {
        return Err(DeleteError::DirectoryNotEmpty(path.to_path_buf()));
    }

    fs::remove_dir(path).map_err(|e| DeleteError::from_io(path, e))?;
    log::debug!("Removed empty directory: {}", path.display());
    Ok(())
}

/// Validate that a selection keeps its kept file out of the delete set.
///
/// # Errors
///
/// `WouldDeleteKept` naming the kept path if it appears among the deletions.
pub fn validate_preserves_copy(selection: &Selection) -> Result<(), DeleteError> {
    if selection
        .delete
        .iter()
        .any(|record| record.path == selection.keep.path)
    {
        return Err(DeleteError::WouldDeleteKept(selection.keep.path.clone()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{Digest, HashAlgorithm};
    use std::time::Duration;
    use tempfile::TempDir;

    fn scanned(path: &Path) -> FileRecord {
        let metadata = fs::metadata(path).unwrap();
        FileRecord::new(
            path.to_path_buf(),
            metadata.len(),
            metadata.modified().unwrap(),
        )
    }

    #[test]
    fn test_delete_verified_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dup.txt");
        fs::write(&path, b"content").unwrap();

        let result = delete_verified(&scanned(&path)).unwrap();
        assert_eq!(result.size, 7);
        assert!(!path.exists());
    }

    #[test]
    fn test_delete_verified_refuses_modified_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dup.txt");
        fs::write(&path, b"content").unwrap();
        let record = scanned(&path);

        fs::write(&path, b"content plus more").unwrap();

        let err = delete_verified(&record).unwrap_err();
        assert!(matches!(err, DeleteError::Modified(_)));
        assert!(path.exists());
    }

    #[test]
    fn test_delete_verified_refuses_touched_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dup.txt");
        fs::write(&path, b"content").unwrap();
        let record = scanned(&path);

        let later = filetime::FileTime::from_system_time(
            record.modified + Duration::from_secs(3600),
        );
        filetime::set_file_mtime(&path, later).unwrap();

        assert!(matches!(
            delete_verified(&record),
            Err(DeleteError::Modified(_))
        ));
        assert!(path.exists());
    }

    #[test]
    fn test_delete_missing_file() {
        let dir = TempDir::new().unwrap();
        let record = FileRecord::new(dir.path().join("gone"), 1, SystemTime::now());
        assert!(matches!(
            delete_verified(&record),
            Err(DeleteError::NotFound(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_delete_symlink_keeps_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target");
        let link = dir.path().join("link");
        fs::write(&target, b"data").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let mut record = scanned(&link);
        record.is_symlink = true;

        delete_verified(&record).unwrap();
        assert!(!link.exists());
        assert!(target.exists());
    }

    #[test]
    fn test_remove_empty_dir() {
        let dir = TempDir::new().unwrap();
        let empty = dir.path().join("empty");
        fs::create_dir(&empty).unwrap();

        remove_empty_dir(&empty).unwrap();
        assert!(!empty.exists());
    }

    #[test]
    fn test_remove_empty_chain_child_then_parent() {
        let dir = TempDir::new().unwrap();
        let parent = dir.path().join("outer");
        let child = parent.join("inner");
        fs::create_dir_all(&child).unwrap();

        remove_empty_dir(&child).unwrap();
        remove_empty_dir(&parent).unwrap();
        assert!(!parent.exists());

        let err = remove_empty_dir(&parent).unwrap_err();
        assert!(matches!(err, DeleteError::NotFound(_)));
    }

    #[test]
    fn test_remove_dir_that_gained_entries() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("was_empty");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("new.txt"), b"x").unwrap();

        let err = remove_empty_dir(&target).unwrap_err();
        assert!(matches!(err, DeleteError::DirectoryNotEmpty(_)));
        assert!(target.join("new.txt").exists());
    }

    #[test]
    fn test_validate_preserves_copy() {
        let digest = Digest::new(HashAlgorithm::Blake3, vec![0; 32]);
        let keep = FileRecord::new(PathBuf::from("/keep"), 1, SystemTime::UNIX_EPOCH);
        let other = FileRecord::new(PathBuf::from("/other"), 1, SystemTime::UNIX_EPOCH);

        let good = Selection {
            digest: digest.clone(),
            size: 1,
            keep: keep.clone(),
            delete: vec![other],
        };
        assert!(validate_preserves_copy(&good).is_ok());

        let bad = Selection {
            digest,
            size: 1,
            keep: keep.clone(),
            delete: vec![keep],
        };
        assert!(matches!(
            validate_preserves_copy(&bad),
            Err(DeleteError::WouldDeleteKept(_))
        ));
    }

    #[test]
    fn test_error_path() {
        let err = DeleteError::DirectoryNotEmpty(PathBuf::from("/d"));
        assert_eq!(err.path(), Path::new("/d"));
        assert_eq!(err.to_string(), "directory no longer empty: /d");
    }
}
