//! Scanner module for directory traversal and file hashing.
//!
//! This module provides functionality for:
//! - Path eligibility filtering (extension allow-list, blacklist tokens)
//! - Directory walking with transitive empty-directory detection
//! - Streaming content hashing (BLAKE3, SHA-256, MD5)
//! - Physical file identity tracking (hardlinks and file symlinks)
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`filter`]: Extension and blacklist matching
//! - [`walker`]: Directory traversal and file discovery
//! - [`hasher`]: Chunked file hashing
//! - [`hardlink`]: Inode tracking
//!
//! # Example
//!
//! ```no_run
//! use treedupe::scanner::{PathFilter, Walker};
//! use std::path::Path;
//!
//! let filter = PathFilter::new(&["jpg".to_string()], &[".git".to_string()], Default::default());
//! let walker = Walker::new(Path::new("."), filter);
//! let outcome = walker.walk();
//! for file in &outcome.files {
//!     println!("{}: {} bytes", file.path.display(), file.size);
//! }
//! ```

pub mod filter;
pub mod hardlink;
pub mod hasher;
pub mod walker;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

// Re-export main types
pub use filter::{BlacklistMode, PathFilter};
pub use hasher::{digest_to_hex, Digest, HashAlgorithm, Hasher, CHUNK_SIZE};
pub use walker::{WalkOutcome, Walker, WalkerConfig};

/// Metadata for a discovered file.
///
/// Created by the walker. The digest stays `None` until the file is hashed,
/// and is never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
    /// Whether the path is a symbolic link to a regular file
    pub is_symlink: bool,
    /// Content digest, populated by the hashing phase
    pub digest: Option<Digest>,
}

impl FileRecord {
    /// Create a new record without a digest.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the file
    /// * `size` - File size in bytes
    /// * `modified` - Last modification time
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: SystemTime) -> Self {
        Self {
            path,
            size,
            modified,
            is_symlink: false,
            digest: None,
        }
    }

    /// Return this record with its digest populated.
    ///
    /// A record that already carries a digest is returned unchanged.
    #[must_use]
    pub fn with_digest(mut self, digest: Digest) -> Self {
        if self.digest.is_none() {
            self.digest = Some(digest);
        }
        self
    }
}

/// Errors that can occur during directory scanning.
///
/// These are recovered: the affected subtree or entry is skipped and the
/// error is carried into the final report.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The entry vanished between listing and inspection.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file or directory.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Build a scan error from an I/O error, classifying by kind.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::Io { path: p, .. } => p,
        }
    }
}

/// Errors that can occur during file hashing.
///
/// A file that fails to hash is skipped; the run continues.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The file disappeared before or while it was read.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Hashing stopped because shutdown was requested.
    #[error("Hashing interrupted: {0}")]
    Interrupted(PathBuf),

    /// The file changed size between discovery and hashing.
    #[error("File changed during scan: {path} (expected {expected} bytes, read {actual})")]
    SizeChanged {
        /// Path of the changed file
        path: PathBuf,
        /// Size recorded by the walk
        expected: u64,
        /// Bytes actually read
        actual: u64,
    },

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Build a hash error from an I/O error, classifying by kind.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::Interrupted(p)
            | Self::SizeChanged { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }
}
