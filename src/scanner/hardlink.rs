//! Physical file identity tracking.
//!
//! # Overview
//!
//! Hardlinks and symlinks to files are extra names for a file already on
//! disk. They share content with it but are NOT duplicates: deleting one name
//! reclaims nothing, and deleting the target behind a kept symlink would
//! lose the data. The walker uses [`InodeTracker`] so each physical file is
//! recorded once.
//!
//! # Platform Support
//!
//! - **Unix**: Uses (device_id, inode) pairs from file metadata
//! - **Other**: Tracking disabled (every path is its own file)

use std::collections::HashMap;
use std::fs::Metadata;

/// Maps each seen inode to the slot of the record that owns it.
///
/// Not thread-safe; the walker owns one per walk.
#[derive(Debug, Default)]
pub struct InodeTracker {
    seen: HashMap<InodeKey, usize>,
}

impl InodeTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `slot` as the owner of the file described by `metadata`.
    ///
    /// Returns the slot of an earlier owner when the inode was already seen,
    /// in which case nothing is recorded. Returns `None` for a first
    /// occurrence, or when the platform has no inode information.
    ///
    /// `metadata` must come from `std::fs::metadata` so symlinks resolve to
    /// their target.
    pub fn claim(&mut self, metadata: &Metadata, slot: usize) -> Option<usize> {
        let key = InodeKey::from_metadata(metadata)?;
        match self.seen.get(&key) {
            Some(&owner) => Some(owner),
            None => {
                self.seen.insert(key, slot);
                None
            }
        }
    }

    /// Number of distinct files tracked.
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Whether identity tracking works on this platform.
    #[must_use]
    pub const fn is_supported() -> bool {
        cfg!(unix)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct InodeKey {
    dev: u64,
    ino: u64,
}

impl InodeKey {
    #[cfg(unix)]
    fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }
}
