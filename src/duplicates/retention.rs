//! Retention selection: which member of a duplicate group survives.
//!
//! Within a group exactly one record is kept; every other member is marked
//! for deletion. [`RetentionPolicy::KeepOldest`] keeps the smallest
//! modification time, [`RetentionPolicy::KeepNewest`] the largest. Ties on
//! the timestamp go to the lexicographically smallest path, so the choice is
//! reproducible across runs.
//!
//! ```
//! use treedupe::duplicates::{select, DuplicateGroup, RetentionPolicy};
//! use treedupe::scanner::{Digest, FileRecord, HashAlgorithm};
//! use std::path::PathBuf;
//! use std::time::{Duration, SystemTime};
//!
//! let digest = Digest::new(HashAlgorithm::Blake3, vec![0; 32]);
//! let t0 = SystemTime::UNIX_EPOCH;
//! let older = FileRecord::new(PathBuf::from("/a.jpg"), 1, t0).with_digest(digest.clone());
//! let newer = FileRecord::new(PathBuf::from("/b.jpg"), 1, t0 + Duration::from_secs(60))
//!     .with_digest(digest.clone());
//! let group = DuplicateGroup::new(digest, 1, vec![older, newer]);
//!
//! let selection = select(group, RetentionPolicy::KeepOldest).unwrap();
//! assert_eq!(selection.keep.path, PathBuf::from("/a.jpg"));
//! assert_eq!(selection.delete[0].path, PathBuf::from("/b.jpg"));
//! ```

use std::cmp::Ordering;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::DuplicateGroup;
use crate::scanner::{Digest, FileRecord};

/// Which member of a duplicate group is preserved.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
pub enum RetentionPolicy {
    /// Keep the member with the earliest modification time.
    #[serde(rename = "oldest")]
    #[value(name = "oldest")]
    KeepOldest,
    /// Keep the member with the latest modification time.
    #[default]
    #[serde(rename = "newest")]
    #[value(name = "newest")]
    KeepNewest,
}

impl std::fmt::Display for RetentionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::KeepOldest => write!(f, "keep oldest"),
            Self::KeepNewest => write!(f, "keep newest"),
        }
    }
}

impl RetentionPolicy {
    /// Order two candidates so that the preferred one sorts first.
    fn preference(self, a: &FileRecord, b: &FileRecord) -> Ordering {
        let by_time = match self {
            Self::KeepOldest => a.modified.cmp(&b.modified),
            Self::KeepNewest => b.modified.cmp(&a.modified),
        };
        by_time.then_with(|| a.path.cmp(&b.path))
    }
}

/// Keep/delete partition of one duplicate group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Digest shared by the group
    pub digest: Digest,
    /// Size of each member in bytes
    pub size: u64,
    /// The single surviving record
    pub keep: FileRecord,
    /// Every other member, sorted by path
    pub delete: Vec<FileRecord>,
}

impl Selection {
    /// Bytes reclaimed by deleting every non-kept member.
    #[must_use]
    pub fn reclaimable(&self) -> u64 {
        self.delete.iter().map(|f| f.size).sum()
    }
}

/// Partition a group into one kept record and the rest.
///
/// Returns `None` for a group with fewer than two members, which is not a
/// duplicate group.
#[must_use]
pub fn select(group: DuplicateGroup, policy: RetentionPolicy) -> Option<Selection> {
    if group.len() < 2 {
        return None;
    }

    let DuplicateGroup {
        digest,
        size,
        mut files,
    } = group;

    let keep_index = files
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| policy.preference(a, b))
        .map(|(i, _)| i)?;
    let keep = files.remove(keep_index);
    files.sort_by(|a, b| a.path.cmp(&b.path));

    log::debug!(
        "Group {}: keeping {} ({}), {} to delete",
        digest,
        keep.path.display(),
        policy,
        files.len()
    );

    Some(Selection {
        digest,
        size,
        keep,
        delete: files,
    })
}

/// Apply [`select`] to every group.
#[must_use]
pub fn select_all(groups: Vec<DuplicateGroup>, policy: RetentionPolicy) -> Vec<Selection> {
    groups
        .into_iter()
        .filter_map(|group| select(group, policy))
        .collect()
}
