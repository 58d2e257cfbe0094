//! Size grouping and digest grouping.
//!
//! # Overview
//!
//! Duplicate detection narrows candidates in two steps:
//!
//! 1. [`group_by_size`] drops every file whose size no other file shares.
//!    Files of different sizes cannot be duplicates, so only the survivors
//!    are hashed.
//! 2. [`group_by_digest`] groups hashed records by `(size, digest)` and
//!    keeps only groups with two or more members.
//!
//! Both steps are deterministic: the same set of input files yields the same
//! groups whatever order the files arrive in. Members are sorted by path and
//! groups by their first member.
//!
//! # Example
//!
//! ```
//! use treedupe::scanner::FileRecord;
//! use treedupe::duplicates::group_by_size;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let files = vec![
//!     FileRecord::new(PathBuf::from("/file1.txt"), 1024, SystemTime::now()),
//!     FileRecord::new(PathBuf::from("/file2.txt"), 1024, SystemTime::now()),
//!     FileRecord::new(PathBuf::from("/file3.txt"), 2048, SystemTime::now()),
//! ];
//!
//! let (groups, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(groups.len(), 1);
//! ```

use std::collections::{BTreeMap, HashMap};

use crate::scanner::{Digest, FileRecord};

/// Confirmed group of files with identical size and digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Content digest shared by every member
    pub digest: Digest,
    /// File size in bytes shared by every member
    pub size: u64,
    /// Members, sorted by path
    pub files: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    ///
    /// Members are sorted by path.
    ///
    /// # Panics
    ///
    /// Debug assertion fails if a member's size or digest differs from the group's.
    #[must_use]
    pub fn new(digest: Digest, size: u64, mut files: Vec<FileRecord>) -> Self {
        debug_assert!(files
            .iter()
            .all(|f| f.size == size && f.digest.as_ref() == Some(&digest)));
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Self {
            digest,
            size,
            files,
        }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of duplicate copies (total - 1 kept).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Space reclaimed by keeping one copy.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }
}

/// Statistics from the size grouping phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of unique file sizes
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in groups of 2+)
    pub potential_duplicates: usize,
    /// Number of files eliminated as unique (singleton sizes)
    pub eliminated_unique: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group files by size, keeping only sizes shared by 2+ files.
///
/// No file I/O is performed.
#[must_use]
pub fn group_by_size(files: Vec<FileRecord>) -> (HashMap<u64, Vec<FileRecord>>, GroupingStats) {
    let mut stats = GroupingStats {
        total_files: files.len(),
        ..Default::default()
    };

    let mut by_size: HashMap<u64, Vec<FileRecord>> = HashMap::new();
    for file in files {
        stats.total_size += file.size;
        by_size.entry(file.size).or_default().push(file);
    }

    stats.unique_sizes = by_size.len();
    by_size.retain(|_, group| group.len() > 1);
    stats.potential_duplicates = by_size.values().map(Vec::len).sum();
    stats.eliminated_unique = stats.total_files - stats.potential_duplicates;

    log::debug!(
        "Size grouping: {} files, {} unique sizes, {} candidates ({:.1}% eliminated)",
        stats.total_files,
        stats.unique_sizes,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    (by_size, stats)
}

/// Group hashed records by `(size, digest)`, keeping groups of 2+ members.
///
/// Records without a digest are ignored. Digests carry their algorithm, so
/// records hashed with different algorithms never share a group.
#[must_use]
pub fn group_by_digest<I>(records: I) -> Vec<DuplicateGroup>
where
    I: IntoIterator<Item = FileRecord>,
{
    let mut buckets: BTreeMap<(u64, Digest), Vec<FileRecord>> = BTreeMap::new();

    for record in records {
        let Some(digest) = record.digest.clone() else {
            log::debug!("Ignoring unhashed record: {}", record.path.display());
            continue;
        };
        buckets.entry((record.size, digest)).or_default().push(record);
    }

    let mut groups: Vec<DuplicateGroup> = buckets
        .into_iter()
        .filter(|(_, files)| files.len() > 1)
        .map(|((size, digest), files)| {
            log::debug!(
                "Duplicate group {}: {} files, {} bytes each",
                digest,
                files.len(),
                size
            );
            DuplicateGroup::new(digest, size, files)
        })
        .collect();

    groups.sort_by(|a, b| a.files[0].path.cmp(&b.files[0].path));
    groups
}
