//! Duplicate finder orchestration.
//!
//! # Overview
//!
//! The [`DuplicateFinder`] runs the detection pipeline:
//!
//! 1. **Walk** - Collect eligible files and empty directories
//! 2. **Size grouping** - Drop files whose size is unique
//! 3. **Hashing** - Stream the remaining candidates through the hasher on a
//!    bounded rayon pool
//! 4. **Digest grouping** - Group by `(size, digest)`
//!
//! Unreadable directories and files are recovered from: they are recorded in
//! the [`ScanSummary`] and the scan continues. Only cancellation aborts.
//!
//! # Example
//!
//! ```no_run
//! use treedupe::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(4));
//! let outcome = finder.find_duplicates(Path::new(".")).unwrap();
//!
//! println!("Found {} duplicate groups", outcome.groups.len());
//! println!("Reclaimable: {} bytes", outcome.summary.reclaimable_space);
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use super::groups::{group_by_digest, group_by_size, DuplicateGroup};
use crate::progress::ProgressCallback;
use crate::scanner::{
    FileRecord, HashAlgorithm, HashError, Hasher, PathFilter, ScanError, Walker, WalkerConfig,
};

/// Files above this size get a debug line when hashing starts.
const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of I/O threads for parallel hashing.
    /// Default is 4 to avoid disk thrashing.
    pub io_threads: usize,
    /// Content hash algorithm
    pub algorithm: HashAlgorithm,
    /// Eligibility filter applied during the walk
    pub filter: PathFilter,
    /// Size limits and empty-directory detection
    pub walker_config: WalkerConfig,
    /// Shutdown flag for graceful cancellation
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Progress reporting
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("algorithm", &self.algorithm)
            .field("filter", &self.filter)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag.is_some())
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            algorithm: HashAlgorithm::default(),
            filter: PathFilter::allow_all(),
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the number of hashing threads. Zero is treated as one.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the hash algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the eligibility filter.
    #[must_use]
    pub fn with_filter(mut self, filter: PathFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Statistics and recovered errors from a scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Number of eligible files found by the walk
    pub total_files: usize,
    /// Total size of eligible files in bytes
    pub total_size: u64,
    /// Files skipped because their size was unique
    pub eliminated_by_size: usize,
    /// Files whose content was hashed successfully
    pub files_hashed: usize,
    /// Bytes read while hashing
    pub bytes_hashed: u64,
    /// Extra names (hardlinks, file symlinks) collapsed onto one record
    pub aliases_skipped: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Number of duplicate files, excluding one kept copy per group
    pub duplicate_files: usize,
    /// Space reclaimable by removing duplicates
    pub reclaimable_space: u64,
    /// Algorithm used for every digest in this scan
    pub algorithm: HashAlgorithm,
    /// Directories or entries that could not be accessed
    pub access_errors: Vec<ScanError>,
    /// Files that could not be read while hashing
    pub read_errors: Vec<HashError>,
    /// Duration of the entire scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Whether any access or read error was recovered from.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.access_errors.is_empty() || !self.read_errors.is_empty()
    }
}

/// Everything a scan produces.
#[derive(Debug)]
pub struct ScanOutcome {
    /// Confirmed duplicate groups
    pub groups: Vec<DuplicateGroup>,
    /// Directories empty at scan time, deepest first
    pub empty_dirs: Vec<PathBuf>,
    /// Statistics and recovered errors
    pub summary: ScanSummary,
}

/// Errors that abort duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Duplicate finder that orchestrates the detection pipeline.
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new().with_algorithm(config.algorithm);
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(flag.clone());
        }
        Self { config, hasher }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Find all duplicate files under `path`.
    ///
    /// # Errors
    ///
    /// - `PathNotFound` / `NotADirectory` if `path` is not a directory
    /// - `Interrupted` if shutdown was requested during the walk or hashing
    pub fn find_duplicates(&self, path: &Path) -> Result<ScanOutcome, FinderError> {
        let start_time = Instant::now();

        if !path.exists() {
            return Err(FinderError::PathNotFound(path.to_path_buf()));
        }
        if !path.is_dir() {
            return Err(FinderError::NotADirectory(path.to_path_buf()));
        }
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        log::info!("Starting duplicate scan of {}", path.display());

        let mut walker = Walker::new(path, self.config.filter.clone())
            .with_config(self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }
        if let Some(ref callback) = self.config.progress_callback {
            walker = walker.with_progress_callback(callback.clone());
        }

        let walked = walker.walk();
        if walked.interrupted {
            log::info!("Scan interrupted during walk");
            return Err(FinderError::Interrupted);
        }

        let (groups, mut summary) = self.find_duplicates_from_files(walked.files)?;
        summary.access_errors = walked.errors;
        summary.aliases_skipped = walked.aliases_skipped;
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete: {} groups, {} duplicates, {} bytes reclaimable in {:.2}s",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_space,
            summary.scan_duration.as_secs_f64()
        );

        Ok(ScanOutcome {
            groups,
            empty_dirs: walked.empty_dirs,
            summary,
        })
    }

    /// Run size grouping, hashing and digest grouping over known files.
    ///
    /// # Errors
    ///
    /// `Interrupted` if shutdown was requested while hashing.
    pub fn find_duplicates_from_files(
        &self,
        files: Vec<FileRecord>,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let mut summary = ScanSummary {
            algorithm: self.hasher.algorithm(),
            ..Default::default()
        };

        let (by_size, stats) = group_by_size(files);
        summary.total_files = stats.total_files;
        summary.total_size = stats.total_size;
        summary.eliminated_by_size = stats.eliminated_unique;

        let candidates: Vec<FileRecord> = by_size.into_values().flatten().collect();
        let results = self.hash_all(candidates);

        if self.config.is_shutdown_requested() {
            log::info!("Scan interrupted during hashing");
            return Err(FinderError::Interrupted);
        }

        let mut hashed = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(record) => {
                    summary.files_hashed += 1;
                    summary.bytes_hashed += record.size;
                    hashed.push(record);
                }
                Err(HashError::Interrupted(_)) => return Err(FinderError::Interrupted),
                Err(e) => summary.read_errors.push(e),
            }
        }

        let groups = group_by_digest(hashed);
        summary.duplicate_groups = groups.len();
        summary.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        summary.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
        summary.scan_duration = start_time.elapsed();

        Ok((groups, summary))
    }

    /// Hash candidates on a bounded pool, preserving one result per input.
    fn hash_all(&self, files: Vec<FileRecord>) -> Vec<Result<FileRecord, HashError>> {
        if files.is_empty() {
            log::debug!("No hash candidates");
            return Vec::new();
        }

        let total = files.len();
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("hash", total);
        }
        log::info!(
            "Hashing {} candidate files with {} ({} threads)",
            total,
            self.hasher.algorithm(),
            self.config.io_threads
        );

        let done = AtomicUsize::new(0);
        let hash_one = |file: FileRecord| -> Result<FileRecord, HashError> {
            if self.config.is_shutdown_requested() {
                return Err(HashError::Interrupted(file.path));
            }
            if file.size > LARGE_FILE_THRESHOLD {
                log::debug!(
                    "Hashing large file ({} MB): {}",
                    file.size / (1024 * 1024),
                    file.path.display()
                );
            }

            let result = self.hasher.hash_record(&file);

            let current = done.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(ref callback) = self.config.progress_callback {
                callback.on_progress(current, file.path.to_string_lossy().as_ref());
                callback.on_item_completed(file.size);
            }

            match result {
                Ok(digest) => Ok(file.with_digest(digest)),
                Err(e) => {
                    if !matches!(e, HashError::Interrupted(_)) {
                        log::warn!("Failed to hash {}: {}", file.path.display(), e);
                    }
                    Err(e)
                }
            }
        };

        let results = match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads.max(1))
            .build()
        {
            Ok(pool) => pool.install(|| files.into_par_iter().map(hash_one).collect()),
            Err(e) => {
                log::warn!("Failed to create hashing thread pool ({e}), hashing sequentially");
                files.into_iter().map(hash_one).collect()
            }
        };

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("hash");
        }
        results
    }
}
