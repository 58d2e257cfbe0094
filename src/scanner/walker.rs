//! Directory walker with transitive empty-directory detection.
//!
//! # Overview
//!
//! [`Walker`] makes one pass over a directory tree using [`walkdir`] and
//! produces:
//!
//! - the eligible regular files as [`FileRecord`]s,
//! - the directories that are empty after pruning empty descendants,
//! - every subtree or entry that could not be read, as [`ScanError`]s.
//!
//! Symlinks to directories are never followed. Symlinks to files are treated
//! as files, but a physical file is recorded once no matter how many names
//! point at it (see [`InodeTracker`]).
//!
//! # Empty directories
//!
//! While walking, every directory that directly holds something other than
//! a subdirectory (files, symlinks, pruned or unreadable subtrees) is marked
//! occupied. Afterwards directories are resolved deepest first: an occupied
//! directory marks its parent occupied, an unoccupied one is empty. Children
//! are always resolved before their parent, so a directory holding only empty
//! subdirectories is itself empty. The scan root is never reported.
//!
//! # Example
//!
//! ```no_run
//! use treedupe::scanner::{PathFilter, Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     detect_empty_dirs: true,
//!     ..Default::default()
//! };
//! let outcome = Walker::new(Path::new("/tmp/t"), PathFilter::allow_all())
//!     .with_config(config)
//!     .walk();
//!
//! for dir in &outcome.empty_dirs {
//!     println!("empty: {}", dir.display());
//! }
//! ```

use std::collections::HashSet;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use walkdir::{DirEntry, WalkDir};

use super::hardlink::InodeTracker;
use super::{FileRecord, PathFilter, ScanError};
use crate::progress::ProgressCallback;

/// Options controlling what the walker records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkerConfig {
    /// Minimum file size to include (in bytes).
    pub min_size: Option<u64>,

    /// Maximum file size to include (in bytes).
    pub max_size: Option<u64>,

    /// Resolve transitively empty directories after the walk.
    pub detect_empty_dirs: bool,
}

/// Everything one walk produced.
#[derive(Debug, Default)]
pub struct WalkOutcome {
    /// Eligible regular files, in sorted discovery order
    pub files: Vec<FileRecord>,
    /// Empty directories, deepest first
    pub empty_dirs: Vec<PathBuf>,
    /// Subtrees and entries that could not be read
    pub errors: Vec<ScanError>,
    /// Extra names (hardlinks, file symlinks) for already-recorded files
    pub aliases_skipped: usize,
    /// Whether the walk stopped early on shutdown
    pub interrupted: bool,
}

/// Directory walker for file discovery.
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    filter: PathFilter,
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("root", &self.root)
            .field("filter", &self.filter)
            .field("config", &self.config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Walker {
    /// Create a new walker for the given root and filter.
    #[must_use]
    pub fn new(root: &Path, filter: PathFilter) -> Self {
        Self {
            root: root.to_path_buf(),
            filter,
            config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set walker options.
    #[must_use]
    pub fn with_config(mut self, config: WalkerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set, the walk stops at the next entry and empty
    /// directory detection is skipped, since unvisited subtrees cannot be
    /// judged.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Report each discovered file to a progress callback.
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

    fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }

    fn passes_size_filter(&self, size: u64) -> bool {
        if let Some(min) = self.config.min_size {
            if size < min {
                return false;
            }
        }
        if let Some(max) = self.config.max_size {
            if size > max {
                return false;
            }
        }
        true
    }

    /// Walk the tree once and collect files, empty directories and errors.
    ///
    /// Per-entry failures never abort the walk; they are collected in
    /// [`WalkOutcome::errors`].
    #[must_use]
    pub fn walk(&self) -> WalkOutcome {
        let mut outcome = WalkOutcome::default();
        let mut tracker = InodeTracker::new();
        // Directories below the root with their depth, for the post-order pass
        let mut dirs: Vec<(PathBuf, usize)> = Vec::new();
        // Directories known to hold something that keeps them non-empty
        let mut occupied: HashSet<PathBuf> = HashSet::new();

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start("walk", 0);
        }

        log::info!("Scanning {}", self.root.display());

        let mut entries = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        loop {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                outcome.interrupted = true;
                break;
            }

            let entry = match entries.next() {
                None => break,
                Some(Ok(entry)) => entry,
                Some(Err(e)) => {
                    let error = self.convert_walk_error(e);
                    // Unknown content keeps the directory and its parent
                    let path = error.path().to_path_buf();
                    mark_parent(&mut occupied, &path);
                    occupied.insert(path);
                    outcome.errors.push(error);
                    continue;
                }
            };

            if entry.depth() == 0 {
                continue;
            }

            let file_type = entry.file_type();

            if file_type.is_dir() {
                if self.filter.is_blacklisted(self.relative(entry.path())) {
                    log::trace!("Pruning blacklisted directory: {}", entry.path().display());
                    mark_parent(&mut occupied, entry.path());
                    entries.skip_current_dir();
                    continue;
                }
                dirs.push((entry.path().to_path_buf(), entry.depth()));
                continue;
            }

            // Anything that is not a directory occupies its parent
            mark_parent(&mut occupied, entry.path());

            if let Err(error) = self.process_entry(&entry, &mut tracker, &mut outcome) {
                outcome.errors.push(error);
            }
        }

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end("walk");
        }

        if self.config.detect_empty_dirs && !outcome.interrupted {
            outcome.empty_dirs = resolve_empty_dirs(dirs, &mut occupied);
        }

        log::info!(
            "Walk complete: {} eligible files, {} empty directories, {} errors",
            outcome.files.len(),
            outcome.empty_dirs.len(),
            outcome.errors.len()
        );

        outcome
    }

    /// Record a non-directory entry if it is an eligible regular file.
    fn process_entry(
        &self,
        entry: &DirEntry,
        tracker: &mut InodeTracker,
        outcome: &mut WalkOutcome,
    ) -> Result<(), ScanError> {
        let path = entry.path();
        let is_symlink = entry.path_is_symlink();

        if !self.filter.is_eligible(self.relative(path)) {
            log::trace!("Skipping filtered file: {}", path.display());
            return Ok(());
        }

        // Resolve symlinks to their target; directories behind links are not followed
        let metadata = if is_symlink {
            match std::fs::metadata(path) {
                Ok(m) => m,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    log::debug!("Skipping broken symlink: {}", path.display());
                    return Ok(());
                }
                Err(e) => return Err(self.handle_io_error(path, e)),
            }
        } else {
            entry
                .metadata()
                .map_err(|e| self.convert_walk_error(e))?
        };

        if !metadata.is_file() {
            log::trace!("Skipping non-regular entry: {}", path.display());
            return Ok(());
        }

        let size = metadata.len();
        if !self.passes_size_filter(size) {
            log::trace!(
                "Skipping file due to size filter ({}): {}",
                size,
                path.display()
            );
            return Ok(());
        }

        let record = FileRecord {
            path: path.to_path_buf(),
            size,
            modified: modified_time(&metadata),
            is_symlink,
            digest: None,
        };

        if let Some(owner) = tracker.claim(&metadata, outcome.files.len()) {
            outcome.aliases_skipped += 1;
            let existing = &mut outcome.files[owner];
            if existing.is_symlink && !is_symlink {
                log::debug!(
                    "Preferring {} over symlink {}",
                    path.display(),
                    existing.path.display()
                );
                *existing = record;
            } else {
                log::debug!(
                    "Skipping alias of {}: {}",
                    existing.path.display(),
                    path.display()
                );
            }
            return Ok(());
        }

        if let Some(ref callback) = self.progress_callback {
            callback.on_progress(outcome.files.len() + 1, path.to_string_lossy().as_ref());
        }

        outcome.files.push(record);
        Ok(())
    }

    /// Handle I/O errors during file access.
    fn handle_io_error(&self, path: &Path, error: std::io::Error) -> ScanError {
        let error = ScanError::from_io(path, error);
        match error {
            ScanError::NotFound(_) => {
                log::debug!("Entry vanished during scan: {}", path.display());
            }
            _ => log::warn!("{}", error),
        }
        error
    }

    /// Convert a walkdir error, keeping the underlying I/O kind when present.
    fn convert_walk_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        let message = error.to_string();
        match error.into_io_error() {
            Some(io) => self.handle_io_error(&path, io),
            None => {
                log::warn!("Walker error for {}: {}", path.display(), message);
                ScanError::Io {
                    path,
                    source: std::io::Error::other(message),
                }
            }
        }
    }
}

/// Modification time, falling back to the epoch where unsupported.
fn modified_time(metadata: &Metadata) -> SystemTime {
    metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH)
}

fn mark_parent(occupied: &mut HashSet<PathBuf>, path: &Path) {
    if let Some(parent) = path.parent() {
        occupied.insert(parent.to_path_buf());
    }
}

/// Resolve directories deepest first; returns the empty ones in that order.
fn resolve_empty_dirs(
    mut dirs: Vec<(PathBuf, usize)>,
    occupied: &mut HashSet<PathBuf>,
) -> Vec<PathBuf> {
    dirs.sort_by(|(a, da), (b, db)| db.cmp(da).then_with(|| a.cmp(b)));

    let mut empty = Vec::new();
    for (dir, _) in dirs {
        if occupied.contains(&dir) {
            mark_parent(occupied, &dir);
        } else {
            log::debug!("Empty directory: {}", dir.display());
            empty.push(dir);
        }
    }
    empty
}
