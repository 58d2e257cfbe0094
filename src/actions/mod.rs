//! File actions module.
//!
//! This module applies a retention plan to the filesystem:
//! - Permanent deletion of non-kept duplicates, each verified against its
//!   scanned size and mtime
//! - Removal of directories found empty during the scan, deepest first
//! - Dry-run mode that touches nothing
//!
//! ```no_run
//! use treedupe::actions::{ActionExecutor, ActionMode};
//!
//! let executor = ActionExecutor::new(ActionMode::DryRun);
//! let report = executor.execute(&[], &[]);
//! assert!(report.deleted.is_empty());
//! ```

pub mod delete;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::duplicates::Selection;
use crate::progress::ProgressCallback;

pub use delete::{
    delete_verified, remove_empty_dir, validate_preserves_copy, DeleteError, DeleteResult,
    FileSnapshot,
};

/// Whether actions touch the filesystem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionMode {
    /// Report what would be removed; mutate nothing.
    #[default]
    DryRun,
    /// Delete duplicates and empty directories.
    Destructive,
}

impl ActionMode {
    /// Mode for a `--remove` flag value.
    #[must_use]
    pub fn from_remove_flag(remove: bool) -> Self {
        if remove {
            Self::Destructive
        } else {
            Self::DryRun
        }
    }

    /// Whether this mode mutates the filesystem.
    #[must_use]
    pub fn is_destructive(self) -> bool {
        self == Self::Destructive
    }
}

/// Outcome of executing a plan.
#[derive(Debug, Default)]
pub struct ActionReport {
    /// Mode the plan was executed in
    pub mode: ActionMode,
    /// Files actually deleted
    pub deleted: Vec<DeleteResult>,
    /// Directories actually removed
    pub removed_dirs: Vec<PathBuf>,
    /// Per-item failures; none of them stopped the run
    pub failures: Vec<DeleteError>,
    /// Bytes freed by the deletions
    pub bytes_freed: u64,
    /// Whether shutdown stopped execution early
    pub interrupted: bool,
}

impl ActionReport {
    /// Check if all operations succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Applies retention selections and empty-directory removal.
pub struct ActionExecutor {
    mode: ActionMode,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for ActionExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionExecutor")
            .field("mode", &self.mode)
            .field("shutdown_flag", &self.shutdown_flag.is_some())
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl ActionExecutor {
    /// Create an executor for the given mode.
    #[must_use]
    pub fn new(mode: ActionMode) -> Self {
        Self {
            mode,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the shutdown flag checked before each operation.
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

    /// Execute the plan.
    ///
    /// In dry-run mode nothing is touched and the report is empty. In
    /// destructive mode, every non-kept file is deleted and then every
    /// listed directory is removed, deepest first. Failures are collected
    /// and never stop the remaining work; only shutdown does.
    #[must_use]
    pub fn execute(&self, selections: &[Selection], empty_dirs: &[PathBuf]) -> ActionReport {
        let mut report = ActionReport {
            mode: self.mode,
            ..Default::default()
        };

        if !self.mode.is_destructive() {
            log::info!(
                "Dry run: {} file(s) and {} empty director(ies) left in place",
                selections.iter().map(|s| s.delete.len()).sum::<usize>(),
                empty_dirs.len()
            );
            return report;
        }

        let total = selections.iter().map(|s| s.delete.len()).sum::<usize>() + empty_dirs.len();
        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start("delete", total);
        }

        let mut done = 0usize;
        'groups: for selection in selections {
            if let Err(e) = validate_preserves_copy(selection) {
                log::error!("{e}");
                report.failures.push(e);
                continue;
            }

            if let Err(e) = FileSnapshot::from_record(&selection.keep).verify() {
                log::warn!(
                    "Kept copy {} unavailable ({e}), leaving its duplicates in place",
                    selection.keep.path.display()
                );
                report
                    .failures
                    .push(DeleteError::KeptCopyUnavailable(selection.keep.path.clone()));
                done += selection.delete.len();
                continue;
            }

            for record in &selection.delete {
                if self.is_shutdown_requested() {
                    report.interrupted = true;
                    break 'groups;
                }

                done += 1;
                if let Some(ref callback) = self.progress_callback {
                    callback.on_progress(done, record.path.to_string_lossy().as_ref());
                }

                match delete_verified(record) {
                    Ok(result) => {
                        report.bytes_freed += result.size;
                        if let Some(ref callback) = self.progress_callback {
                            callback.on_item_completed(result.size);
                        }
                        report.deleted.push(result);
                    }
                    Err(e) => {
                        log::warn!("Failed to delete {}: {}", record.path.display(), e);
                        report.failures.push(e);
                    }
                }
            }
        }

        if !report.interrupted {
            let mut dirs: Vec<&PathBuf> = empty_dirs.iter().collect();
            // Children before parents
            dirs.sort_by(|a, b| {
                b.components()
                    .count()
                    .cmp(&a.components().count())
                    .then_with(|| a.cmp(b))
            });

            for dir in dirs {
                if self.is_shutdown_requested() {
                    report.interrupted = true;
                    break;
                }

                done += 1;
                if let Some(ref callback) = self.progress_callback {
                    callback.on_progress(done, dir.to_string_lossy().as_ref());
                }

                match remove_empty_dir(dir) {
                    Ok(()) => report.removed_dirs.push(dir.clone()),
                    Err(e) => {
                        log::warn!("Failed to remove {}: {}", dir.display(), e);
                        report.failures.push(e);
                    }
                }
            }
        }

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end("delete");
        }

        log::info!(
            "Deleted {} file(s), removed {} director(ies), {} failure(s), freed {} bytes",
            report.deleted.len(),
            report.removed_dirs.len(),
            report.failures.len(),
            report.bytes_freed
        );

        report
    }
}
