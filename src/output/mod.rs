//! Report rendering.
//!
//! A [`Report`] borrows everything one run produced and is rendered as:
//! - [`text`]: human-readable, colored when the terminal allows it
//! - [`json`]: a single JSON document for scripting
//!
//! Reports hold no timings, so two dry runs over an unchanged tree render
//! byte-identical output.
//!
//! ```no_run
//! # use treedupe::output::{Report, render};
//! # use treedupe::cli::OutputFormat;
//! # fn show(report: &Report<'_>) -> anyhow::Result<()> {
//! render(report, OutputFormat::Text, &mut std::io::stdout().lock())?;
//! # Ok(())
//! # }
//! ```

pub mod json;
pub mod text;

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::actions::{ActionMode, ActionReport};
use crate::cli::OutputFormat;
use crate::duplicates::{RetentionPolicy, ScanSummary, Selection};
use crate::scanner::HashAlgorithm;

pub use json::JsonOutput;
pub use text::TextOutput;

/// Everything the final report shows, borrowed from the run.
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    /// Canonical scan root
    pub root: &'a Path,
    /// Retention policy applied
    pub retention: RetentionPolicy,
    /// Algorithm behind every digest
    pub algorithm: HashAlgorithm,
    /// Keep/delete plan, one entry per duplicate group
    pub selections: &'a [Selection],
    /// Directories empty at scan time, deepest first
    pub empty_dirs: &'a [PathBuf],
    /// Whether empty-directory detection ran
    pub empty_dirs_checked: bool,
    /// Scan statistics and recovered scan errors
    pub summary: &'a ScanSummary,
    /// What the executor did
    pub actions: &'a ActionReport,
}

impl Report<'_> {
    /// Dry run or destructive.
    #[must_use]
    pub fn mode(&self) -> ActionMode {
        self.actions.mode
    }

    /// Number of files the plan marks for deletion.
    #[must_use]
    pub fn planned_deletions(&self) -> usize {
        self.selections.iter().map(|s| s.delete.len()).sum()
    }

    /// Bytes the plan would reclaim.
    #[must_use]
    pub fn planned_bytes(&self) -> u64 {
        self.selections.iter().map(Selection::reclaimable).sum()
    }

    /// Per-file deletion outcomes for this run.
    #[must_use]
    pub fn statuses(&self) -> DeleteStatuses<'_> {
        DeleteStatuses {
            mode: self.mode(),
            deleted: self.actions.deleted.iter().map(|d| d.path.as_path()).collect(),
            failed: self.actions.failures.iter().map(|e| e.path()).collect(),
        }
    }

    /// Total recovered errors of every kind.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.summary.access_errors.len()
            + self.summary.read_errors.len()
            + self.actions.failures.len()
    }
}

/// What happened to a file marked for deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteStatus {
    /// Dry run: would be deleted
    Planned,
    /// Removed from disk
    Deleted,
    /// Deletion attempted and failed
    Failed,
    /// Never attempted (kept copy unavailable, or interrupted)
    Skipped,
}

impl DeleteStatus {
    /// Label used in the text report.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Planned => "delete",
            Self::Deleted => "deleted",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Lookup from path to [`DeleteStatus`], built once per render.
#[derive(Debug)]
pub struct DeleteStatuses<'a> {
    mode: ActionMode,
    deleted: HashSet<&'a Path>,
    failed: HashSet<&'a Path>,
}

impl DeleteStatuses<'_> {
    /// Outcome for one member of a delete set.
    #[must_use]
    pub fn of(&self, path: &Path) -> DeleteStatus {
        if !self.mode.is_destructive() {
            DeleteStatus::Planned
        } else if self.deleted.contains(path) {
            DeleteStatus::Deleted
        } else if self.failed.contains(path) {
            DeleteStatus::Failed
        } else {
            DeleteStatus::Skipped
        }
    }
}

/// Render `report` in `format` to `writer`.
///
/// # Errors
///
/// Fails if writing or JSON serialization fails.
pub fn render<W: Write>(
    report: &Report<'_>,
    format: OutputFormat,
    writer: &mut W,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => TextOutput::new(report).write_to(writer)?,
        OutputFormat::Json => JsonOutput::new(report).write_to(writer)?,
    }
    Ok(())
}
