//! JSON report for scripting.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "mode": "dry_run",
//!   "root": "/tmp/t",
//!   "retention": "oldest",
//!   "algorithm": "blake3",
//!   "groups": [
//!     {
//!       "digest": "af13...",
//!       "size": 1,
//!       "keep": { "path": "/tmp/t/a.jpg", "size": 1, "modified": "2024-01-01T10:00:00Z" },
//!       "delete": [
//!         { "path": "/tmp/t/b.jpg", "size": 1, "modified": "2024-01-01T11:00:00Z", "status": "planned" }
//!       ]
//!     }
//!   ],
//!   "empty_dirs": ["/tmp/t/empty"],
//!   "deleted": [],
//!   "removed_dirs": [],
//!   "summary": {
//!     "total_files": 3,
//!     "duplicate_groups": 1,
//!     "files_to_delete": 1,
//!     "bytes_to_reclaim": 1,
//!     "files_deleted": 0,
//!     "bytes_freed": 0,
//!     "empty_dirs_found": 1,
//!     "empty_dirs_removed": 0,
//!     "interrupted": false
//!   },
//!   "errors": { "access": [], "read": [], "delete": [] }
//! }
//! ```
//!
//! `status` is `planned` in a dry run and `deleted`, `failed` or `skipped`
//! after `--remove`. `deleted` and `removed_dirs` list what actually left
//! the disk, in execution order.

use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{DeleteStatus, Report};
use crate::actions::ActionMode;
use crate::duplicates::RetentionPolicy;
use crate::scanner::{FileRecord, HashAlgorithm};

/// One file entry.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFile {
    /// Absolute path
    pub path: String,
    /// Size in bytes
    pub size: u64,
    /// Modification time (UTC, RFC 3339)
    pub modified: DateTime<Utc>,
}

impl JsonFile {
    fn from_record(record: &FileRecord) -> Self {
        Self {
            path: path_string(&record.path),
            size: record.size,
            modified: DateTime::<Utc>::from(record.modified),
        }
    }
}

/// A member of a delete set with its outcome.
#[derive(Debug, Clone, Serialize)]
pub struct JsonMember {
    /// The file
    #[serde(flatten)]
    pub file: JsonFile,
    /// What happened to it
    pub status: DeleteStatus,
}

/// One duplicate group with its keep/delete partition.
#[derive(Debug, Clone, Serialize)]
pub struct JsonGroup {
    /// Hex digest shared by every member
    pub digest: String,
    /// Size of each member in bytes
    pub size: u64,
    /// Surviving copy
    pub keep: JsonFile,
    /// Copies marked for deletion
    pub delete: Vec<JsonMember>,
}

/// Counts for the run.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Eligible files found
    pub total_files: usize,
    /// Their combined size
    pub total_size: u64,
    /// Duplicate groups found
    pub duplicate_groups: usize,
    /// Files the plan marks for deletion
    pub files_to_delete: usize,
    /// Bytes the plan would reclaim
    pub bytes_to_reclaim: u64,
    /// Files actually deleted
    pub files_deleted: usize,
    /// Bytes actually freed
    pub bytes_freed: u64,
    /// Empty directories found
    pub empty_dirs_found: usize,
    /// Empty directories actually removed
    pub empty_dirs_removed: usize,
    /// Whether Ctrl+C cut execution short
    pub interrupted: bool,
}

/// A recovered error.
#[derive(Debug, Clone, Serialize)]
pub struct JsonIssue {
    /// Path the error concerns
    pub path: String,
    /// Human-readable description
    pub message: String,
}

/// Recovered errors grouped by kind.
#[derive(Debug, Clone, Serialize)]
pub struct JsonErrors {
    /// Unreadable directories or entries
    pub access: Vec<JsonIssue>,
    /// Files that could not be hashed
    pub read: Vec<JsonIssue>,
    /// Failed deletions or directory removals
    pub delete: Vec<JsonIssue>,
}

/// Complete JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// `dry_run` or `destructive`
    pub mode: ActionMode,
    /// Canonical scan root
    pub root: String,
    /// Retention policy
    pub retention: RetentionPolicy,
    /// Hash algorithm
    pub algorithm: HashAlgorithm,
    /// Duplicate groups
    pub groups: Vec<JsonGroup>,
    /// Empty directories found, deepest first
    pub empty_dirs: Vec<String>,
    /// Files removed from disk
    pub deleted: Vec<String>,
    /// Empty directories removed from disk
    pub removed_dirs: Vec<String>,
    /// Counts
    pub summary: JsonSummary,
    /// Recovered errors
    pub errors: JsonErrors,
}

impl JsonOutput {
    /// Build the document from a report.
    #[must_use]
    pub fn new(report: &Report<'_>) -> Self {
        let statuses = report.statuses();
        let groups = report
            .selections
            .iter()
            .map(|s| JsonGroup {
                digest: s.digest.to_hex(),
                size: s.size,
                keep: JsonFile::from_record(&s.keep),
                delete: s
                    .delete
                    .iter()
                    .map(|r| JsonMember {
                        file: JsonFile::from_record(r),
                        status: statuses.of(&r.path),
                    })
                    .collect(),
            })
            .collect();

        let summary = JsonSummary {
            total_files: report.summary.total_files,
            total_size: report.summary.total_size,
            duplicate_groups: report.selections.len(),
            files_to_delete: report.planned_deletions(),
            bytes_to_reclaim: report.planned_bytes(),
            files_deleted: report.actions.deleted.len(),
            bytes_freed: report.actions.bytes_freed,
            empty_dirs_found: report.empty_dirs.len(),
            empty_dirs_removed: report.actions.removed_dirs.len(),
            interrupted: report.actions.interrupted,
        };

        let errors = JsonErrors {
            access: report
                .summary
                .access_errors
                .iter()
                .map(|e| issue(e.path(), e))
                .collect(),
            read: report
                .summary
                .read_errors
                .iter()
                .map(|e| issue(e.path(), e))
                .collect(),
            delete: report
                .actions
                .failures
                .iter()
                .map(|e| issue(e.path(), e))
                .collect(),
        };

        Self {
            mode: report.mode(),
            root: path_string(report.root),
            retention: report.retention,
            algorithm: report.algorithm,
            groups,
            empty_dirs: report.empty_dirs.iter().map(|p| path_string(p)).collect(),
            deleted: report
                .actions
                .deleted
                .iter()
                .map(|d| path_string(&d.path))
                .collect(),
            removed_dirs: report
                .actions
                .removed_dirs
                .iter()
                .map(|p| path_string(p))
                .collect(),
            summary,
            errors,
        }
    }

    /// Serialize as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Propagates serialization and write failures.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writeln!(writer)
    }
}

fn issue(path: &Path, error: &impl std::fmt::Display) -> JsonIssue {
    JsonIssue {
        path: path_string(path),
        message: error.to_string(),
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
