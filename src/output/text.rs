//! Human-readable report.
//!
//! Lists each duplicate group with its kept and deleted members (size and
//! modification time per file), then the empty directories, then a summary
//! with counts and every recovered error grouped by kind.
//!
//! After `--remove` each member carries its outcome (`deleted`, `failed` or
//! `skipped`) and removed directories get their own section.
//!
//! Colors come from yansi and are switched off globally with
//! `yansi::disable()` for `--no-color`, `NO_COLOR` or a non-terminal stdout.

use std::io::{self, Write};
use std::time::SystemTime;

use bytesize::ByteSize;
use chrono::{DateTime, Local};
use yansi::Paint;

use super::{DeleteStatus, Report};
use crate::actions::ActionMode;
use crate::scanner::FileRecord;

/// Text renderer for a [`Report`].
#[derive(Debug)]
pub struct TextOutput<'a> {
    report: &'a Report<'a>,
}

impl<'a> TextOutput<'a> {
    /// Create a renderer.
    #[must_use]
    pub fn new(report: &'a Report<'a>) -> Self {
        Self { report }
    }

    /// Write the full report.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.write_groups(w)?;
        self.write_empty_dirs(w)?;
        self.write_summary(w)?;
        self.write_errors(w)
    }

    fn write_groups<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let report = self.report;
        if report.selections.is_empty() {
            writeln!(w, "{}", "No duplicate files found".green())?;
            writeln!(w)?;
            return Ok(());
        }

        let statuses = report.statuses();
        let width = if report.mode().is_destructive() { 7 } else { 6 };

        for (index, selection) in report.selections.iter().enumerate() {
            let hex = selection.digest.to_hex();
            writeln!(
                w,
                "{} {}: {} files, {} each ({}:{})",
                "Group".bold(),
                index + 1,
                selection.delete.len() + 1,
                format_size(selection.size),
                selection.digest.algorithm(),
                hex.get(..16).unwrap_or(&hex).dim()
            )?;
            write_member(w, &format!("{:<width$}", "keep"), &selection.keep, None)?;
            for record in &selection.delete {
                let status = statuses.of(&record.path);
                write_member(w, &format!("{:<width$}", status.label()), record, Some(status))?;
            }
            writeln!(w)?;
        }
        Ok(())
    }

    fn write_empty_dirs<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let report = self.report;
        if !report.empty_dirs_checked || report.empty_dirs.is_empty() {
            return Ok(());
        }

        writeln!(w, "{}", "Empty directories".bold())?;
        for dir in report.empty_dirs {
            writeln!(w, "  {}", dir.display().yellow())?;
        }
        writeln!(w)?;

        if report.mode().is_destructive() {
            writeln!(w, "{}", "Removed directories".bold())?;
            if report.actions.removed_dirs.is_empty() {
                writeln!(w, "  {}", "none".dim())?;
            }
            for dir in &report.actions.removed_dirs {
                writeln!(w, "  {}", dir.display().green())?;
            }
            writeln!(w)?;
        }
        Ok(())
    }

    fn write_summary<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let report = self.report;
        let actions = report.actions;
        let heading = match report.mode() {
            ActionMode::DryRun => "Summary (dry run, nothing was changed)",
            ActionMode::Destructive => "Summary",
        };

        writeln!(w, "{}", heading.bold())?;
        writeln!(w, "{}", "─".repeat(48).dim())?;
        writeln!(w, "  Root:                     {}", report.root.display())?;
        writeln!(w, "  Retention:                {}", report.retention)?;
        writeln!(
            w,
            "  Files scanned:            {} ({})",
            report.summary.total_files,
            format_size(report.summary.total_size)
        )?;
        writeln!(
            w,
            "  Duplicate groups:         {}",
            report.selections.len().cyan()
        )?;

        match report.mode() {
            ActionMode::DryRun => {
                writeln!(
                    w,
                    "  Files to delete:          {} ({})",
                    report.planned_deletions().yellow(),
                    format_size(report.planned_bytes())
                )?;
            }
            ActionMode::Destructive => {
                writeln!(
                    w,
                    "  Files deleted:            {} of {} ({} reclaimed)",
                    actions.deleted.len().green(),
                    report.planned_deletions(),
                    format_size(actions.bytes_freed)
                )?;
            }
        }

        if report.empty_dirs_checked {
            writeln!(
                w,
                "  Empty directories found:  {}",
                report.empty_dirs.len()
            )?;
            if report.mode().is_destructive() {
                writeln!(
                    w,
                    "  Empty dirs removed:       {}",
                    actions.removed_dirs.len().green()
                )?;
            }
        }

        if actions.interrupted {
            writeln!(w, "  {}", "Interrupted before all actions completed".red())?;
        }

        let errors = report.error_count();
        if errors == 0 {
            writeln!(w, "  Errors:                   none")
        } else {
            writeln!(w, "  Errors:                   {}", errors.red())
        }
    }

    fn write_errors<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let report = self.report;
        write_error_section(w, "Access errors", &report.summary.access_errors)?;
        write_error_section(w, "Read errors", &report.summary.read_errors)?;
        write_error_section(w, "Delete errors", &report.actions.failures)
    }
}

/// `status` is `None` for the kept copy.
fn write_member<W: Write>(
    w: &mut W,
    label: &str,
    record: &FileRecord,
    status: Option<DeleteStatus>,
) -> io::Result<()> {
    let path = record.path.display().to_string();
    let details = format!(
        "{:>10}  {}",
        format_size(record.size),
        format_time(record.modified)
    );
    match status {
        None => writeln!(w, "  {} {}  {}", label.green().bold(), path.green(), details.dim()),
        Some(DeleteStatus::Planned | DeleteStatus::Deleted) => {
            writeln!(w, "  {} {}  {}", label.red(), path, details.dim())
        }
        Some(DeleteStatus::Failed) => {
            writeln!(w, "  {} {}  {}", label.red().bold(), path.red(), details.dim())
        }
        Some(DeleteStatus::Skipped) => {
            writeln!(w, "  {} {}  {}", label.yellow(), path, details.dim())
        }
    }
}

fn write_error_section<W: Write, E: std::fmt::Display>(
    w: &mut W,
    title: &str,
    errors: &[E],
) -> io::Result<()> {
    if errors.is_empty() {
        return Ok(());
    }
    writeln!(w)?;
    writeln!(w, "{} ({})", title.red().bold(), errors.len())?;
    for error in errors {
        writeln!(w, "  {error}")?;
    }
    Ok(())
}

/// Human-readable byte size.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    ByteSize::b(bytes).to_string()
}

/// Local time as `YYYY-MM-DD HH:MM:SS`.
#[must_use]
pub fn format_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Render to a string; convenient for tests and logging.
#[must_use]
pub fn to_string(report: &Report<'_>) -> String {
    let mut buf = Vec::new();
    if TextOutput::new(report).write_to(&mut buf).is_err() {
        return String::new();
    }
    String::from_utf8_lossy(&buf).into_owned()
}
