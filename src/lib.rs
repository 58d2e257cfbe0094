//! treedupe - duplicate file finder
//!
//! Walks a directory tree, groups files by content digest, keeps one copy of
//! each group according to a retention policy and reports (or, with
//! `--remove`, deletes) the rest. Empty directories can be reported and
//! removed the same way.
//!
//! The pipeline:
//! 1. [`config`]: merge defaults, config file, environment and CLI flags
//! 2. [`scanner`]: walk and filter the tree, hash candidates
//! 3. [`duplicates`]: group by size then digest, pick survivors
//! 4. [`actions`]: delete or dry-run
//! 5. [`output`]: text or JSON report

pub mod actions;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{IsTerminal, Write};
use std::sync::Arc;

use anyhow::Context;

use crate::actions::{ActionExecutor, ActionMode};
use crate::cli::{Cli, OutputFormat};
use crate::config::{ConfigError, ScanConfig, Settings};
use crate::duplicates::{select_all, DuplicateFinder};
use crate::error::ExitCode;
use crate::output::Report;
use crate::progress::Progress;

/// Run the application and print the report to stdout.
///
/// # Errors
///
/// Returns an error for invalid configuration, a bad root, an interrupted
/// scan or a failure to write the report. Per-file problems are recovered
/// and listed in the report instead.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    if cli.no_color || !std::io::stdout().is_terminal() {
        yansi::disable();
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run_with_writer(&cli, &mut out)
}

/// Run the full pipeline and render the report to `writer`.
///
/// Does not touch logging or color state; [`run_app`] sets those up.
///
/// # Errors
///
/// See [`run_app`].
pub fn run_with_writer<W: Write>(cli: &Cli, writer: &mut W) -> anyhow::Result<ExitCode> {
    let settings = Settings::load(cli.config.as_deref())
        .context("Failed to load configuration")?
        .apply_cli(cli);

    let root = match &cli.directory {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().map_err(ConfigError::CurrentDir)?,
    };

    let config = ScanConfig::from_settings(
        &root,
        &settings,
        ActionMode::from_remove_flag(cli.remove),
        cli.empty,
    )?;

    log::debug!(
        "Resolved root {} ({}, {})",
        config.root().display(),
        config.retention(),
        if config.mode().is_destructive() {
            "remove"
        } else {
            "dry run"
        }
    );

    let shutdown = signal::install_handler()?;
    let progress = Arc::new(Progress::new(cli.quiet || cli.output == OutputFormat::Json));

    let finder = DuplicateFinder::new(
        config
            .finder_config()
            .with_shutdown_flag(shutdown.get_flag())
            .with_progress_callback(progress.clone()),
    );
    let outcome = finder
        .find_duplicates(config.root())
        .with_context(|| format!("Scan of {} failed", config.root().display()))?;

    let selections = select_all(outcome.groups, config.retention());

    let executor = ActionExecutor::new(config.mode())
        .with_shutdown_flag(shutdown.get_flag())
        .with_progress_callback(progress);
    let actions = executor.execute(&selections, &outcome.empty_dirs);

    let report = Report {
        root: config.root(),
        retention: config.retention(),
        algorithm: config.algorithm(),
        selections: &selections,
        empty_dirs: &outcome.empty_dirs,
        empty_dirs_checked: config.detect_empty_dirs(),
        summary: &outcome.summary,
        actions: &actions,
    };
    output::render(&report, cli.output, writer).context("Failed to write report")?;
    writer.flush().context("Failed to write report")?;

    if outcome.summary.has_errors() || !actions.all_succeeded() {
        log::warn!("Finished with {} recovered error(s)", report.error_count());
    }

    if actions.interrupted {
        log::warn!("Interrupted before all actions completed");
        Ok(ExitCode::Interrupted)
    } else {
        Ok(ExitCode::Success)
    }
}
