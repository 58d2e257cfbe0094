//! Command-line interface definitions.
//!
//! All options are flat flags on a single command, defined with the clap
//! derive API. Values given here override the config file and environment.
//!
//! # Example
//!
//! ```bash
//! # Report duplicate photos under ~/Pictures, keeping the oldest copy
//! treedupe -d ~/Pictures -f jpg,png -o
//!
//! # Also report empty directories, skipping VCS metadata
//! treedupe -d ~/src -e -b .git,node_modules
//!
//! # Actually delete duplicates and empty directories
//! treedupe -d ~/Downloads -e -r
//!
//! # Machine-readable report
//! treedupe -d ~/Downloads --output json
//! ```

use bytesize::ByteSize;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::duplicates::RetentionPolicy;
use crate::scanner::{BlacklistMode, HashAlgorithm};

/// Find duplicate files by content and optionally remove all but one copy.
///
/// Without --remove nothing is changed on disk; the report shows what would
/// be deleted.
#[derive(Debug, Parser)]
#[command(name = "treedupe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Root directory to scan (default: current directory)
    #[arg(short = 'd', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Only consider files with these extensions (comma separated, case-insensitive)
    #[arg(
        short = 'f',
        long = "file-extensions",
        value_name = "EXT",
        value_delimiter = ','
    )]
    pub file_extensions: Vec<String>,

    /// Skip paths containing these tokens (comma separated)
    #[arg(
        short = 'b',
        long = "path-blacklist",
        value_name = "TOKEN",
        value_delimiter = ','
    )]
    pub path_blacklist: Vec<String>,

    /// How blacklist tokens match paths
    ///
    /// segment: a token must equal a whole path component (or a run of
    /// components when it contains '/'). substring: raw substring match.
    #[arg(long, value_enum, value_name = "MODE")]
    pub blacklist_mode: Option<BlacklistMode>,

    /// Keep the oldest copy of each duplicate group
    #[arg(short = 'o', long, conflicts_with = "newest")]
    pub oldest: bool,

    /// Keep the newest copy of each duplicate group (default)
    #[arg(long)]
    pub newest: bool,

    /// Report empty directories, and remove them with --remove
    #[arg(short = 'e', long)]
    pub empty: bool,

    /// Delete duplicates (and empty directories with --empty)
    ///
    /// Deletion is permanent.
    #[arg(short = 'r', long, conflicts_with = "dry_run")]
    pub remove: bool,

    /// Only report what would be removed (the default)
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Content hash algorithm
    #[arg(long, value_enum, value_name = "ALGO")]
    pub algorithm: Option<HashAlgorithm>,

    /// Number of I/O threads for hashing (default: 4)
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Minimum file size to consider (e.g., 1KB, 1MiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Maximum file size to consider (e.g., 1KB, 1MiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub max_size: Option<u64>,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Read settings from this TOML file instead of the default location
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress and all log output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,
}

impl Cli {
    /// Retention policy requested on the command line, if any.
    #[must_use]
    pub fn retention(&self) -> Option<RetentionPolicy> {
        if self.oldest {
            Some(RetentionPolicy::KeepOldest)
        } else if self.newest {
            Some(RetentionPolicy::KeepNewest)
        } else {
            None
        }
    }
}

/// Report formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    #[default]
    Text,
    /// JSON document on stdout
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Accepts what [`ByteSize`] parses: a number with an optional unit where
/// `KB`, `MB`, ... are powers of 1000 and `KiB`, `MiB`, ... powers of 1024.
///
/// # Errors
///
/// Returns a message for empty or negative input and for anything
/// [`ByteSize`] rejects.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err(format!("Size cannot be negative: '{s}'"));
    }

    s.parse::<ByteSize>()
        .map(|size| size.as_u64())
        .map_err(|e| format!("Invalid size '{s}': {e}"))
}
