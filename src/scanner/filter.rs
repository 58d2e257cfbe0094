//! Path eligibility filtering.
//!
//! # Overview
//!
//! A [`PathFilter`] decides whether a file is considered by the scan. Two
//! independent rules apply:
//!
//! - **Extension allow-list**: when non-empty, the file extension (text after
//!   the last `.` of the file name) must be in the list. Comparison is
//!   case-insensitive, so `photo.JPG` matches `jpg`.
//! - **Blacklist**: a path is excluded when any token matches anywhere along
//!   it, including ancestor directories. Blacklisting `.git` therefore
//!   excludes everything under `.git/objects/`.
//!
//! Blacklist tokens match whole path segments by default. A token containing
//! a separator (`node_modules/.cache`) matches a contiguous run of segments.
//! [`BlacklistMode::Substring`] switches to raw substring matching on the
//! `/`-joined path.
//!
//! # Example
//!
//! ```
//! use treedupe::scanner::{BlacklistMode, PathFilter};
//! use std::path::Path;
//!
//! let filter = PathFilter::new(
//!     &["jpg".to_string(), "png".to_string()],
//!     &[".git".to_string()],
//!     BlacklistMode::Segment,
//! );
//!
//! assert!(filter.is_eligible(Path::new("photos/holiday.JPG")));
//! assert!(!filter.is_eligible(Path::new(".git/objects/ab/cdef.png")));
//! assert!(!filter.is_eligible(Path::new("notes.txt")));
//! ```

use std::collections::BTreeSet;
use std::path::{Component, Path};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How blacklist tokens are compared against a path.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BlacklistMode {
    /// Tokens must equal whole path segments (`git` does not match `.git`).
    #[default]
    Segment,
    /// Tokens match any substring of the path.
    Substring,
}

impl std::fmt::Display for BlacklistMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Segment => write!(f, "segment"),
            Self::Substring => write!(f, "substring"),
        }
    }
}

/// Pure eligibility check for file paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathFilter {
    /// Lowercased extensions without leading dot
    extensions: BTreeSet<String>,
    /// Blacklist tokens split into segments
    blacklist: Vec<Vec<String>>,
    /// Raw blacklist tokens for substring mode
    raw_blacklist: Vec<String>,
    mode: BlacklistMode,
}

impl PathFilter {
    /// Build a filter from user-supplied lists.
    ///
    /// Extensions may be given with or without a leading dot and in any case.
    /// Empty entries are ignored in both lists.
    #[must_use]
    pub fn new(extensions: &[String], blacklist: &[String], mode: BlacklistMode) -> Self {
        let extensions = extensions
            .iter()
            .filter_map(|ext| normalize_extension(ext))
            .collect();

        let raw_blacklist: Vec<String> = blacklist
            .iter()
            .map(|token| token.trim().replace('\\', "/"))
            .filter(|token| !token.is_empty())
            .collect();

        let blacklist = raw_blacklist
            .iter()
            .map(|token| {
                token
                    .split('/')
                    .filter(|segment| !segment.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .filter(|segments| !segments.is_empty())
            .collect();

        Self {
            extensions,
            blacklist,
            raw_blacklist,
            mode,
        }
    }

    /// Filter that accepts every path.
    #[must_use]
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Configured extensions, lowercased and sorted.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }

    /// Blacklist matching mode.
    #[must_use]
    pub fn mode(&self) -> BlacklistMode {
        self.mode
    }

    /// Check whether a file path is eligible for scanning.
    ///
    /// The walker passes paths relative to the scan root, so blacklist
    /// tokens are never matched against the root's own ancestors.
    #[must_use]
    pub fn is_eligible(&self, path: &Path) -> bool {
        self.matches_extension(path) && !self.is_blacklisted(path)
    }

    /// Check the extension allow-list only.
    #[must_use]
    pub fn matches_extension(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }

        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.extensions.contains(&ext))
    }

    /// Check whether any blacklist token matches the path.
    #[must_use]
    pub fn is_blacklisted(&self, path: &Path) -> bool {
        if self.raw_blacklist.is_empty() {
            return false;
        }

        let segments: Vec<String> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        match self.mode {
            BlacklistMode::Segment => self
                .blacklist
                .iter()
                .any(|token| contains_run(&segments, token)),
            BlacklistMode::Substring => {
                let joined = segments.join("/");
                self.raw_blacklist
                    .iter()
                    .any(|token| joined.contains(token.as_str()))
            }
        }
    }
}

/// Normalize a user-supplied extension: trim, drop leading dots, lowercase.
fn normalize_extension(ext: &str) -> Option<String> {
    let ext = ext.trim().trim_start_matches('.');
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}

/// True when `needle` appears as a contiguous run inside `haystack`.
fn contains_run(haystack: &[String], needle: &[String]) -> bool {
    needle.len() <= haystack.len() && haystack.windows(needle.len()).any(|w| w == needle)
}
