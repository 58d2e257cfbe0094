//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based candidate narrowing
//! - Digest grouping of hashed files
//! - Retention selection (which copy survives)
//! - Pipeline orchestration over a directory tree

pub mod finder;
pub mod groups;
pub mod retention;

pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanOutcome, ScanSummary};
pub use groups::{group_by_digest, group_by_size, DuplicateGroup, GroupingStats};
pub use retention::{select, select_all, RetentionPolicy, Selection};
