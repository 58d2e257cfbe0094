//! Exit codes and structured error output.

use serde::Serialize;

use crate::config::ConfigError;
use crate::duplicates::FinderError;

/// Process exit codes.
///
/// - 0: Success, including runs where some files were skipped or failed to delete
/// - 1: General error (unexpected failure)
/// - 2: Configuration error (bad root, bad settings)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Run completed; per-item failures are reported, not fatal.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// The run could not start because of invalid configuration.
    ConfigError = 2,
    /// Interrupted by Ctrl+C.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "TD000",
            Self::GeneralError => "TD001",
            Self::ConfigError => "TD002",
            Self::Interrupted => "TD130",
        }
    }

    /// Pick the exit code for an error that ended the run.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        if err.chain().any(|cause| {
            cause
                .downcast_ref::<FinderError>()
                .is_some_and(|e| matches!(e, FinderError::Interrupted))
        }) {
            return Self::Interrupted;
        }

        let is_config = err.chain().any(|cause| {
            cause.is::<ConfigError>()
                || cause
                    .downcast_ref::<FinderError>()
                    .is_some_and(|e| {
                        matches!(e, FinderError::PathNotFound(_) | FinderError::NotADirectory(_))
                    })
        });
        if is_config {
            Self::ConfigError
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "TD002")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
