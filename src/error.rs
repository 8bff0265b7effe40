//! Structured error handling and exit codes.

use serde::Serialize;

/// Process exit codes.
///
/// - 0: annotations were found (or the command has nothing to report)
/// - 1: unexpected failure
/// - 2: the scan or listing completed without any annotation
/// - 130: interrupted by Ctrl+C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Completed; annotations were found.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// Completed; no annotations were found.
    NoAnnotations = 2,
    /// Cancelled by the user.
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
            Self::Success => "TB000",
            Self::GeneralError => "TB001",
            Self::NoAnnotations => "TB002",
            Self::Interrupted => "TB130",
        }
    }

    /// Code for a completed run that produced `count` annotations.
    #[must_use]
    pub fn for_count(count: usize) -> Self {
        if count == 0 {
            Self::NoAnnotations
        } else {
            Self::Success
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "TB001")
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
