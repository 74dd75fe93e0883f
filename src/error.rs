//! Structured error handling and exit codes.

use serde::Serialize;

use crate::duplicates::{DuplicateGroup, ScanSummary};

/// Process exit codes.
///
/// - 0: Success (completed normally, duplicates found)
/// - 1: General error (fatal failure before or during the scan)
/// - 2: No duplicates found (completed normally, no duplicates)
/// - 3: Partial success (completed, but some files could not be read)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: Scan completed and duplicates were found.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// No duplicates: Scan completed but no duplicates were found.
    NoDuplicates = 2,
    /// Partial success: Scan completed but some files were dropped on error.
    PartialSuccess = 3,
    /// Interrupted: Scan was cancelled by the user.
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
            Self::Success => "DS000",
            Self::GeneralError => "DS001",
            Self::NoDuplicates => "DS002",
            Self::PartialSuccess => "DS003",
            Self::Interrupted => "DS130",
        }
    }

    /// Exit code for a finished scan.
    ///
    /// Interruption wins over per-file errors, which win over the
    /// found/not-found distinction.
    #[must_use]
    pub fn for_scan(groups: &[DuplicateGroup], summary: &ScanSummary) -> Self {
        if summary.interrupted {
            Self::Interrupted
        } else if summary.has_errors() {
            Self::PartialSuccess
        } else if groups.is_empty() {
            Self::NoDuplicates
        } else {
            Self::Success
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DS001")
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{ContentDigest, HashError, ScanError};
    use std::path::PathBuf;

    fn group() -> DuplicateGroup {
        DuplicateGroup::new(
            ContentDigest::of_bytes(b"x"),
            1,
            vec![PathBuf::from("/a/x"), PathBuf::from("/b/x")],
        )
    }

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::NoDuplicates.as_i32(), 2);
        assert_eq!(ExitCode::PartialSuccess.as_i32(), 3);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
    }

    #[test]
    fn test_code_prefixes() {
        assert_eq!(ExitCode::Success.code_prefix(), "DS000");
        assert_eq!(ExitCode::Interrupted.code_prefix(), "DS130");
    }

    #[test]
    fn test_for_scan_precedence() {
        let groups = vec![group()];
        let mut summary = ScanSummary::default();
        assert_eq!(ExitCode::for_scan(&groups, &summary), ExitCode::Success);
        assert_eq!(ExitCode::for_scan(&[], &summary), ExitCode::NoDuplicates);

        summary.errors.push(ScanError::Hash(HashError::NotFound(
            PathBuf::from("/gone"),
        )));
        assert_eq!(ExitCode::for_scan(&[], &summary), ExitCode::PartialSuccess);

        summary.interrupted = true;
        assert_eq!(ExitCode::for_scan(&groups, &summary), ExitCode::Interrupted);
    }

    #[test]
    fn test_structured_error_serializes() {
        let err = anyhow::anyhow!("Path not found: /nope");
        let structured = StructuredError::new(&err, ExitCode::GeneralError);
        let json = serde_json::to_string(&structured).unwrap();

        assert!(json.contains("\"code\":\"DS001\""));
        assert!(json.contains("\"exit_code\":1"));
        assert!(json.contains("Path not found"));
        assert!(json.contains("\"interrupted\":false"));
    }
}
