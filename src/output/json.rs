//! JSON output formatter for duplicate scan results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "hash": "9f86d081...",
//!       "size": 1024,
//!       "files": ["/path/to/file1.txt", "/path/to/file2.txt"]
//!     }
//!   ],
//!   "summary": {
//!     "files_examined": 120,
//!     "total_files": 100,
//!     "total_size": 1048576,
//!     "skipped": 20,
//!     "eliminated_by_size": 60,
//!     "eliminated_by_fingerprint": 25,
//!     "fallback_files": 12,
//!     "full_digests": 15,
//!     "duplicate_groups": 5,
//!     "duplicate_files": 10,
//!     "reclaimable_space": 51200,
//!     "scan_duration_ms": 1234,
//!     "interrupted": false,
//!     "errors": [],
//!     "exit_code": 0,
//!     "exit_code_name": "DS000"
//!   }
//! }
//! ```
//!
//! `hash` is the lower-case hex SHA-256 of the file contents. Paths are
//! reported as discovered, rooted at the absolute scan root.

use std::io::Write;

use serde::Serialize;

use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::error::ExitCode;

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Entries examined by the walker
    pub files_examined: usize,
    /// Candidates that reached bucketing
    pub total_files: usize,
    /// Total size of all candidates in bytes
    pub total_size: u64,
    /// Entries filtered out during the walk
    pub skipped: usize,
    /// Candidates dropped for having a unique size and extension
    pub eliminated_by_size: usize,
    /// Candidates dropped for having a unique fingerprint
    pub eliminated_by_fingerprint: usize,
    /// Files too small for a head+tail fingerprint
    pub fallback_files: usize,
    /// Full SHA-256 digests computed
    pub full_digests: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding one original per group)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates (bytes)
    pub reclaimable_space: u64,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// Whether the scan was interrupted
    pub interrupted: bool,
    /// Messages for files dropped on error
    pub errors: Vec<String>,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DS000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a ScanSummary and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            files_examined: summary.files_examined,
            total_files: summary.total_files,
            total_size: summary.total_size,
            skipped: summary.skipped.total(),
            eliminated_by_size: summary.eliminated_by_size,
            eliminated_by_fingerprint: summary.eliminated_by_fingerprint,
            fallback_files: summary.fallback_files,
            full_digests: summary.full_digests,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
            interrupted: summary.interrupted,
            errors: summary.errors.iter().map(ToString::to_string).collect(),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
///
/// Groups serialize through [`DuplicateGroup`]'s own `Serialize` impl.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    /// List of duplicate groups
    pub duplicates: &'a [DuplicateGroup],
    /// Scan summary statistics
    pub summary: JsonSummary,
}

impl<'a> JsonOutput<'a> {
    /// Create a new JSON output from duplicate groups, summary and exit code.
    ///
    /// # Example
    ///
    /// ```
    /// use dupesweep::duplicates::{DuplicateGroup, ScanSummary};
    /// use dupesweep::error::ExitCode;
    /// use dupesweep::output::json::JsonOutput;
    /// use dupesweep::scanner::ContentDigest;
    /// use std::path::PathBuf;
    ///
    /// let groups = vec![DuplicateGroup::new(
    ///     ContentDigest::of_bytes(b"same"),
    ///     4,
    ///     vec![PathBuf::from("/a/same.txt"), PathBuf::from("/b/same.txt")],
    /// )];
    ///
    /// let output = JsonOutput::new(&groups, &ScanSummary::default(), ExitCode::Success);
    /// assert_eq!(output.duplicates.len(), 1);
    /// assert_eq!(output.duplicates[0].hash_hex().len(), 64);
    /// ```
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup], summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            duplicates: groups,
            summary: JsonSummary::from_scan_summary(summary, exit_code),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
