//! Scanner module for candidate discovery and content hashing.
//!
//! This module provides functionality for:
//! - Directory walking using jwalk, yielding [`FileCandidate`] values
//! - Placeholder (offline/cloud stub) detection where the platform exposes it
//! - Head+tail fingerprints (BLAKE3) and full-content digests (SHA-256)
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and candidate filtering
//! - [`offline`]: Optional placeholder detection capability
//! - [`hasher`]: Partial fingerprints and full digests (streaming)
//!
//! # Example
//!
//! ```no_run
//! use dupesweep::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! let mut candidates = walker.walk();
//! for entry in candidates.by_ref() {
//!     match entry {
//!         Ok(file) => println!("{} ({} bytes, ext {:?})", file.path.display(), file.size, file.extension),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! println!("{} files examined", candidates.examined());
//! ```

pub mod hasher;
pub mod offline;
pub mod walker;

use std::path::{Path, PathBuf};

// Re-export main types
pub use hasher::{
    ContentDigest, Fingerprint, Hasher, HasherConfig, FULL_CHUNK_SIZE, MAX_CHUNK_SIZE,
    PARTIAL_CHUNK_SIZE,
};
pub use offline::{NoopProbe, OfflineProbe, PlatformProbe};
pub use walker::{Candidates, SkipStats, Walker};

/// A file eligible for duplicate analysis.
///
/// Produced by the [`Walker`]; consumed (and discarded) by the size bucketer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    /// Path to the file, rooted at the scanned directory
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Lower-cased extension including the leading dot, or empty
    pub extension: String,
}

impl FileCandidate {
    /// Create a new candidate, deriving the extension from the path.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        let extension = extension_of(&path);
        Self {
            path,
            size,
            extension,
        }
    }
}

/// Lower-cased extension of `path` with its leading dot.
///
/// Dotfiles such as `.bashrc` have no extension; a trailing dot yields `"."`.
///
/// ```
/// use dupesweep::scanner::extension_of;
/// use std::path::Path;
///
/// assert_eq!(extension_of(Path::new("Photo.JPG")), ".jpg");
/// assert_eq!(extension_of(Path::new("archive.tar.gz")), ".gz");
/// assert_eq!(extension_of(Path::new("Makefile")), "");
/// assert_eq!(extension_of(Path::new(".bashrc")), "");
/// ```
#[must_use]
pub fn extension_of(path: &Path) -> String {
    match path.extension() {
        Some(ext) => format!(".{}", ext.to_string_lossy().to_lowercase()),
        None => String::new(),
    }
}

/// Configuration for directory walking.
///
/// Controls filtering and other walk behavior. Symbolic links are never
/// followed and never yielded.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Extensions (without the dot, case-insensitive) that are never candidates.
    pub skip_extensions: Vec<String>,

    /// Glob patterns to ignore (gitignore-style).
    pub ignore_patterns: Vec<String>,

    /// Also apply a `.gitignore` found at the root. Off by default, so every
    /// byte-identical file below the root is compared.
    pub respect_gitignore: bool,

    /// Consult the placeholder probe and skip offline entries.
    pub detect_offline: bool,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            skip_hidden: false,
            skip_extensions: vec!["exe".to_string()],
            ignore_patterns: Vec::new(),
            respect_gitignore: false,
            detect_offline: true,
        }
    }
}

impl WalkerConfig {
    /// Set whether hidden entries are skipped.
    #[must_use]
    pub fn with_skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    /// Replace the list of skipped (executable) extensions.
    ///
    /// Leading dots are stripped and values are lower-cased.
    #[must_use]
    pub fn with_skip_extensions(mut self, extensions: Vec<String>) -> Self {
        self.skip_extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    /// Set gitignore-style ignore patterns.
    #[must_use]
    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    /// Set whether a root `.gitignore` is honored.
    #[must_use]
    pub fn with_respect_gitignore(mut self, enabled: bool) -> Self {
        self.respect_gitignore = enabled;
        self
    }

    /// Enable or disable placeholder detection.
    #[must_use]
    pub fn with_detect_offline(mut self, enabled: bool) -> Self {
        self.detect_offline = enabled;
        self
    }

    /// Whether a candidate extension (with leading dot) is on the skip list.
    #[must_use]
    pub fn is_skipped_extension(&self, extension: &str) -> bool {
        let bare = extension.trim_start_matches('.');
        !bare.is_empty() && self.skip_extensions.iter().any(|e| e == bare)
    }
}

/// Errors that can occur during directory scanning.
///
/// Every variant is skippable: the affected file is dropped and the scan
/// continues. Fatal conditions are reported by
/// [`FinderError`](crate::duplicates::FinderError) instead.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The entry disappeared between listing and stat.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The root itself could not be read.
    #[error("Cannot read scan root {path}: {source}")]
    RootUnreadable {
        /// Root path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A file was dropped during partial or full hashing.
    #[error(transparent)]
    Hash(#[from] HashError),
}

impl ScanError {
    /// Classify an I/O error raised while accessing `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Errors that can occur during file hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Hashing stopped because the scan was cancelled.
    #[error("Hashing cancelled: {0}")]
    Cancelled(PathBuf),
}

impl HashError {
    /// Classify an I/O error raised while hashing `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Whether this error only reflects cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}
