//! Candidate walker built on jwalk.
//!
//! # Overview
//!
//! [`Walker::walk`] returns a lazy, finite, non-restartable [`Candidates`]
//! iterator over the files below a root. Entries are filtered as they stream
//! past:
//!
//! - symbolic links are never yielded (and never followed)
//! - files with a skipped (executable) extension are dropped
//! - placeholders reported by the [`OfflineProbe`] are dropped
//! - gitignore-style patterns are honored, plus a root `.gitignore` when
//!   [`WalkerConfig::respect_gitignore`] is set
//! - entries that cannot be stat'd are yielded as [`ScanError`] values so
//!   the caller can log them and keep going
//!
//! Children are sorted by file name, so the walk order is deterministic.
//!
//! # Example
//!
//! ```no_run
//! use dupesweep::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig::default().with_skip_hidden(true);
//! let walker = Walker::new(Path::new("/home/user/Downloads"), config);
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("{} candidates", files.len());
//! ```

use std::fmt;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::WalkDir;

use super::offline::{OfflineProbe, PlatformProbe};
use super::{extension_of, FileCandidate, ScanError, WalkerConfig};
use crate::progress::ProgressCallback;
use crate::signal::CancelToken;

type WalkEntry = Result<jwalk::DirEntry<((), ())>, jwalk::Error>;

/// Directory walker producing [`FileCandidate`] values.
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Placeholder detection capability
    probe: Arc<dyn OfflineProbe>,
    /// Optional cancellation token
    cancel: Option<CancelToken>,
    /// Sink notified every `interval` examined entries
    progress: Option<(Arc<dyn ProgressCallback>, usize)>,
}

impl fmt::Debug for Walker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Walker")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("probe_supported", &self.probe.is_supported())
            .field("cancel", &self.cancel)
            .field("progress_interval", &self.progress.as_ref().map(|(_, n)| *n))
            .finish()
    }
}

impl Walker {
    /// Create a new walker for the given root.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            probe: Arc::new(PlatformProbe),
            cancel: None,
            progress: None,
        }
    }

    /// Replace the placeholder probe.
    #[must_use]
    pub fn with_offline_probe(mut self, probe: Arc<dyn OfflineProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Stop yielding entries once `token` is cancelled.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Report the examined count each time it reaches a multiple of
    /// `interval`, including runs of skipped entries.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>, interval: usize) -> Self {
        self.progress = Some((callback, interval.max(1)));
        self
    }

    /// Root this walker starts from.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }

    /// Build gitignore matcher from config patterns and, if enabled, the
    /// root .gitignore file.
    fn build_gitignore(&self) -> Option<Gitignore> {
        let mut builder = GitignoreBuilder::new(&self.root);

        let gitignore_path = self.root.join(".gitignore");
        if self.config.respect_gitignore && gitignore_path.is_file() {
            if let Some(e) = builder.add(&gitignore_path) {
                log::warn!(
                    "Failed to load .gitignore from {}: {}",
                    gitignore_path.display(),
                    e
                );
            } else {
                log::debug!("Loaded .gitignore from {}", gitignore_path.display());
            }
        }

        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if gitignore.is_empty() => None,
            Ok(gitignore) => Some(gitignore),
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Walk the directory tree.
    ///
    /// The returned iterator borrows the walker. Per-file problems are
    /// yielded as `Err` items; a failure to read the root itself is yielded
    /// as [`ScanError::RootUnreadable`].
    pub fn walk(&self) -> Candidates<'_> {
        let walk_dir = WalkDir::new(&self.root)
            .follow_links(false)
            .skip_hidden(self.config.skip_hidden)
            .sort(true);

        Candidates {
            walker: self,
            entries: Box::new(walk_dir.into_iter()),
            gitignore: self.build_gitignore(),
            examined: 0,
            skipped: SkipStats::default(),
        }
    }

    fn handle_jwalk_error(&self, error: jwalk::Error) -> ScanError {
        let source = std::io::Error::other(error.to_string());
        self.classify_walk_error(error.path().map(Path::to_path_buf), source)
    }

    /// Only an error naming the root itself is fatal.
    fn classify_walk_error(&self, path: Option<PathBuf>, source: std::io::Error) -> ScanError {
        match path {
            Some(path) if path == self.root => {
                log::error!("Cannot read scan root {}: {}", path.display(), source);
                ScanError::RootUnreadable { path, source }
            }
            Some(path) => {
                log::warn!("Walker error for {}: {}", path.display(), source);
                ScanError::Io { path, source }
            }
            None => {
                log::warn!("Walker error below {}: {}", self.root.display(), source);
                ScanError::Io {
                    path: self.root.clone(),
                    source,
                }
            }
        }
    }
}

/// Counts of entries the walker examined but did not yield.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipStats {
    /// Symbolic links
    pub symlinks: usize,
    /// Files with a skipped extension
    pub executables: usize,
    /// Offline placeholders
    pub offline: usize,
    /// Files matched by ignore patterns
    pub ignored: usize,
    /// Sockets, FIFOs, devices and other non-regular entries
    pub special: usize,
}

impl SkipStats {
    /// Total number of skipped entries.
    #[must_use]
    pub fn total(&self) -> usize {
        self.symlinks + self.executables + self.offline + self.ignored + self.special
    }
}

/// Lazy stream of candidates produced by [`Walker::walk`].
pub struct Candidates<'a> {
    walker: &'a Walker,
    entries: Box<dyn Iterator<Item = WalkEntry> + 'a>,
    gitignore: Option<Gitignore>,
    examined: usize,
    skipped: SkipStats,
}

impl Candidates<'_> {
    /// Number of non-directory entries examined so far. Never decreases.
    #[must_use]
    pub fn examined(&self) -> usize {
        self.examined
    }

    /// Entries examined but filtered out so far.
    #[must_use]
    pub fn skipped(&self) -> SkipStats {
        self.skipped
    }

    fn is_ignored(&self, path: &Path) -> bool {
        self.gitignore.as_ref().is_some_and(|gi| {
            gi.matched_path_or_any_parents(path, false).is_ignore()
        })
    }

    /// Apply the candidate filters to one walk entry.
    fn process(&mut self, entry: jwalk::DirEntry<((), ())>) -> Option<Result<FileCandidate, ScanError>> {
        let path = entry.path();
        let file_type = entry.file_type();

        if file_type.is_dir() {
            return None;
        }
        self.examined += 1;
        if let Some((callback, interval)) = &self.walker.progress {
            if self.examined % interval == 0 {
                callback.on_progress(self.examined);
            }
        }

        if file_type.is_symlink() {
            log::trace!("Skipping symlink: {}", path.display());
            self.skipped.symlinks += 1;
            return None;
        }

        let extension = extension_of(&path);
        if self.walker.config.is_skipped_extension(&extension) {
            log::trace!("Skipping executable: {}", path.display());
            self.skipped.executables += 1;
            return None;
        }

        if self.is_ignored(&path) {
            log::trace!("Ignoring file: {}", path.display());
            self.skipped.ignored += 1;
            return None;
        }

        let metadata = match std::fs::symlink_metadata(&path) {
            Ok(m) => m,
            Err(e) => {
                let err = ScanError::from_io(&path, e);
                log::warn!("Could not access {}: {}", path.display(), err);
                return Some(Err(err));
            }
        };

        self.accept(path, extension, &metadata)
    }

    fn accept(
        &mut self,
        path: PathBuf,
        extension: String,
        metadata: &Metadata,
    ) -> Option<Result<FileCandidate, ScanError>> {
        if metadata.file_type().is_symlink() {
            self.skipped.symlinks += 1;
            return None;
        }
        if !metadata.is_file() {
            log::trace!("Skipping non-regular entry: {}", path.display());
            self.skipped.special += 1;
            return None;
        }

        if self.walker.config.detect_offline && self.walker.probe.is_offline(&path, metadata) {
            log::info!("Skipping offline file: {}", path.display());
            self.skipped.offline += 1;
            return None;
        }

        Some(Ok(FileCandidate {
            path,
            size: metadata.len(),
            extension,
        }))
    }
}

impl Iterator for Candidates<'_> {
    type Item = Result<FileCandidate, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.walker.is_cancelled() {
                log::debug!("Walker: cancellation requested, stopping iteration");
                return None;
            }

            match self.entries.next()? {
                Ok(entry) => {
                    if let Some(item) = self.process(entry) {
                        return Some(item);
                    }
                }
                Err(e) => return Some(Err(self.walker.handle_jwalk_error(e))),
            }
        }
    }
}
