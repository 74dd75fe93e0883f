//! Duplicate finder orchestrating one scan session.
//!
//! # Overview
//!
//! A scan runs the detection pipeline end to end:
//! 1. **Walk** - stream candidates from the root (see [`crate::scanner::walker`])
//! 2. **Bucket** - group by `(size, extension)`, drop singletons
//! 3. **Hash** - fingerprint, then fully digest collisions on a bounded pool
//!    (see [`crate::duplicates::coordinator`])
//! 4. **Aggregate** - collect verified groups
//!
//! Every structure built along the way (buckets, fingerprints, pool) belongs
//! to the session and is dropped when [`DuplicateFinder::find_duplicates`]
//! returns.
//!
//! The order of groups across buckets depends on scheduling and is not
//! deterministic. Inside a group, files are listed in walk order.
//!
//! # Example
//!
//! ```no_run
//! use dupesweep::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::Path;
//!
//! let config = FinderConfig::default().with_io_threads(4);
//! let finder = DuplicateFinder::new(config);
//!
//! let (groups, summary) = finder.find_duplicates(Path::new("/some/path")).unwrap();
//!
//! println!("Found {} duplicate groups", summary.duplicate_groups);
//! println!("Reclaimable space: {}", summary.reclaimable_display());
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;

use super::aggregator::DuplicateAggregator;
use super::coordinator::Coordinator;
use super::groups::{DuplicateGroup, SizeBucketer};
use crate::progress::{ProgressCallback, ScanPhase};
use crate::scanner::{
    FileCandidate, Hasher, HasherConfig, OfflineProbe, ScanError, SkipStats, Walker, WalkerConfig,
};
use crate::signal::CancelToken;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of hashing threads. 0 uses the available parallelism.
    pub io_threads: usize,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Chunk sizes for fingerprints and digests.
    pub hasher_config: HasherConfig,
    /// Optional cancellation token.
    pub cancel_token: Option<CancelToken>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
    /// Notify progress at every multiple of this many examined entries,
    /// plus the final count.
    pub progress_interval: usize,
    /// Placeholder probe replacing the platform default.
    pub offline_probe: Option<Arc<dyn OfflineProbe>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("walker_config", &self.walker_config)
            .field("hasher_config", &self.hasher_config)
            .field("cancel_token", &self.cancel_token)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .field("progress_interval", &self.progress_interval)
            .field(
                "offline_probe",
                &self.offline_probe.as_ref().map(|_| "<probe>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 0,
            walker_config: WalkerConfig::default(),
            hasher_config: HasherConfig::default(),
            cancel_token: None,
            progress_callback: None,
            progress_interval: 100,
            offline_probe: None,
        }
    }
}

impl FinderConfig {
    /// Set the hashing thread count (0 = available parallelism).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the hasher chunk sizes.
    #[must_use]
    pub fn with_hasher_config(mut self, config: HasherConfig) -> Self {
        self.hasher_config = config;
        self
    }

    /// Set the cancellation token.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Set the progress cadence (minimum 1).
    #[must_use]
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval.max(1);
        self
    }

    /// Replace the placeholder probe.
    #[must_use]
    pub fn with_offline_probe(mut self, probe: Arc<dyn OfflineProbe>) -> Self {
        self.offline_probe = Some(probe);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_token
            .as_ref()
            .is_some_and(CancelToken::is_cancelled)
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Non-directory entries the walker examined
    pub files_examined: usize,
    /// Candidates that reached bucketing
    pub total_files: usize,
    /// Total size of all candidates in bytes
    pub total_size: u64,
    /// Entries the walker filtered out, by reason
    pub skipped: SkipStats,
    /// Candidates dropped as the only member of their (size, extension) bucket
    pub eliminated_by_size: usize,
    /// Candidates dropped because no other member shared their fingerprint
    pub eliminated_by_fingerprint: usize,
    /// Files digested fully in place of a fingerprint
    pub fallback_files: usize,
    /// SHA-256 digests computed
    pub full_digests: usize,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding one original per group)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates
    pub reclaimable_space: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Whether the scan was cancelled before finishing
    pub interrupted: bool,
    /// Per-file errors; each affected file was dropped
    pub errors: Vec<ScanError>,
}

impl ScanSummary {
    /// Calculate the percentage of space that is wasted by duplicates.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize(self.reclaimable_space).to_string()
    }

    /// Format total size as human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize(self.total_size).to_string()
    }

    /// Whether any file was dropped because of an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Fatal scan errors. Per-file problems are reported in
/// [`ScanSummary::errors`] instead.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The root exists but cannot be listed.
    #[error("Cannot read scan root {path}: {source}")]
    RootUnreadable {
        /// Root path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The hashing pool could not be created.
    #[error("Failed to start hashing pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Duplicate finder that runs scan sessions.
///
/// The finder itself holds only configuration; every call builds and drops
/// its own buckets and pool, so one finder can run several scans.
///
/// # Example
///
/// ```no_run
/// use dupesweep::duplicates::DuplicateFinder;
/// use std::path::Path;
///
/// let finder = DuplicateFinder::with_defaults();
/// match finder.find_duplicates(Path::new(".")) {
///     Ok((groups, summary)) => {
///         println!("Found {} duplicate groups", groups.len());
///         println!("Can reclaim {} bytes", summary.reclaimable_space);
///     }
///     Err(e) => eprintln!("Scan failed: {}", e),
/// }
/// ```
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self { config }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    fn build_coordinator(&self) -> Result<Coordinator, FinderError> {
        let mut hasher = Hasher::with_config(self.config.hasher_config);
        if let Some(ref token) = self.config.cancel_token {
            hasher = hasher.with_cancel_token(token.clone());
        }

        let mut coordinator = Coordinator::new(self.config.io_threads, hasher)?
            .with_progress_interval(self.config.progress_interval);
        if let Some(ref token) = self.config.cancel_token {
            coordinator = coordinator.with_cancel_token(token.clone());
        }
        if let Some(ref callback) = self.config.progress_callback {
            coordinator = coordinator.with_progress_callback(Arc::clone(callback));
        }
        Ok(coordinator)
    }

    /// Find all duplicate files below `path`.
    ///
    /// Reported paths are rooted at the absolute form of `path` (symlinks in
    /// `path` itself are not resolved).
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - The path does not exist or is not a directory
    /// - The root cannot be listed
    /// - The hashing pool cannot be started
    ///
    /// Cancellation is not an error: the groups verified so far are returned
    /// with [`ScanSummary::interrupted`] set.
    pub fn find_duplicates(
        &self,
        path: &Path,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let root = validate_root(path)?;

        log::info!("Starting duplicate scan of {}", root.display());
        let coordinator = self.build_coordinator()?;

        let mut summary = ScanSummary::default();
        let bucketer = self.walk(&root, &mut summary)?;

        if self.config.is_cancelled() {
            log::info!("Scan cancelled during walk");
            summary.interrupted = true;
            summary.total_files = bucketer.len();
            summary.scan_duration = start_time.elapsed();
            return Ok((Vec::new(), summary));
        }

        let groups = self.hash_buckets(&coordinator, bucketer, &mut summary);
        summary.scan_duration = start_time.elapsed();
        log_complete(&summary);

        Ok((groups, summary))
    }

    /// Find duplicates among a pre-collected list of candidates.
    ///
    /// Skips the walk; bucketing and hashing run as in
    /// [`find_duplicates`](Self::find_duplicates).
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::ThreadPool`] if the hashing pool cannot be
    /// started.
    pub fn find_duplicates_in_candidates(
        &self,
        candidates: Vec<FileCandidate>,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        let coordinator = self.build_coordinator()?;

        let mut summary = ScanSummary {
            files_examined: candidates.len(),
            ..ScanSummary::default()
        };

        let mut bucketer = SizeBucketer::new();
        for candidate in candidates {
            bucketer.insert(candidate);
        }

        let groups = self.hash_buckets(&coordinator, bucketer, &mut summary);
        summary.scan_duration = start_time.elapsed();
        log_complete(&summary);

        Ok((groups, summary))
    }

    /// Walk `root` and bucket every candidate.
    fn walk(&self, root: &Path, summary: &mut ScanSummary) -> Result<SizeBucketer, FinderError> {
        let callback = self.config.progress_callback.as_ref();
        if let Some(callback) = callback {
            callback.on_phase_start(ScanPhase::Walking, 0);
            callback.on_message(&format!("Walking {}", root.display()));
        }

        let mut walker = Walker::new(root, self.config.walker_config.clone());
        if let Some(ref token) = self.config.cancel_token {
            walker = walker.with_cancel_token(token.clone());
        }
        if let Some(ref probe) = self.config.offline_probe {
            walker = walker.with_offline_probe(Arc::clone(probe));
        }

        let interval = self.config.progress_interval.max(1);
        if let Some(callback) = callback {
            walker = walker.with_progress(Arc::clone(callback), interval);
        }
        let mut bucketer = SizeBucketer::new();
        let mut candidates = walker.walk();

        while let Some(result) = candidates.next() {
            match result {
                Ok(candidate) => bucketer.insert(candidate),
                Err(ScanError::RootUnreadable { path, source }) => {
                    return Err(FinderError::RootUnreadable { path, source });
                }
                Err(e) => summary.errors.push(e),
            }
        }

        summary.files_examined = candidates.examined();
        summary.skipped = candidates.skipped();

        if let Some(callback) = callback {
            if summary.files_examined % interval != 0 {
                callback.on_progress(summary.files_examined);
            }
            callback.on_phase_end(ScanPhase::Walking);
        }

        log::info!(
            "Walk complete: {} examined, {} candidates, {} skipped",
            summary.files_examined,
            bucketer.len(),
            summary.skipped.total()
        );

        Ok(bucketer)
    }

    fn hash_buckets(
        &self,
        coordinator: &Coordinator,
        bucketer: SizeBucketer,
        summary: &mut ScanSummary,
    ) -> Vec<DuplicateGroup> {
        let (sets, grouping) = bucketer.into_potential_sets();
        summary.total_files = grouping.total_files;
        summary.total_size = grouping.total_size;
        summary.eliminated_by_size = grouping.eliminated_unique;

        if sets.is_empty() {
            log::info!("No potential duplicates after bucketing");
            summary.interrupted = self.config.is_cancelled();
            return Vec::new();
        }

        let mut aggregator = DuplicateAggregator::new();
        let stats = coordinator.run(sets, &mut aggregator);

        summary.eliminated_by_fingerprint = stats.eliminated_by_fingerprint;
        summary.fallback_files = stats.fallback_files;
        summary.full_digests = stats.full_digests;
        summary.interrupted = stats.interrupted;
        summary
            .errors
            .extend(stats.errors.into_iter().map(ScanError::from));

        summary.duplicate_groups = aggregator.len();
        summary.duplicate_files = aggregator.duplicate_files();
        summary.reclaimable_space = aggregator.reclaimable_space();
        aggregator.finish()
    }
}

/// Check that `path` is a listable directory and make it absolute.
fn validate_root(path: &Path) -> Result<PathBuf, FinderError> {
    if !path.exists() {
        return Err(FinderError::PathNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(FinderError::NotADirectory(path.to_path_buf()));
    }

    let unreadable = |source| FinderError::RootUnreadable {
        path: path.to_path_buf(),
        source,
    };
    std::fs::read_dir(path).map_err(unreadable)?;
    std::path::absolute(path).map_err(unreadable)
}

fn log_complete(summary: &ScanSummary) {
    log::info!(
        "Scan complete{}: {} duplicate groups, {} duplicate files, {} reclaimable, {} files dropped",
        if summary.interrupted { " (interrupted)" } else { "" },
        summary.duplicate_groups,
        summary.duplicate_files,
        summary.reclaimable_display(),
        summary.errors.len()
    );
}
