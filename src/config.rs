//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`config.toml` in the platform config directory, or `--config`)
//! 3. Environment variables prefixed with `DUPESWEEP_` (e.g. `DUPESWEEP_IO_THREADS=8`)
//! 4. Command-line flags
//!
//! An unreadable or invalid file is reported and the defaults are used.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::ScanArgs;
use crate::duplicates::FinderConfig;
use crate::scanner::{HasherConfig, WalkerConfig, FULL_CHUNK_SIZE, PARTIAL_CHUNK_SIZE};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "DUPESWEEP_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Hashing threads (0 = available parallelism).
    pub io_threads: usize,
    /// Head and tail chunk size for fingerprints, in bytes.
    pub partial_chunk_size: usize,
    /// Read size for full digests, in bytes.
    pub full_chunk_size: usize,
    /// Notify progress every this many files.
    pub progress_interval: usize,
    /// Extensions (without dot) that are never candidates.
    pub skip_extensions: Vec<String>,
    /// Gitignore-style patterns to skip.
    pub ignore_patterns: Vec<String>,
    /// Also honor a `.gitignore` at the scan root.
    pub respect_gitignore: bool,
    /// Skip hidden files and directories.
    pub skip_hidden: bool,
    /// Skip offline cloud placeholders where the platform reports them.
    pub detect_offline: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            io_threads: 0,
            partial_chunk_size: PARTIAL_CHUNK_SIZE,
            full_chunk_size: FULL_CHUNK_SIZE,
            progress_interval: 100,
            skip_extensions: vec!["exe".to_string()],
            ignore_patterns: Vec::new(),
            respect_gitignore: false,
            skip_hidden: false,
            detect_offline: true,
        }
    }
}

impl Config {
    /// Load from the default platform-specific path plus environment.
    #[must_use]
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from_path(path),
            None => {
                log::debug!("No platform config directory, using defaults and environment");
                Self::extract_or_default(Self::figment(None))
            }
        }
    }

    /// Load from `path` plus environment. A missing file is not an error.
    #[must_use]
    pub fn load_from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.exists() {
            log::debug!("Loading configuration from {}", path.display());
        }
        Self::extract_or_default(Self::figment(Some(path)))
    }

    /// Figment with defaults, an optional TOML file and the environment.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    fn extract_or_default(figment: Figment) -> Self {
        match figment.extract::<Self>() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Invalid configuration, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Default platform-specific configuration path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupesweep").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply scan flags on top of the loaded layers.
    pub fn merge_scan_args(&mut self, args: &ScanArgs) {
        if let Some(threads) = args.io_threads {
            self.io_threads = threads;
        }
        if let Some(size) = args.partial_chunk {
            self.partial_chunk_size = usize::try_from(size).unwrap_or(usize::MAX);
        }
        if let Some(size) = args.full_chunk {
            self.full_chunk_size = usize::try_from(size).unwrap_or(usize::MAX);
        }
        if !args.skip_extensions.is_empty() {
            self.skip_extensions = args.skip_extensions.clone();
        }
        self.ignore_patterns
            .extend(args.ignore_patterns.iter().cloned());
        if args.respect_gitignore {
            self.respect_gitignore = true;
        }
        if args.skip_hidden {
            self.skip_hidden = true;
        }
        if args.no_offline_check {
            self.detect_offline = false;
        }
    }

    /// Walker settings derived from this configuration.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::default()
            .with_skip_hidden(self.skip_hidden)
            .with_skip_extensions(self.skip_extensions.clone())
            .with_ignore_patterns(self.ignore_patterns.clone())
            .with_respect_gitignore(self.respect_gitignore)
            .with_detect_offline(self.detect_offline)
    }

    /// Hasher settings derived from this configuration.
    #[must_use]
    pub fn hasher_config(&self) -> HasherConfig {
        HasherConfig::default()
            .with_partial_chunk_size(self.partial_chunk_size)
            .with_full_chunk_size(self.full_chunk_size)
    }

    /// Engine configuration; callers add the cancel token and progress sink.
    #[must_use]
    pub fn to_finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_io_threads(self.io_threads)
            .with_walker_config(self.walker_config())
            .with_hasher_config(self.hasher_config())
            .with_progress_interval(self.progress_interval)
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
