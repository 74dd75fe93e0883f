//! Size/extension bucketing and duplicate group types.
//!
//! # Overview
//!
//! Bucketing is the first filter of duplicate detection. Candidates are
//! grouped by `(size, extension)`; files that differ in either can never be
//! reported together, so singleton buckets are dropped without any I/O.
//!
//! Buckets keep their members in walk order. Later stages refer to a member
//! by its position inside the bucket, which is also the order members are
//! listed in a [`DuplicateGroup`].
//!
//! # Example
//!
//! ```
//! use dupesweep::scanner::FileCandidate;
//! use dupesweep::duplicates::bucket_candidates;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileCandidate::new(PathBuf::from("/a.txt"), 1024),
//!     FileCandidate::new(PathBuf::from("/b.txt"), 1024),
//!     FileCandidate::new(PathBuf::from("/b.log"), 1024),
//!     FileCandidate::new(PathBuf::from("/c.txt"), 2048),
//! ];
//!
//! let (sets, stats) = bucket_candidates(files);
//!
//! assert_eq!(stats.total_files, 4);
//! assert_eq!(stats.potential_duplicates, 2);  // the two 1024-byte .txt files
//! assert_eq!(sets.len(), 1);
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Serialize, Serializer};

use crate::scanner::{ContentDigest, FileCandidate, Fingerprint};

/// Key shared by every member of a [`Bucket`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey {
    /// File size in bytes
    pub size: u64,
    /// Lower-cased extension with leading dot, or empty
    pub extension: String,
}

impl BucketKey {
    /// Create a new bucket key.
    #[must_use]
    pub fn new(size: u64, extension: impl Into<String>) -> Self {
        Self {
            size,
            extension: extension.into(),
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.extension.is_empty() {
            write!(f, "{} bytes, no extension", self.size)
        } else {
            write!(f, "{} bytes, {}", self.size, self.extension)
        }
    }
}

/// Candidates sharing identical size and extension, in walk order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    /// Bucket key
    pub key: BucketKey,
    /// Member paths in discovery order
    pub paths: Vec<PathBuf>,
}

impl Bucket {
    /// Create an empty bucket.
    #[must_use]
    pub fn new(key: BucketKey) -> Self {
        Self {
            key,
            paths: Vec::new(),
        }
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if this bucket is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Whether this bucket can contain duplicates (2+ members).
    #[must_use]
    pub fn is_potential_set(&self) -> bool {
        self.paths.len() > 1
    }

    /// Members paired with their walk-order position.
    pub fn members(&self) -> impl Iterator<Item = BucketMember> + '_ {
        self.paths
            .iter()
            .enumerate()
            .map(|(position, path)| BucketMember::new(position, path.clone()))
    }
}

/// One member of a bucket, tagged with its position in walk order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketMember {
    /// Position inside the bucket
    pub position: usize,
    /// File path
    pub path: PathBuf,
}

impl BucketMember {
    /// Create a new member.
    #[must_use]
    pub fn new(position: usize, path: PathBuf) -> Self {
        Self { position, path }
    }
}

/// Members of one bucket that produced the same partial-stage fingerprint.
///
/// Exists only while a bucket is being resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialFingerprint {
    /// Bucket the members came from
    pub key: BucketKey,
    /// Shared fingerprint
    pub fingerprint: Fingerprint,
    /// Members in walk order
    pub members: Vec<BucketMember>,
}

impl PartialFingerprint {
    /// Whether the members need full-content verification.
    #[must_use]
    pub fn needs_verification(&self) -> bool {
        self.members.len() > 1 && !self.fingerprint.is_full()
    }
}

/// Split the fingerprinted members of a bucket by fingerprint value.
///
/// Groups are keyed strictly by fingerprint; no two groups are ever merged.
/// Members are returned in walk order and groups are ordered by their first
/// member.
#[must_use]
pub fn partition_by_fingerprint(
    key: &BucketKey,
    mut fingerprinted: Vec<(BucketMember, Fingerprint)>,
) -> Vec<PartialFingerprint> {
    let mut index: HashMap<Fingerprint, usize> = HashMap::new();
    let mut groups: Vec<PartialFingerprint> = Vec::new();

    fingerprinted.sort_by_key(|(member, _)| member.position);

    for (member, fingerprint) in fingerprinted {
        match index.get(&fingerprint) {
            Some(&i) => groups[i].members.push(member),
            None => {
                index.insert(fingerprint, groups.len());
                groups.push(PartialFingerprint {
                    key: key.clone(),
                    fingerprint,
                    members: vec![member],
                });
            }
        }
    }

    groups
}

/// Group fully digested members of one bucket by content digest.
///
/// Only digests shared by 2+ members produce a group.
#[must_use]
pub fn group_by_digest(size: u64, digested: Vec<(BucketMember, ContentDigest)>) -> Vec<DuplicateGroup> {
    let mut by_digest: HashMap<ContentDigest, Vec<BucketMember>> = HashMap::new();
    for (member, digest) in digested {
        by_digest.entry(digest).or_default().push(member);
    }

    let mut groups: Vec<(usize, DuplicateGroup)> = by_digest
        .into_iter()
        .filter(|(_, members)| members.len() > 1)
        .map(|(digest, mut members)| {
            members.sort_by_key(|m| m.position);
            let first = members[0].position;
            let files = members.into_iter().map(|m| m.path).collect();
            (first, DuplicateGroup::new(digest, size, files))
        })
        .collect();

    groups.sort_by_key(|(first, _)| *first);
    groups.into_iter().map(|(_, group)| group).collect()
}

/// Confirmed group of byte-identical files.
///
/// Serializes as `{"hash": "<sha256 hex>", "size": <bytes>, "files": [...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// SHA-256 digest of the shared content
    pub hash: ContentDigest,
    /// File size in bytes (shared by all members)
    pub size: u64,
    /// Member paths, at least two
    #[serde(serialize_with = "serialize_paths_lossy")]
    pub files: Vec<PathBuf>,
}

/// Paths that are not valid UTF-8 are rendered with replacement characters.
fn serialize_paths_lossy<S: Serializer>(paths: &[PathBuf], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(paths.iter().map(|p| p.to_string_lossy()))
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    ///
    /// # Panics
    ///
    /// Debug assertion fails if fewer than two files are given.
    #[must_use]
    pub fn new(hash: ContentDigest, size: u64, files: Vec<PathBuf>) -> Self {
        debug_assert!(files.len() >= 2, "duplicate group needs 2+ files");
        Self { hash, size, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size * self.files.len() as u64
    }

    /// Total wasted space (all copies minus one).
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Hash as hexadecimal string.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        self.hash.to_hex()
    }
}

/// Statistics from the bucketing stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of candidates bucketed
    pub total_files: usize,
    /// Total size of all candidates in bytes
    pub total_size: u64,
    /// Number of distinct (size, extension) keys
    pub buckets: usize,
    /// Candidates in buckets with 2+ members
    pub potential_duplicates: usize,
    /// Buckets with 2+ members
    pub potential_sets: usize,
    /// Candidates dropped as the only member of their bucket
    pub eliminated_unique: usize,
    /// Zero-byte candidates seen
    pub empty_files: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by bucketing.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Accumulates candidates into (size, extension) buckets.
///
/// Owned by one scan session.
#[derive(Debug, Default)]
pub struct SizeBucketer {
    index: HashMap<BucketKey, usize>,
    buckets: Vec<Bucket>,
    stats: GroupingStats,
}

impl SizeBucketer {
    /// Create an empty bucketer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one candidate. The candidate is consumed; only its path is kept.
    pub fn insert(&mut self, candidate: FileCandidate) {
        self.stats.total_files += 1;
        self.stats.total_size += candidate.size;
        if candidate.size == 0 {
            self.stats.empty_files += 1;
        }

        let key = BucketKey::new(candidate.size, candidate.extension);
        let slot = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                let i = self.buckets.len();
                self.index.insert(key.clone(), i);
                self.buckets.push(Bucket::new(key));
                i
            }
        };
        self.buckets[slot].paths.push(candidate.path);
    }

    /// Number of candidates inserted so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stats.total_files
    }

    /// Check if nothing was inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stats.total_files == 0
    }

    /// Finish bucketing and keep only potential duplicate sets.
    ///
    /// Sets are returned in the order their key was first seen.
    #[must_use]
    pub fn into_potential_sets(self) -> (Vec<Bucket>, GroupingStats) {
        let mut stats = self.stats;
        stats.buckets = self.buckets.len();

        let sets: Vec<Bucket> = self
            .buckets
            .into_iter()
            .filter(|bucket| {
                if bucket.is_potential_set() {
                    stats.potential_duplicates += bucket.len();
                    stats.potential_sets += 1;
                    log::debug!("Bucket [{}]: {} potential duplicates", bucket.key, bucket.len());
                    true
                } else {
                    stats.eliminated_unique += bucket.len();
                    if let Some(path) = bucket.paths.first() {
                        log::trace!("Eliminated unique bucket [{}]: {}", bucket.key, path.display());
                    }
                    false
                }
            })
            .collect();

        log::info!(
            "Bucketing complete: {} files → {} potential duplicates in {} sets ({:.1}% eliminated)",
            stats.total_files,
            stats.potential_duplicates,
            stats.potential_sets,
            stats.elimination_rate()
        );

        (sets, stats)
    }
}

/// Bucket a candidate sequence in one call.
#[must_use]
pub fn bucket_candidates(
    candidates: impl IntoIterator<Item = FileCandidate>,
) -> (Vec<Bucket>, GroupingStats) {
    let mut bucketer = SizeBucketer::new();
    for candidate in candidates {
        bucketer.insert(candidate);
    }
    bucketer.into_potential_sets()
}
