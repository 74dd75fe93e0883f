//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size/extension bucketing ([`groups`])
//! - Bounded two-stage hashing ([`coordinator`])
//! - Verified group collection ([`aggregator`])
//! - Scan-session orchestration ([`finder`])

pub mod aggregator;
pub mod coordinator;
pub mod finder;
pub mod groups;

pub use aggregator::DuplicateAggregator;
pub use coordinator::{Coordinator, HashingStats};
pub use finder::{DuplicateFinder, FinderConfig, FinderError, ScanSummary};
pub use groups::{
    bucket_candidates, group_by_digest, partition_by_fingerprint, Bucket, BucketKey, BucketMember,
    DuplicateGroup, GroupingStats, PartialFingerprint, SizeBucketer,
};
