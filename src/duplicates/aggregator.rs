//! Final collection point for verified duplicate groups.
//!
//! The coordinator owns the aggregator and is its only writer; hashing
//! workers never touch it. Groups are kept in the order they were accepted,
//! which depends on walk order and on scheduling, so callers must not rely on
//! the order of groups across buckets.

use super::groups::DuplicateGroup;

/// Append-only collection of confirmed [`DuplicateGroup`] values.
#[derive(Debug, Default)]
pub struct DuplicateAggregator {
    groups: Vec<DuplicateGroup>,
    duplicate_files: usize,
    reclaimable_space: u64,
}

impl DuplicateAggregator {
    /// Create an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept one verified group.
    ///
    /// Groups with fewer than two members are rejected and logged; they can
    /// only come from a caller bug.
    pub fn accept(&mut self, group: DuplicateGroup) {
        if group.len() < 2 {
            log::warn!(
                "Rejecting duplicate group {} with {} member(s)",
                group.hash,
                group.len()
            );
            return;
        }

        log::debug!(
            "Duplicate group {}: {} files of {} bytes",
            group.hash,
            group.len(),
            group.size
        );
        self.duplicate_files += group.duplicate_count();
        self.reclaimable_space += group.wasted_space();
        self.groups.push(group);
    }

    /// Accept every group produced by one bucket resolution.
    pub fn extend(&mut self, groups: impl IntoIterator<Item = DuplicateGroup>) {
        for group in groups {
            self.accept(group);
        }
    }

    /// Number of groups accepted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if no group was accepted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Duplicate copies across all groups (members minus one per group).
    #[must_use]
    pub fn duplicate_files(&self) -> usize {
        self.duplicate_files
    }

    /// Bytes reclaimable by keeping one copy per group.
    #[must_use]
    pub fn reclaimable_space(&self) -> u64 {
        self.reclaimable_space
    }

    /// Consume the aggregator and return the final group list.
    #[must_use]
    pub fn finish(self) -> Vec<DuplicateGroup> {
        self.groups
    }
}
