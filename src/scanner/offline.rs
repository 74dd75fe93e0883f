//! Placeholder (offline) entry detection.
//!
//! Cloud-sync clients such as OneDrive or iCloud leave stub entries on disk
//! whose content is only materialized on access. Reading them would trigger a
//! download, so the walker skips them when the filesystem says so.
//!
//! # Platform Support
//!
//! - **Windows**: `FILE_ATTRIBUTE_OFFLINE`, `FILE_ATTRIBUTE_RECALL_ON_OPEN`
//!   and `FILE_ATTRIBUTE_RECALL_ON_DATA_ACCESS` from file metadata
//! - **Other**: no metadata is exposed; every entry is treated as local
//!
//! The capability is best-effort. A probe that cannot tell must answer
//! `false` rather than fail the scan.

use std::fs::Metadata;
use std::path::Path;

/// Decides whether a directory entry is a placeholder that is not
/// materialized locally.
pub trait OfflineProbe: Send + Sync {
    /// Return `true` if `path` is an offline placeholder.
    fn is_offline(&self, path: &Path, metadata: &Metadata) -> bool;

    /// Whether this probe can detect anything on the current platform.
    fn is_supported(&self) -> bool {
        true
    }
}

/// Probe that never reports a placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProbe;

impl OfflineProbe for NoopProbe {
    fn is_offline(&self, _path: &Path, _metadata: &Metadata) -> bool {
        false
    }

    fn is_supported(&self) -> bool {
        false
    }
}

/// Probe backed by the platform's file attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformProbe;

#[cfg(windows)]
mod attrs {
    pub const FILE_ATTRIBUTE_OFFLINE: u32 = 0x0000_1000;
    pub const FILE_ATTRIBUTE_RECALL_ON_OPEN: u32 = 0x0004_0000;
    pub const FILE_ATTRIBUTE_RECALL_ON_DATA_ACCESS: u32 = 0x0040_0000;

    pub const PLACEHOLDER_MASK: u32 =
        FILE_ATTRIBUTE_OFFLINE | FILE_ATTRIBUTE_RECALL_ON_OPEN | FILE_ATTRIBUTE_RECALL_ON_DATA_ACCESS;
}

#[cfg(windows)]
impl OfflineProbe for PlatformProbe {
    fn is_offline(&self, _path: &Path, metadata: &Metadata) -> bool {
        use std::os::windows::fs::MetadataExt;
        metadata.file_attributes() & attrs::PLACEHOLDER_MASK != 0
    }
}

#[cfg(not(windows))]
impl OfflineProbe for PlatformProbe {
    fn is_offline(&self, path: &Path, metadata: &Metadata) -> bool {
        NoopProbe.is_offline(path, metadata)
    }

    fn is_supported(&self) -> bool {
        false
    }
}
