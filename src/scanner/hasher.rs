//! Partial fingerprints and full-content digests.
//!
//! # Overview
//!
//! - [`Hasher::fingerprint`] reads a fixed-size head and the equal-size tail
//!   of a file and hashes both with BLAKE3. It is a pre-filter only.
//! - [`Hasher::full_digest`] streams the whole file through SHA-256 in
//!   fixed-size chunks. It is the authoritative identity of a file's content.
//!
//! Files shorter than twice the partial chunk (head and tail would overlap),
//! and files whose tail seek fails, get a full digest in place of a
//! fingerprint. That keeps the optimization free of false negatives.
//!
//! Reads check the cancellation token between chunks, so a huge file stops
//! promptly once a scan is aborted.

use std::fmt;
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

use super::HashError;
use crate::signal::CancelToken;

/// Default number of bytes read from each end of a file for the fingerprint.
pub const PARTIAL_CHUNK_SIZE: usize = 4096;

/// Default read size when streaming a full digest.
pub const FULL_CHUNK_SIZE: usize = 8192;

/// Largest accepted chunk size (64 MiB). Larger requests are clamped.
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// SHA-256 digest of an entire file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentDigest(pub [u8; 32]);

impl ContentDigest {
    /// Lower-case hexadecimal representation (64 characters).
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Digest of an in-memory buffer.
    #[must_use]
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self::from_sha256(Sha256::digest(bytes).as_slice())
    }

    fn from_sha256(bytes: &[u8]) -> Self {
        let mut out = [0u8; 32];
        out.copy_from_slice(bytes);
        Self(out)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.to_hex())
    }
}

impl Serialize for ContentDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Result of the partial-hash stage for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fingerprint {
    /// BLAKE3 over head + tail. Equal values only suggest equal content.
    Partial([u8; 32]),
    /// The file took the fallback path; this is already its full digest.
    Full(ContentDigest),
}

impl Fingerprint {
    /// Whether this fingerprint is already authoritative.
    #[must_use]
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }
}

/// Chunk sizes used by the [`Hasher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HasherConfig {
    /// Bytes read from the head and from the tail for a fingerprint.
    pub partial_chunk_size: usize,
    /// Read size for full digests.
    pub full_chunk_size: usize,
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self {
            partial_chunk_size: PARTIAL_CHUNK_SIZE,
            full_chunk_size: FULL_CHUNK_SIZE,
        }
    }
}

impl HasherConfig {
    /// Set the partial chunk size, clamped to `1..=MAX_CHUNK_SIZE`.
    #[must_use]
    pub fn with_partial_chunk_size(mut self, size: usize) -> Self {
        self.partial_chunk_size = clamp_chunk("partial", size);
        self
    }

    /// Set the full-digest read size, clamped to `1..=MAX_CHUNK_SIZE`.
    #[must_use]
    pub fn with_full_chunk_size(mut self, size: usize) -> Self {
        self.full_chunk_size = clamp_chunk("full", size);
        self
    }

    /// Smallest file size that gets a head+tail fingerprint.
    #[must_use]
    pub fn partial_threshold(&self) -> u64 {
        (self.partial_chunk_size as u64).saturating_mul(2)
    }
}

fn clamp_chunk(kind: &str, size: usize) -> usize {
    if size > MAX_CHUNK_SIZE {
        log::warn!(
            "{} chunk size {} exceeds the maximum, using {}",
            kind,
            size,
            MAX_CHUNK_SIZE
        );
    }
    size.clamp(1, MAX_CHUNK_SIZE)
}

/// Read buffer length for a file of `size` bytes.
fn buffer_len(chunk: usize, size: u64) -> usize {
    let chunk = chunk.clamp(1, MAX_CHUNK_SIZE);
    usize::try_from(size).map_or(chunk, |size| chunk.min(size.max(1)))
}

/// Computes fingerprints and digests. Shared by all pool workers.
#[derive(Debug, Clone, Default)]
pub struct Hasher {
    config: HasherConfig,
    cancel: Option<CancelToken>,
}

impl Hasher {
    /// Create a hasher with default chunk sizes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hasher with explicit chunk sizes.
    #[must_use]
    pub fn with_config(config: HasherConfig) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Observe `token` between chunked reads.
    #[must_use]
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Chunk sizes in use.
    #[must_use]
    pub fn config(&self) -> HasherConfig {
        self.config
    }

    fn check_cancelled(&self, path: &Path) -> Result<(), HashError> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(HashError::Cancelled(path.to_path_buf()));
        }
        Ok(())
    }

    /// Compute the partial-hash stage result for a file of `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read, or if the
    /// scan was cancelled.
    pub fn fingerprint(&self, path: &Path, size: u64) -> Result<Fingerprint, HashError> {
        if size < self.config.partial_threshold() {
            log::trace!(
                "File below fingerprint threshold ({} bytes), digesting fully: {}",
                size,
                path.display()
            );
            return self.full_digest(path).map(Fingerprint::Full);
        }

        self.check_cancelled(path)?;
        let chunk = buffer_len(self.config.partial_chunk_size, size);
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let mut buffer = vec![0u8; chunk];
        let mut hasher = blake3::Hasher::new();

        file.read_exact(&mut buffer)
            .map_err(|e| HashError::from_io(path, e))?;
        hasher.update(&buffer);

        self.check_cancelled(path)?;
        let tail_offset = -i64::try_from(chunk).unwrap_or(i64::MAX);
        if let Err(e) = file.seek(SeekFrom::End(tail_offset)) {
            log::debug!(
                "Tail seek failed for {} ({}), digesting fully",
                path.display(),
                e
            );
            drop(file);
            return self.full_digest(path).map(Fingerprint::Full);
        }

        file.read_exact(&mut buffer)
            .map_err(|e| HashError::from_io(path, e))?;
        hasher.update(&buffer);

        Ok(Fingerprint::Partial(*hasher.finalize().as_bytes()))
    }

    /// Stream the whole file through SHA-256.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened, a read fails
    /// mid-stream, or the scan was cancelled.
    pub fn full_digest(&self, path: &Path) -> Result<ContentDigest, HashError> {
        self.check_cancelled(path)?;
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let size = file
            .metadata()
            .map_err(|e| HashError::from_io(path, e))?
            .len();
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; buffer_len(self.config.full_chunk_size, size)];

        loop {
            self.check_cancelled(path)?;
            let read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };
            hasher.update(&buffer[..read]);
        }

        Ok(ContentDigest::from_sha256(hasher.finalize().as_slice()))
    }
}
