//! Streaming file hasher.
//!
//! # Overview
//!
//! [`Hasher`] computes a content [`Digest`] by reading files in bounded
//! chunks, so peak memory does not depend on file size. One hasher is built
//! per run and the algorithm cannot change afterwards; every digest records
//! the algorithm that produced it.
//!
//! # Example
//!
//! ```no_run
//! use treedupe::scanner::{HashAlgorithm, Hasher};
//! use std::path::Path;
//!
//! let hasher = Hasher::new().with_algorithm(HashAlgorithm::Sha256);
//! let digest = hasher.hash_file(Path::new("photo.jpg")).unwrap();
//! println!("{} {}", digest.algorithm(), digest.to_hex());
//! ```

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sha2::Digest as _;

use super::{FileRecord, HashError};

/// Read buffer size used when streaming file content.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Supported content hash algorithms.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// BLAKE3 (32-byte digest)
    #[default]
    Blake3,
    /// SHA-256 (32-byte digest)
    Sha256,
    /// SHA-1 (20-byte digest)
    Sha1,
    /// MD5 (16-byte digest)
    Md5,
}

impl HashAlgorithm {
    /// Digest length in bytes.
    #[must_use]
    pub fn digest_len(self) -> usize {
        match self {
            Self::Blake3 | Self::Sha256 => 32,
            Self::Sha1 => 20,
            Self::Md5 => 16,
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blake3 => write!(f, "blake3"),
            Self::Sha256 => write!(f, "sha256"),
            Self::Sha1 => write!(f, "sha1"),
            Self::Md5 => write!(f, "md5"),
        }
    }
}

/// Content digest tagged with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest {
    algorithm: HashAlgorithm,
    bytes: Vec<u8>,
}

impl Digest {
    /// Wrap raw digest bytes.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm, bytes: Vec<u8>) -> Self {
        Self { algorithm, bytes }
    }

    /// Algorithm that produced this digest.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hexadecimal representation.
    #[must_use]
    pub fn to_hex(&self) -> String {
        digest_to_hex(&self.bytes)
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

/// Convert digest bytes to a lowercase hex string.
#[must_use]
pub fn digest_to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

/// Incremental hashing state for one file.
enum HashState {
    Blake3(Box<blake3::Hasher>),
    Sha256(sha2::Sha256),
    Sha1(sha1::Sha1),
    Md5(md5::Md5),
}

impl HashState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
            HashAlgorithm::Sha256 => Self::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Sha1 => Self::Sha1(sha1::Sha1::new()),
            HashAlgorithm::Md5 => Self::Md5(md5::Md5::new()),
        }
    }

    fn update(&mut self, chunk: &[u8]) {
        match self {
            Self::Blake3(h) => {
                h.update(chunk);
            }
            Self::Sha256(h) => h.update(chunk),
            Self::Sha1(h) => h.update(chunk),
            Self::Md5(h) => h.update(chunk),
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            Self::Blake3(h) => h.finalize().as_bytes().to_vec(),
            Self::Sha256(h) => h.finalize().to_vec(),
            Self::Sha1(h) => h.finalize().to_vec(),
            Self::Md5(h) => h.finalize().to_vec(),
        }
    }
}

/// Chunked content hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    chunk_size: usize,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a BLAKE3 hasher with the default chunk size.
    #[must_use]
    pub fn new() -> Self {
        Self {
            algorithm: HashAlgorithm::default(),
            chunk_size: CHUNK_SIZE,
            shutdown_flag: None,
        }
    }

    /// Select the hash algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Override the read chunk size. Zero is clamped to one byte.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the shutdown flag checked between chunks.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Algorithm used by this hasher.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Hash the full content of a file.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the file vanished
    /// - `PermissionDenied` if it cannot be read
    /// - `Interrupted` if shutdown was requested mid-read
    /// - `Io` for any other read failure
    pub fn hash_file(&self, path: &Path) -> Result<Digest, HashError> {
        let file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        self.hash_reader(file, path)
    }

    /// Hash everything readable from `reader`.
    ///
    /// `path` is only used to label errors.
    ///
    /// # Errors
    ///
    /// Same as [`hash_file`](Self::hash_file).
    pub fn hash_reader<R: Read>(&self, reader: R, path: &Path) -> Result<Digest, HashError> {
        self.stream(reader, path).map(|(digest, _)| digest)
    }

    /// Hash a discovered file, checking it still has the size seen by the walk.
    ///
    /// A digest is only meaningful alongside the size it was grouped under,
    /// so a file that grew or shrank since discovery is reported instead of
    /// hashed.
    ///
    /// # Errors
    ///
    /// `SizeChanged` when the byte count read differs from `record.size`,
    /// otherwise the same as [`hash_file`](Self::hash_file).
    pub fn hash_record(&self, record: &FileRecord) -> Result<Digest, HashError> {
        let file = File::open(&record.path).map_err(|e| HashError::from_io(&record.path, e))?;
        let (digest, read) = self.stream(file, &record.path)?;
        if read != record.size {
            return Err(HashError::SizeChanged {
                path: record.path.clone(),
                expected: record.size,
                actual: read,
            });
        }
        Ok(digest)
    }

    fn stream<R: Read>(&self, mut reader: R, path: &Path) -> Result<(Digest, u64), HashError> {
        let mut state = HashState::new(self.algorithm);
        let mut buffer = vec![0u8; self.chunk_size];
        let mut total_bytes: u64 = 0;

        loop {
            if self.is_shutdown_requested() {
                return Err(HashError::Interrupted(path.to_path_buf()));
            }

            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };

            state.update(&buffer[..bytes_read]);
            total_bytes += bytes_read as u64;
        }

        let digest = Digest::new(self.algorithm, state.finalize());
        log::trace!(
            "Hashed {} ({} bytes): {}",
            path.display(),
            total_bytes,
            digest
        );
        Ok((digest, total_bytes))
    }
}
