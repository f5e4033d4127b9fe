//! Streaming content digests
//!
//! A file is read through a fixed-size block buffer and fed into a streaming
//! hash state, so memory stays bounded no matter how large the file is. The
//! digest is a function of content bytes only - never of the path, times,
//! or permissions.

use crate::error::FileError;
use sha2::Digest as _;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Default read block size: 16 MiB
///
/// Large enough to amortize syscall overhead on big files without holding
/// whole files in memory.
pub const DEFAULT_BLOCK_SIZE: usize = 16 * 1024 * 1024;

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha256,
    Sha512,
    Blake3,
}

impl HashAlgorithm {
    /// All supported algorithms, for CLI help and validation
    pub const ALL: &'static [HashAlgorithm] =
        &[HashAlgorithm::Sha256, HashAlgorithm::Sha512, HashAlgorithm::Blake3];

    /// Canonical lowercase name
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
            HashAlgorithm::Blake3 => "blake3",
        }
    }

    /// Digest length in bytes
    pub fn digest_len(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha512 => 64,
            HashAlgorithm::Blake3 => 32,
        }
    }

    /// Start a fresh streaming hash state
    pub fn hasher(&self) -> BlockHasher {
        let state = match self {
            HashAlgorithm::Sha256 => HasherState::Sha256(sha2::Sha256::new()),
            HashAlgorithm::Sha512 => HasherState::Sha512(sha2::Sha512::new()),
            // blake3::Hasher carries its CV stack inline and dwarfs the sha2 states
            HashAlgorithm::Blake3 => HasherState::Blake3(Box::new(blake3::Hasher::new())),
        };
        BlockHasher { state }
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        HashAlgorithm::Sha512
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha512" => Ok(HashAlgorithm::Sha512),
            "blake3" => Ok(HashAlgorithm::Blake3),
            other => Err(format!("unknown digest algorithm '{other}'")),
        }
    }
}

/// Incremental hash state for one file
pub struct BlockHasher {
    state: HasherState,
}

enum HasherState {
    Sha256(sha2::Sha256),
    Sha512(sha2::Sha512),
    Blake3(Box<blake3::Hasher>),
}

impl BlockHasher {
    /// Feed one block of content
    pub fn update(&mut self, block: &[u8]) {
        match &mut self.state {
            HasherState::Sha256(h) => h.update(block),
            HasherState::Sha512(h) => h.update(block),
            HasherState::Blake3(h) => {
                h.update(block);
            }
        }
    }

    /// Consume the state and produce the digest
    pub fn finalize(self) -> Digest {
        let bytes = match self.state {
            HasherState::Sha256(h) => h.finalize().to_vec(),
            HasherState::Sha512(h) => h.finalize().to_vec(),
            HasherState::Blake3(h) => h.finalize().as_bytes().to_vec(),
        };
        Digest { bytes }
    }
}

/// A computed content digest
///
/// Fixed-length byte sequence; the canonical display form is lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    bytes: Vec<u8>,
}

impl Digest {
    /// Raw digest bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hexadecimal form
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Digest length in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A digest together with the number of content bytes that produced it
#[derive(Debug, Clone)]
pub struct FileDigest {
    pub digest: Digest,
    pub bytes: u64,
}

/// Streams file content through a digest algorithm
///
/// Holds no state between calls; one value can be cloned into any number of
/// workers and used concurrently without synchronization.
#[derive(Debug, Clone)]
pub struct ContentHasher {
    algorithm: HashAlgorithm,
    block_size: usize,
}

impl ContentHasher {
    /// Create a hasher with the default block size
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }

    /// Override the read block size
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash one file, reading block by block until end of file
    ///
    /// The handle is opened and closed inside this call, on success and
    /// failure alike. The regular-file check runs against the already-open
    /// handle, so a path swapped for a directory after enumeration is
    /// reported as [`FileError::NotRegular`] rather than hashed.
    pub fn hash_file(&self, path: &Path) -> Result<FileDigest, FileError> {
        let mut file = File::open(path).map_err(|source| FileError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let meta = file.metadata().map_err(|source| FileError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        if !meta.is_file() {
            return Err(FileError::NotRegular {
                path: path.to_path_buf(),
            });
        }

        let mut hasher = self.algorithm.hasher();
        let mut block = vec![0u8; self.block_size];
        let mut total = 0u64;

        loop {
            let n = file.read(&mut block).map_err(|source| FileError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            if n == 0 {
                break;
            }
            hasher.update(&block[..n]);
            total += n as u64;
        }

        Ok(FileDigest {
            digest: hasher.finalize(),
            bytes: total,
        })
    }
}

/// Hash an in-memory buffer
///
/// # Example
///
/// ```
/// use hash_walker::content::{hash_bytes, HashAlgorithm};
///
/// let digest = hash_bytes(HashAlgorithm::Sha256, b"Hello, World!");
/// assert_eq!(digest.to_hex().len(), 64);
/// ```
pub fn hash_bytes(algorithm: HashAlgorithm, content: &[u8]) -> Digest {
    let mut hasher = algorithm.hasher();
    hasher.update(content);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sha256_known_answer() {
        let digest = hash_bytes(HashAlgorithm::Sha256, b"hello");
        assert_eq!(
            digest.to_hex(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_same_content_same_digest() {
        for &algorithm in HashAlgorithm::ALL {
            let a = hash_bytes(algorithm, b"identical content");
            let b = hash_bytes(algorithm, b"identical content");
            assert_eq!(a, b);
            assert_eq!(a.len(), algorithm.digest_len());
        }
    }

    #[test]
    fn test_different_content_different_digest() {
        for &algorithm in HashAlgorithm::ALL {
            let a = hash_bytes(algorithm, b"Hello, World!");
            let b = hash_bytes(algorithm, b"Hello, World?");
            assert_ne!(a, b);
        }
    }

    #[test]
    fn test_empty_content() {
        let digest = hash_bytes(HashAlgorithm::Sha512, b"");
        assert_eq!(digest.len(), 64);
        assert_eq!(digest.to_hex().len(), 128);
    }

    #[test]
    fn test_file_matches_in_memory_across_blocks() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("blocky.bin");

        // More than one block with a small block size, plus a partial tail
        let content: Vec<u8> = (0..10_000u32).flat_map(|i| i.to_le_bytes()).collect();
        fs::write(&path, &content).unwrap();

        for &algorithm in HashAlgorithm::ALL {
            let hasher = ContentHasher::new(algorithm).with_block_size(4096);
            let hashed = hasher.hash_file(&path).unwrap();
            assert_eq!(hashed.digest, hash_bytes(algorithm, &content));
            assert_eq!(hashed.bytes, content.len() as u64);
        }
    }

    #[test]
    fn test_missing_file_fails_to_open() {
        let dir = tempdir().unwrap();
        let hasher = ContentHasher::new(HashAlgorithm::Sha256);
        let err = hasher.hash_file(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, FileError::Open { .. }));
    }

    #[test]
    fn test_directory_is_not_regular() {
        let dir = tempdir().unwrap();
        let hasher = ContentHasher::new(HashAlgorithm::Sha256);
        match hasher.hash_file(dir.path()) {
            // Linux opens directories read-only; the metadata check catches it
            Err(FileError::NotRegular { .. }) | Err(FileError::Open { .. }) => {}
            other => panic!("expected failure for directory, got {other:?}"),
        }
    }

    #[test]
    fn test_algorithm_parse_round_trip() {
        for &algorithm in HashAlgorithm::ALL {
            assert_eq!(algorithm.name().parse::<HashAlgorithm>().unwrap(), algorithm);
        }
        assert!("md5".parse::<HashAlgorithm>().is_err());
    }
}
