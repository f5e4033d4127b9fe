//! Content digest module
//!
//! This module provides:
//! - Streaming digest computation over file content, block by block
//! - Algorithm selection as an explicit value (no process-wide default)

pub mod digest;

pub use digest::{hash_bytes, ContentHasher, Digest, FileDigest, HashAlgorithm, DEFAULT_BLOCK_SIZE};
