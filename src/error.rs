//! Error types for hash-walker
//!
//! This module defines the error hierarchy that covers:
//! - Root validation errors (fatal, surfaced before any work starts)
//! - Per-file hashing errors (recoverable, recorded in the report)
//! - Configuration and CLI errors
//! - Worker thread errors
//! - Internal consistency violations detected during aggregation
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Errors should be actionable - include the path and underlying cause
//! - Per-file failures flow through the result stream, never through `?`

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Top-level error type for the hash-walker application
#[derive(Error, Debug)]
pub enum HashWalkerError {
    /// Root path missing or not a directory; nothing is hashed
    #[error("invalid root '{path}': {kind}")]
    InvalidRoot { path: PathBuf, kind: RootErrorKind },

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("worker error: {0}")]
    Worker(#[from] WorkerError),

    /// Consistency violation detected during aggregation; indicates a bug
    /// in an executor, never recovered
    #[error("internal consistency error: {0}")]
    Internal(#[from] InternalError),

    /// I/O errors outside of per-file hashing
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Why a root path was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootErrorKind {
    /// Path does not exist (or could not be stat'd at all)
    Missing,

    /// Path exists but is not a directory
    NotADirectory,
}

impl fmt::Display for RootErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RootErrorKind::Missing => write!(f, "path does not exist"),
            RootErrorKind::NotADirectory => write!(f, "not a directory"),
        }
    }
}

/// Per-file hashing failures
///
/// Recoverable at the run level: the failure is recorded in the report
/// against its path and sibling tasks keep running.
#[derive(Error, Debug)]
pub enum FileError {
    /// The file could not be opened (permission, removed after enumeration)
    #[error("failed to open '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file could not be read to the end (truncation, device error)
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The path no longer refers to a regular file at hashing time
    #[error("not a regular file: '{path}'")]
    NotRegular { path: PathBuf },
}

impl FileError {
    /// The path this failure is about
    pub fn path(&self) -> &Path {
        match self {
            FileError::Open { path, .. } => path,
            FileError::Read { path, .. } => path,
            FileError::NotRegular { path } => path,
        }
    }
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid worker count
    #[error("invalid worker count {count}: must be between 1 and {max}")]
    InvalidWorkerCount { count: usize, max: usize },

    /// Invalid queue capacity
    #[error("invalid queue capacity {size}: must be at least {min}")]
    InvalidQueueCapacity { size: usize, min: usize },

    /// Invalid read block size
    #[error("invalid block size {size}: must be between {min} and {max} bytes")]
    InvalidBlockSize { size: usize, min: usize, max: usize },

    /// Unknown digest algorithm name
    #[error("unknown digest algorithm '{name}'")]
    UnknownAlgorithm { name: String },

    /// Invalid exclude pattern
    #[error("invalid exclude pattern '{pattern}': {reason}")]
    InvalidExcludePattern { pattern: String, reason: String },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Thread spawn failed
    #[error("failed to spawn thread '{name}': {reason}")]
    SpawnFailed { name: String, reason: String },

    /// Worker panicked
    #[error("worker {id} panicked: {message}")]
    Panicked { id: usize, message: String },

    /// Enumeration thread panicked
    #[error("enumeration thread panicked")]
    EnumerationPanicked,
}

/// Consistency violations detected by the aggregator
///
/// Always fatal: a duplicate or missing result means an executor broke its
/// exactly-once guarantee, and the report cannot be trusted.
#[derive(Error, Debug)]
pub enum InternalError {
    /// Two results arrived for the same path
    #[error("duplicate result for '{path}'")]
    DuplicateResult { path: PathBuf },

    /// A completed run produced fewer results than it enumerated paths
    #[error("missing results: enumerated {expected} paths but received {received} results")]
    MissingResults { expected: u64, received: u64 },
}

/// Result type alias for HashWalkerError
pub type Result<T> = std::result::Result<T, HashWalkerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_error_path() {
        let err = FileError::Open {
            path: PathBuf::from("/data/a.txt"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.path(), Path::new("/data/a.txt"));

        let err = FileError::NotRegular {
            path: PathBuf::from("/data/pipe"),
        };
        assert_eq!(err.path(), Path::new("/data/pipe"));
    }

    #[test]
    fn test_error_conversion() {
        let internal = InternalError::DuplicateResult {
            path: PathBuf::from("/data/a.txt"),
        };
        let top: HashWalkerError = internal.into();
        assert!(matches!(top, HashWalkerError::Internal(_)));

        let config = ConfigError::InvalidWorkerCount { count: 0, max: 512 };
        let top: HashWalkerError = config.into();
        assert!(matches!(top, HashWalkerError::Config(_)));
    }

    #[test]
    fn test_invalid_root_display() {
        let err = HashWalkerError::InvalidRoot {
            path: PathBuf::from("/missing"),
            kind: RootErrorKind::Missing,
        };
        let text = err.to_string();
        assert!(text.contains("/missing"));
        assert!(text.contains("does not exist"));
    }
}
