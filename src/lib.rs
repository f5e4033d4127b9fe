//! hash-walker - Parallel content hashing for directory trees
//!
//! Walks a directory tree and computes a cryptographic digest per regular
//! file, either across a fixed pool of worker threads or sequentially as a
//! baseline, aggregating results into a single report.
//!
//! # Features
//!
//! - **Streaming digests**: files are read in fixed-size blocks through a
//!   streaming hash state (SHA-256, SHA-512, or BLAKE3), so memory stays
//!   bounded no matter the file size.
//!
//! - **Bounded fan-out**: a bounded task queue feeds the worker pool and an
//!   unordered result channel feeds the aggregator, applying backpressure
//!   instead of buffering the whole tree.
//!
//! - **Partial-failure semantics**: unreadable files are recorded in the
//!   report next to successes; a single bad file never aborts the run.
//!
//! - **Cancellation**: a shared shutdown flag stops workers from claiming
//!   new work; everything already hashed is kept and the report is marked
//!   partial.
//!
//! # Architecture
//!
//! ```text
//! FileEnumerator ──► task queue ──► Worker 1..W ──► result channel ──► ResultAggregator
//!   (producer)       (bounded)     (ContentHasher)    (unordered)         (HashReport)
//! ```
//!
//! The sequential baseline collapses the middle of the pipeline onto one
//! thread; its output mapping is identical to the parallel path's for the
//! same root and algorithm.
//!
//! # Example
//!
//! ```no_run
//! use hash_walker::{HashConfig, HashCoordinator};
//!
//! let config = HashConfig::new("/data");
//! let report = HashCoordinator::new(config).run()?;
//!
//! for (path, digest) in report.digests() {
//!     println!("{digest}  {}", path.display());
//! }
//! # Ok::<(), hash_walker::HashWalkerError>(())
//! ```

pub mod config;
pub mod content;
pub mod error;
pub mod progress;
pub mod report;
pub mod runner;
pub mod walk;

pub use config::{CliArgs, HashConfig};
pub use content::{ContentHasher, Digest, HashAlgorithm};
pub use error::{FileError, HashWalkerError, Result};
pub use report::{HashReport, HashResult, ResultAggregator};
pub use runner::{HashCoordinator, RunProgress, RunStats, SequentialRunner};
pub use walk::FileEnumerator;
