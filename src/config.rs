//! Configuration types for hash-walker
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation
//! - Digest algorithm selection

use crate::content::{HashAlgorithm, DEFAULT_BLOCK_SIZE};
use crate::error::ConfigError;
use clap::Parser;
use regex::Regex;
use std::path::PathBuf;

/// Maximum reasonable worker count
const MAX_WORKERS: usize = 512;

/// Minimum task queue capacity
const MIN_QUEUE_CAPACITY: usize = 16;

/// Default task queue capacity
const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Read block size limits
const MIN_BLOCK_SIZE: usize = 4 * 1024;
const MAX_BLOCK_SIZE: usize = 256 * 1024 * 1024;

/// Parallel content hashing for directory trees
#[derive(Parser, Debug, Clone)]
#[command(
    name = "hash-walker",
    version,
    about = "Parallel content hashing for directory trees",
    long_about = "Walks a directory tree and computes a cryptographic digest per regular file,\n\
                  across a fixed pool of worker threads or sequentially as a baseline.\n\n\
                  Unreadable files are reported alongside successes; they never abort the run.",
    after_help = "EXAMPLES:\n    \
        hash-walker /data\n    \
        hash-walker /data -w 8 -a blake3 --list\n    \
        hash-walker /data --sequential --exclude '\\.git'\n    \
        hash-walker /data --json -q > report.json"
)]
pub struct CliArgs {
    /// Root directory to hash
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Number of worker threads
    #[arg(short = 'w', long, default_value_t = default_workers(), value_name = "NUM")]
    pub workers: usize,

    /// Digest algorithm (sha256, sha512, blake3)
    #[arg(short = 'a', long, default_value = "sha512", value_name = "ALGO")]
    pub algorithm: String,

    /// Read block size in MiB
    #[arg(long, default_value = "16", value_name = "MIB")]
    pub block_size_mb: usize,

    /// Task queue capacity (controls memory usage)
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY, value_name = "NUM")]
    pub queue_size: usize,

    /// Hash on a single thread (baseline mode)
    #[arg(long)]
    pub sequential: bool,

    /// Print a `digest  path` line per hashed file
    #[arg(short = 'l', long)]
    pub list: bool,

    /// Print the full report as JSON
    #[arg(long)]
    pub json: bool,

    /// Exclude paths matching pattern (can be repeated)
    #[arg(long = "exclude", value_name = "PATTERN", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (show per-file failures and debug logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

fn default_workers() -> usize {
    // Hashing is CPU-bound once the page cache is warm; one worker per core
    num_cpus::get().max(1)
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct HashConfig {
    /// Root directory to hash
    pub root: PathBuf,

    /// Number of worker threads
    pub worker_count: usize,

    /// Digest algorithm
    pub algorithm: HashAlgorithm,

    /// Read block size in bytes
    pub block_size: usize,

    /// Task queue capacity
    pub queue_capacity: usize,

    /// Compiled exclude patterns
    pub exclude_patterns: Vec<Regex>,

    /// Run the sequential baseline instead of the worker pool
    pub sequential: bool,

    /// Show progress indicator
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,

    /// Print per-file digest lines
    pub list: bool,

    /// Print the report as JSON
    pub json: bool,
}

impl HashConfig {
    /// Default configuration for library use
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            worker_count: default_workers(),
            algorithm: HashAlgorithm::default(),
            block_size: DEFAULT_BLOCK_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            exclude_patterns: Vec::new(),
            sequential: false,
            show_progress: false,
            verbose: false,
            list: false,
            json: false,
        }
    }

    /// Override the worker count
    pub fn with_workers(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count.max(1);
        self
    }

    /// Override the digest algorithm
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Override the read block size
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    /// Attach exclude patterns
    pub fn with_excludes(mut self, patterns: Vec<Regex>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        if args.workers == 0 || args.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.workers,
                max: MAX_WORKERS,
            });
        }

        if args.queue_size < MIN_QUEUE_CAPACITY {
            return Err(ConfigError::InvalidQueueCapacity {
                size: args.queue_size,
                min: MIN_QUEUE_CAPACITY,
            });
        }

        let block_size = args.block_size_mb.saturating_mul(1024 * 1024);
        if !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&block_size) {
            return Err(ConfigError::InvalidBlockSize {
                size: block_size,
                min: MIN_BLOCK_SIZE,
                max: MAX_BLOCK_SIZE,
            });
        }

        let algorithm = args
            .algorithm
            .parse::<HashAlgorithm>()
            .map_err(|_| ConfigError::UnknownAlgorithm {
                name: args.algorithm.clone(),
            })?;

        let exclude_patterns = args
            .exclude_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| ConfigError::InvalidExcludePattern {
                    pattern: p.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            root: args.root,
            worker_count: args.workers,
            algorithm,
            block_size,
            queue_capacity: args.queue_size,
            exclude_patterns,
            sequential: args.sequential,
            show_progress: !args.quiet,
            verbose: args.verbose,
            list: args.list,
            json: args.json,
        })
    }
}
