//! Sequential baseline runner
//!
//! Hashes every enumerated file on the calling thread, in enumeration
//! order. Exists as the correctness and performance baseline: for the same
//! root and algorithm its success mapping must equal the parallel
//! coordinator's, whatever the worker count.

use crate::config::HashConfig;
use crate::content::ContentHasher;
use crate::report::{HashReport, HashResult, ResultAggregator};
use crate::runner::RunStats;
use crate::walk::FileEnumerator;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Single-threaded baseline executor
pub struct SequentialRunner {
    config: Arc<HashConfig>,
    shutdown: Arc<AtomicBool>,
    stats: Arc<RunStats>,
}

impl SequentialRunner {
    pub fn new(config: HashConfig) -> Self {
        Self {
            config: Arc::new(config),
            shutdown: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(RunStats::new()),
        }
    }

    /// Get a clone of the shutdown flag (for signal handlers)
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Live counters, for progress polling
    pub fn stats(&self) -> Arc<RunStats> {
        Arc::clone(&self.stats)
    }

    /// Hash every file under the root, one at a time
    pub fn run(self) -> crate::error::Result<HashReport> {
        let start = Instant::now();
        let started_at = Utc::now();

        let enumerator = FileEnumerator::new(&self.config.root)?
            .with_excludes(self.config.exclude_patterns.clone());

        info!(
            root = %self.config.root.display(),
            algorithm = %self.config.algorithm,
            "starting sequential hash run"
        );

        let hasher =
            ContentHasher::new(self.config.algorithm).with_block_size(self.config.block_size);

        let mut aggregator = ResultAggregator::new();
        let mut interrupted = false;

        for path in enumerator.iter() {
            if self.shutdown.load(Ordering::Relaxed) {
                interrupted = true;
                break;
            }
            self.stats.record_enumerated();

            let result = match hasher.hash_file(&path) {
                Ok(content) => HashResult::hashed(path, content),
                Err(error) => {
                    warn!(error = %error, "file failed to hash");
                    HashResult::failed(path, error)
                }
            };

            self.stats.record_result(&result);
            aggregator.record(result)?;
        }

        let partial = interrupted || self.shutdown.load(Ordering::Relaxed);
        let elapsed = start.elapsed();
        info!(
            files = aggregator.len(),
            partial,
            elapsed_ms = elapsed.as_millis() as u64,
            "sequential hash run finished"
        );

        Ok(aggregator.finish(partial, started_at, elapsed))
    }
}
