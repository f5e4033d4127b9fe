//! Parallel run coordinator - orchestrates the fan-out/fan-in hashing run
//!
//! The coordinator is responsible for:
//! - Validating the root before any work starts
//! - Feeding enumerated paths to the bounded task queue (producer thread)
//! - Spawning and joining the worker pool
//! - Aggregating the unordered result stream into the final report
//! - Cancellation and consistency checking
//!
//! Completion is driven by channel disconnection: the producer drops the
//! task sender when enumeration ends, each worker exits once the queue is
//! drained, and the aggregation loop ends when the last worker drops its
//! result sender. Every enumerated path therefore produces exactly one
//! result before the loop can finish.

use crate::config::HashConfig;
use crate::content::ContentHasher;
use crate::error::{HashWalkerError, InternalError, Result, WorkerError};
use crate::report::{HashReport, ResultAggregator};
use crate::runner::queue::{self, HashTask, TaskSender};
use crate::runner::worker::{aggregate_stats, Worker};
use crate::runner::RunStats;
use crate::walk::FileEnumerator;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Coordinates the parallel hashing run
pub struct HashCoordinator {
    config: Arc<HashConfig>,
    shutdown: Arc<AtomicBool>,
    stats: Arc<RunStats>,
}

impl HashCoordinator {
    /// Create a new coordinator
    pub fn new(config: HashConfig) -> Self {
        Self {
            config: Arc::new(config),
            shutdown: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(RunStats::new()),
        }
    }

    /// Get a clone of the shutdown flag (for signal handlers)
    ///
    /// Setting it stops the producer from enumerating and workers from
    /// claiming; already-issued results are kept and the report is marked
    /// partial.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Live counters, for progress polling
    pub fn stats(&self) -> Arc<RunStats> {
        Arc::clone(&self.stats)
    }

    /// Run the parallel hashing
    pub fn run(self) -> Result<HashReport> {
        let start = Instant::now();
        let started_at = Utc::now();

        // Root validation surfaces InvalidRoot before any thread exists
        let enumerator = FileEnumerator::new(&self.config.root)?
            .with_excludes(self.config.exclude_patterns.clone());

        info!(
            root = %self.config.root.display(),
            workers = self.config.worker_count,
            algorithm = %self.config.algorithm,
            "starting parallel hash run"
        );

        let (task_tx, task_rx) = queue::task_queue(self.config.queue_capacity);
        let (result_tx, result_rx) = queue::result_channel(self.config.queue_capacity);

        let hasher =
            ContentHasher::new(self.config.algorithm).with_block_size(self.config.block_size);

        let mut workers = Vec::with_capacity(self.config.worker_count);
        for id in 0..self.config.worker_count {
            workers.push(Worker::spawn(
                id,
                hasher.clone(),
                task_rx.clone(),
                result_tx.clone(),
                Arc::clone(&self.shutdown),
            )?);
        }
        debug!(count = workers.len(), "workers spawned");

        // Only workers may hold senders/receivers from here on, so that the
        // aggregation loop observes the disconnect when the last one exits
        drop(result_tx);
        drop(task_rx);

        let producer = self.spawn_producer(enumerator, task_tx)?;

        // Fan-in: drain results until every worker is done
        let mut aggregator = ResultAggregator::new();
        let mut violation: Option<InternalError> = None;

        while let Some(result) = result_rx.next_result() {
            self.stats.record_result(&result);
            if let Err(err) = aggregator.record(result) {
                // The report cannot be trusted; stop the run
                self.shutdown.store(true, Ordering::SeqCst);
                violation = Some(err);
                break;
            }
        }

        // Keep draining after a violation so no worker blocks on a full
        // channel while we wait for it to exit
        while result_rx.next_result().is_some() {}

        let enumerated = producer
            .join()
            .map_err(|_| HashWalkerError::Worker(WorkerError::EnumerationPanicked))?;

        let (hashed, failed, bytes) = aggregate_stats(&workers);
        for worker in workers {
            if let Err(e) = worker.join() {
                warn!(error = %e, "worker failed to join cleanly");
            }
        }
        debug!(hashed, failed, bytes, "worker pool drained");

        if let Some(err) = violation {
            return Err(err.into());
        }

        let partial = self.shutdown.load(Ordering::SeqCst);
        if !partial && aggregator.len() as u64 != enumerated {
            return Err(InternalError::MissingResults {
                expected: enumerated,
                received: aggregator.len() as u64,
            }
            .into());
        }

        let elapsed = start.elapsed();
        info!(
            files = aggregator.len(),
            failed,
            partial,
            elapsed_ms = elapsed.as_millis() as u64,
            "hash run finished"
        );

        Ok(aggregator.finish(partial, started_at, elapsed))
    }

    /// Spawn the enumeration producer feeding the task queue
    ///
    /// Returns the count of paths actually handed to workers; the thread
    /// stops early on shutdown or when every worker has already exited.
    fn spawn_producer(
        &self,
        enumerator: FileEnumerator,
        tasks: TaskSender,
    ) -> Result<JoinHandle<u64>> {
        let shutdown = Arc::clone(&self.shutdown);
        let stats = Arc::clone(&self.stats);

        thread::Builder::new()
            .name("enumerator".into())
            .spawn(move || {
                let mut count = 0u64;
                for path in enumerator.iter() {
                    if shutdown.load(Ordering::Relaxed) {
                        debug!("enumeration stopped by shutdown signal");
                        break;
                    }
                    if tasks.send(HashTask::new(path)).is_err() {
                        warn!("task queue closed before enumeration finished");
                        break;
                    }
                    count += 1;
                    stats.record_enumerated();
                }
                debug!(files = count, "enumeration finished");
                count
            })
            .map_err(|e| {
                HashWalkerError::Worker(WorkerError::SpawnFailed {
                    name: "enumerator".into(),
                    reason: e.to_string(),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{hash_bytes, HashAlgorithm};
    use std::fs;
    use tempfile::tempdir;

    fn test_config(root: &std::path::Path, workers: usize) -> HashConfig {
        HashConfig::new(root)
            .with_algorithm(HashAlgorithm::Sha256)
            .with_workers(workers)
    }

    #[test]
    fn test_run_hashes_every_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a"), b"alpha").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub/b"), b"beta").unwrap();

        let report = HashCoordinator::new(test_config(dir.path(), 4))
            .run()
            .unwrap();

        assert_eq!(report.success_count(), 2);
        assert_eq!(report.failure_count(), 0);
        assert!(!report.is_partial());
        assert_eq!(
            report.digest(&dir.path().join("a")).unwrap(),
            &hash_bytes(HashAlgorithm::Sha256, b"alpha")
        );
        assert_eq!(report.total_bytes(), 9);
    }

    #[test]
    fn test_invalid_root_fails_before_work() {
        let dir = tempdir().unwrap();
        let err = HashCoordinator::new(test_config(&dir.path().join("absent"), 2))
            .run()
            .unwrap_err();
        assert!(matches!(err, HashWalkerError::InvalidRoot { .. }));
    }

    #[test]
    fn test_preset_shutdown_yields_partial_empty_report() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a"), b"alpha").unwrap();

        let coordinator = HashCoordinator::new(test_config(dir.path(), 2));
        coordinator.shutdown_flag().store(true, Ordering::SeqCst);

        let report = coordinator.run().unwrap();
        assert!(report.is_partial());
        assert_eq!(report.success_count(), 0);
        assert_eq!(report.failure_count(), 0);
    }
}
