//! Worker thread logic
//!
//! Each worker:
//! - Repeatedly claims the next path from the shared task queue
//! - Opens, streams, and hashes the file with its own handle
//! - Publishes a result per task, success or failure, to the result channel
//! - Exits when the queue closes, the aggregator disappears, or shutdown
//!   is signaled

use crate::content::ContentHasher;
use crate::error::WorkerError;
use crate::report::HashResult;
use crate::runner::queue::{Claim, ResultSender, TaskReceiver};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace, warn};

/// How long a worker waits for work before re-checking the shutdown flag
const CLAIM_TIMEOUT: Duration = Duration::from_millis(100);

/// Statistics collected by a worker
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Files hashed successfully
    pub files_hashed: AtomicU64,

    /// Files that failed to hash
    pub files_failed: AtomicU64,

    /// Content bytes hashed
    pub bytes_hashed: AtomicU64,
}

impl WorkerStats {
    fn record_hashed(&self, bytes: u64) {
        self.files_hashed.fetch_add(1, Ordering::Relaxed);
        self.bytes_hashed.fetch_add(bytes, Ordering::Relaxed);
    }

    fn record_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }
}

/// A worker thread that hashes claimed files
pub struct Worker {
    id: usize,
    handle: Option<JoinHandle<()>>,
    stats: Arc<WorkerStats>,
}

impl Worker {
    /// Spawn a new worker thread
    pub fn spawn(
        id: usize,
        hasher: ContentHasher,
        tasks: TaskReceiver,
        results: ResultSender,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self, WorkerError> {
        let stats = Arc::new(WorkerStats::default());
        let stats_clone = Arc::clone(&stats);

        let name = format!("hasher-{id}");
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || worker_loop(id, hasher, tasks, results, shutdown, stats_clone))
            .map_err(|e| WorkerError::SpawnFailed {
                name,
                reason: e.to_string(),
            })?;

        Ok(Self {
            id,
            handle: Some(handle),
            stats,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Wait for the worker to finish
    pub fn join(mut self) -> Result<(), WorkerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| WorkerError::Panicked {
                id: self.id,
                message: "worker thread panicked".into(),
            }),
            None => Ok(()),
        }
    }
}

/// Main worker loop
fn worker_loop(
    id: usize,
    hasher: ContentHasher,
    tasks: TaskReceiver,
    results: ResultSender,
    shutdown: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
) {
    debug!(worker = id, "worker starting");

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!(worker = id, "worker stopping on shutdown signal");
            break;
        }

        let task = match tasks.claim_timeout(CLAIM_TIMEOUT) {
            Claim::Task(task) => task,
            Claim::Empty => continue,
            Claim::Closed => break,
        };

        let result = match hasher.hash_file(&task.path) {
            Ok(content) => {
                stats.record_hashed(content.bytes);
                trace!(worker = id, path = %task.path.display(), "file hashed");
                HashResult::hashed(task.path, content)
            }
            Err(error) => {
                stats.record_failed();
                warn!(worker = id, error = %error, "file failed to hash");
                HashResult::failed(task.path, error)
            }
        };

        if results.publish(result).is_err() {
            // Aggregator gone; nothing left to report to
            break;
        }
    }

    debug!(
        worker = id,
        hashed = stats.files_hashed.load(Ordering::Relaxed),
        failed = stats.files_failed.load(Ordering::Relaxed),
        "worker exiting"
    );
}

/// Sum statistics across workers: (hashed, failed, bytes)
pub fn aggregate_stats(workers: &[Worker]) -> (u64, u64, u64) {
    let mut hashed = 0u64;
    let mut failed = 0u64;
    let mut bytes = 0u64;

    for worker in workers {
        hashed += worker.stats.files_hashed.load(Ordering::Relaxed);
        failed += worker.stats.files_failed.load(Ordering::Relaxed);
        bytes += worker.stats.bytes_hashed.load(Ordering::Relaxed);
    }

    (hashed, failed, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::HashAlgorithm;
    use crate::runner::queue::{result_channel, task_queue, HashTask};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_worker_stats_recording() {
        let stats = WorkerStats::default();
        stats.record_hashed(1024);
        stats.record_hashed(512);
        stats.record_failed();

        assert_eq!(stats.files_hashed.load(Ordering::Relaxed), 2);
        assert_eq!(stats.files_failed.load(Ordering::Relaxed), 1);
        assert_eq!(stats.bytes_hashed.load(Ordering::Relaxed), 1536);
    }

    #[test]
    fn test_worker_hashes_queued_files_and_exits_on_close() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("present.txt");
        fs::write(&present, b"content").unwrap();
        let absent = dir.path().join("absent.txt");

        let (task_tx, task_rx) = task_queue(8);
        let (result_tx, result_rx) = result_channel(8);
        let shutdown = Arc::new(AtomicBool::new(false));

        let worker = Worker::spawn(
            0,
            ContentHasher::new(HashAlgorithm::Sha256),
            task_rx,
            result_tx,
            Arc::clone(&shutdown),
        )
        .unwrap();

        task_tx.send(HashTask::new(&present)).unwrap();
        task_tx.send(HashTask::new(&absent)).unwrap();
        drop(task_tx);

        let first = result_rx.next_result().unwrap();
        let second = result_rx.next_result().unwrap();
        assert!(result_rx.next_result().is_none());

        let successes = [&first, &second].iter().filter(|r| r.is_success()).count();
        assert_eq!(successes, 1);

        worker.join().unwrap();
    }
}
