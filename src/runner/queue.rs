//! Bounded task queue and result channel
//!
//! Two channels connect the run:
//! - The task queue is fed by the single enumeration producer and drained
//!   by every worker. It is bounded, so a slow pool applies backpressure to
//!   enumeration instead of buffering the whole tree in memory.
//! - The result channel carries finished work from every worker to the
//!   single aggregator, in completion order.
//!
//! Channel disconnection is the completion signal on both: the producer
//! dropping its [`TaskSender`] tells workers the work set is final, and the
//! last worker dropping its [`ResultSender`] tells the aggregator the
//! stream is exhausted.

use crate::report::HashResult;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One claimed unit of work: a file to hash
#[derive(Debug, Clone)]
pub struct HashTask {
    pub path: PathBuf,
}

impl HashTask {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Counters shared by all handles of one task queue
#[derive(Debug, Default)]
pub struct QueueStats {
    enqueued: AtomicU64,
    dequeued: AtomicU64,
}

impl QueueStats {
    pub fn enqueued(&self) -> u64 {
        self.enqueued.load(Ordering::Relaxed)
    }

    pub fn dequeued(&self) -> u64 {
        self.dequeued.load(Ordering::Relaxed)
    }

    /// Tasks currently waiting to be claimed
    pub fn pending(&self) -> u64 {
        self.enqueued().saturating_sub(self.dequeued())
    }
}

/// Create the bounded task queue
pub fn task_queue(capacity: usize) -> (TaskSender, TaskReceiver) {
    let (sender, receiver) = bounded(capacity);
    let stats = Arc::new(QueueStats::default());

    (
        TaskSender {
            sender,
            stats: Arc::clone(&stats),
        },
        TaskReceiver { receiver, stats },
    )
}

/// Sending half of the task queue, owned by the enumeration producer
///
/// Dropping the last sender closes the queue; workers drain what is left
/// and exit.
#[derive(Clone)]
pub struct TaskSender {
    sender: Sender<HashTask>,
    stats: Arc<QueueStats>,
}

impl TaskSender {
    /// Send a task, blocking while the queue is full
    ///
    /// Errs only when every receiver is gone (all workers exited early).
    pub fn send(&self, task: HashTask) -> Result<(), ()> {
        self.sender.send(task).map_err(|_| ())?;
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }
}

/// What a worker sees when asking for work
#[derive(Debug)]
pub enum Claim {
    /// A task was claimed
    Task(HashTask),

    /// Queue open but momentarily empty
    Empty,

    /// Queue closed and fully drained; no more work will ever arrive
    Closed,
}

/// Receiving half of the task queue, cloned into every worker
#[derive(Clone)]
pub struct TaskReceiver {
    receiver: Receiver<HashTask>,
    stats: Arc<QueueStats>,
}

impl TaskReceiver {
    /// Claim the next task, waiting up to `timeout`
    ///
    /// No two workers ever see the same task: the claim is the channel
    /// receive itself.
    pub fn claim_timeout(&self, timeout: Duration) -> Claim {
        match self.receiver.recv_timeout(timeout) {
            Ok(task) => {
                self.stats.dequeued.fetch_add(1, Ordering::Relaxed);
                Claim::Task(task)
            }
            Err(RecvTimeoutError::Timeout) => Claim::Empty,
            Err(RecvTimeoutError::Disconnected) => Claim::Closed,
        }
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

/// Create the unordered result channel
pub fn result_channel(capacity: usize) -> (ResultSender, ResultReceiver) {
    let (sender, receiver) = bounded(capacity);
    (ResultSender { sender }, ResultReceiver { receiver })
}

/// Sending half of the result channel, cloned into every worker
#[derive(Clone)]
pub struct ResultSender {
    sender: Sender<HashResult>,
}

impl ResultSender {
    /// Publish a finished result, blocking while the channel is full
    ///
    /// Errs when the aggregator is gone; the worker has nothing left to
    /// report to and should stop.
    pub fn publish(&self, result: HashResult) -> Result<(), ()> {
        self.sender.send(result).map_err(|_| ())
    }
}

/// Receiving half of the result channel, owned by the aggregation loop
pub struct ResultReceiver {
    receiver: Receiver<HashResult>,
}

impl ResultReceiver {
    /// Next result in arrival order; `None` once every sender is dropped
    /// and the channel is drained
    pub fn next_result(&self) -> Option<HashResult> {
        self.receiver.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{hash_bytes, FileDigest, HashAlgorithm};

    #[test]
    fn test_task_round_trip() {
        let (sender, receiver) = task_queue(8);

        sender.send(HashTask::new("/data/a.txt")).unwrap();
        assert_eq!(receiver.len(), 1);

        match receiver.claim_timeout(Duration::from_millis(10)) {
            Claim::Task(task) => assert_eq!(task.path, PathBuf::from("/data/a.txt")),
            other => panic!("expected a task, got {other:?}"),
        }
        assert!(receiver.is_empty());
    }

    #[test]
    fn test_empty_then_closed() {
        let (sender, receiver) = task_queue(8);

        assert!(matches!(
            receiver.claim_timeout(Duration::from_millis(1)),
            Claim::Empty
        ));

        sender.send(HashTask::new("/last")).unwrap();
        drop(sender);

        // Queued work is still claimable after close, then the queue reports
        // closed forever
        assert!(matches!(
            receiver.claim_timeout(Duration::from_millis(1)),
            Claim::Task(_)
        ));
        assert!(matches!(
            receiver.claim_timeout(Duration::from_millis(1)),
            Claim::Closed
        ));
    }

    #[test]
    fn test_queue_stats() {
        let (sender, receiver) = task_queue(8);

        sender.send(HashTask::new("/a")).unwrap();
        sender.send(HashTask::new("/b")).unwrap();
        assert_eq!(sender.stats().enqueued(), 2);
        assert_eq!(sender.stats().pending(), 2);

        receiver.claim_timeout(Duration::from_millis(1));
        assert_eq!(sender.stats().dequeued(), 1);
        assert_eq!(sender.stats().pending(), 1);
    }

    #[test]
    fn test_send_fails_without_receivers() {
        let (sender, receiver) = task_queue(8);
        drop(receiver);
        assert!(sender.send(HashTask::new("/a")).is_err());
    }

    #[test]
    fn test_result_channel_drains_then_ends() {
        let (sender, receiver) = result_channel(8);

        let result = HashResult::hashed(
            PathBuf::from("/data/a"),
            FileDigest {
                digest: hash_bytes(HashAlgorithm::Sha256, b"a"),
                bytes: 1,
            },
        );
        sender.publish(result).unwrap();
        drop(sender);

        assert!(receiver.next_result().is_some());
        assert!(receiver.next_result().is_none());
    }
}
