//! Run execution: sequential baseline and parallel worker pool
//!
//! # Architecture
//!
//! ```text
//!                  ┌──────────────────────────┐
//!                  │     HashCoordinator      │
//!                  │  - validates the root    │
//!                  │  - producer thread walks │
//!                  │  - aggregates results    │
//!                  └────────────┬─────────────┘
//!                               │ bounded task queue
//!        ┌──────────────────────┼──────────────────────┐
//!        │                      │                      │
//!  ┌─────▼─────┐          ┌─────▼─────┐          ┌─────▼─────┐
//!  │  Worker 1 │          │  Worker 2 │          │  Worker W │
//!  │  hash file│          │  hash file│          │  hash file│
//!  └─────┬─────┘          └─────┬─────┘          └─────┬─────┘
//!        │                      │                      │
//!        └──────────────────────┼──────────────────────┘
//!                               │ unordered result channel
//!                  ┌────────────▼─────────────┐
//!                  │     ResultAggregator     │
//!                  └──────────────────────────┘
//! ```

pub mod coordinator;
pub mod queue;
pub mod sequential;
pub mod worker;

pub use coordinator::HashCoordinator;
pub use sequential::SequentialRunner;

use crate::report::{HashOutcome, HashResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Live counters for a run, shared between the executor and any progress
/// consumer
///
/// This is the optional progress surface: external code polls
/// [`RunStats::snapshot`] and never blocks the run.
#[derive(Debug)]
pub struct RunStats {
    started: Instant,
    enumerated: AtomicU64,
    hashed: AtomicU64,
    failed: AtomicU64,
    bytes: AtomicU64,
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            enumerated: AtomicU64::new(0),
            hashed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_enumerated(&self) {
        self.enumerated.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_result(&self, result: &HashResult) {
        match &result.outcome {
            HashOutcome::Hashed(content) => {
                self.hashed.fetch_add(1, Ordering::Relaxed);
                self.bytes.fetch_add(content.bytes, Ordering::Relaxed);
            }
            HashOutcome::Failed(_) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Point-in-time view of the run
    pub fn snapshot(&self) -> RunProgress {
        RunProgress {
            enumerated: self.enumerated.load(Ordering::Relaxed),
            hashed: self.hashed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
            elapsed: self.started.elapsed(),
        }
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress information for display
#[derive(Debug, Clone)]
pub struct RunProgress {
    /// Paths enumerated so far
    pub enumerated: u64,

    /// Files hashed successfully
    pub hashed: u64,

    /// Files that failed to hash
    pub failed: u64,

    /// Content bytes hashed
    pub bytes: u64,

    /// Elapsed time since the run started
    pub elapsed: Duration,
}

impl RunProgress {
    /// Results produced so far, successes and failures together
    pub fn completed(&self) -> u64 {
        self.hashed + self.failed
    }

    /// Completed files per second
    pub fn files_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.completed() as f64 / secs
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_rates() {
        let progress = RunProgress {
            enumerated: 1000,
            hashed: 900,
            failed: 100,
            bytes: 1024 * 1024,
            elapsed: Duration::from_secs(10),
        };

        assert_eq!(progress.completed(), 1000);
        assert!((progress.files_per_second() - 100.0).abs() < 0.1);
    }

    #[test]
    fn test_zero_elapsed_rate() {
        let progress = RunProgress {
            enumerated: 5,
            hashed: 5,
            failed: 0,
            bytes: 0,
            elapsed: Duration::ZERO,
        };
        assert_eq!(progress.files_per_second(), 0.0);
    }
}
