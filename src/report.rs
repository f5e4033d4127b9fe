//! Run results and aggregation
//!
//! A worker produces one [`HashResult`] per claimed path and hands it off;
//! the [`ResultAggregator`] is the sole owner from then on and the only
//! writer of the final [`HashReport`]. Results are immutable once produced,
//! which is what makes the unordered fan-in safe.

use crate::content::{Digest, FileDigest};
use crate::error::{FileError, InternalError};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Outcome of hashing a single file
#[derive(Debug)]
pub enum HashOutcome {
    /// Digest computed
    Hashed(FileDigest),

    /// File could not be read; recorded per file, never fatal to the run
    Failed(FileError),
}

/// Result of one hashing task
///
/// Created by whichever worker executed the task, in arrival order for the
/// parallel path and enumeration order for the sequential path.
#[derive(Debug)]
pub struct HashResult {
    pub path: PathBuf,
    pub outcome: HashOutcome,
}

impl HashResult {
    pub fn hashed(path: PathBuf, content: FileDigest) -> Self {
        Self {
            path,
            outcome: HashOutcome::Hashed(content),
        }
    }

    pub fn failed(path: PathBuf, error: FileError) -> Self {
        Self {
            path,
            outcome: HashOutcome::Failed(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, HashOutcome::Hashed(_))
    }
}

/// Builds the final report from a result stream
///
/// Duplicate paths are a fatal internal error: an executor that produces
/// two results for one path has broken its exactly-once guarantee, and
/// silently overwriting would hide the bug.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    digests: BTreeMap<PathBuf, Digest>,
    failures: BTreeMap<PathBuf, FileError>,
    total_bytes: u64,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one result
    pub fn record(&mut self, result: HashResult) -> Result<(), InternalError> {
        if self.digests.contains_key(&result.path) || self.failures.contains_key(&result.path) {
            return Err(InternalError::DuplicateResult { path: result.path });
        }

        match result.outcome {
            HashOutcome::Hashed(content) => {
                self.total_bytes += content.bytes;
                self.digests.insert(result.path, content.digest);
            }
            HashOutcome::Failed(error) => {
                self.failures.insert(result.path, error);
            }
        }
        Ok(())
    }

    /// Results recorded so far, successes and failures together
    pub fn len(&self) -> usize {
        self.digests.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty() && self.failures.is_empty()
    }

    /// Finalize into a report once the result stream is exhausted
    pub fn finish(self, partial: bool, started_at: DateTime<Utc>, elapsed: Duration) -> HashReport {
        HashReport {
            digests: self.digests,
            failures: self.failures,
            partial,
            started_at,
            elapsed,
            total_bytes: self.total_bytes,
        }
    }
}

/// Final aggregate of a hashing run
#[derive(Debug)]
pub struct HashReport {
    digests: BTreeMap<PathBuf, Digest>,
    failures: BTreeMap<PathBuf, FileError>,
    partial: bool,
    started_at: DateTime<Utc>,
    elapsed: Duration,
    total_bytes: u64,
}

impl HashReport {
    /// Successful digests, keyed by path
    pub fn digests(&self) -> &BTreeMap<PathBuf, Digest> {
        &self.digests
    }

    /// Per-file failures, keyed by path
    pub fn failures(&self) -> &BTreeMap<PathBuf, FileError> {
        &self.failures
    }

    /// Digest for one path, if it was hashed successfully
    pub fn digest(&self, path: &Path) -> Option<&Digest> {
        self.digests.get(path)
    }

    pub fn success_count(&self) -> usize {
        self.digests.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// True when the run was interrupted before every enumerated path
    /// produced a result
    pub fn is_partial(&self) -> bool {
        self.partial
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Wall-clock duration of the run (informational only)
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Content bytes hashed across all successful files
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Write one `digest  path` line per successful file, sorted by path
    pub fn write_digest_lines(&self, out: &mut impl Write) -> io::Result<()> {
        for (path, digest) in &self.digests {
            writeln!(out, "{}  {}", digest, path.display())?;
        }
        Ok(())
    }

    /// Machine-readable form of the whole report
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "partial": self.partial,
            "started_at": self.started_at.to_rfc3339(),
            "elapsed_secs": self.elapsed.as_secs_f64(),
            "total_bytes": self.total_bytes,
            "digests": self
                .digests
                .iter()
                .map(|(path, digest)| {
                    json!({
                        "path": path.to_string_lossy(),
                        "digest": digest.to_hex(),
                    })
                })
                .collect::<Vec<_>>(),
            "failures": self
                .failures
                .iter()
                .map(|(path, error)| {
                    json!({
                        "path": path.to_string_lossy(),
                        "reason": error.to_string(),
                    })
                })
                .collect::<Vec<_>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{hash_bytes, HashAlgorithm};
    use std::io::ErrorKind;

    fn hashed(path: &str, content: &[u8]) -> HashResult {
        HashResult::hashed(
            PathBuf::from(path),
            FileDigest {
                digest: hash_bytes(HashAlgorithm::Sha256, content),
                bytes: content.len() as u64,
            },
        )
    }

    fn failed(path: &str) -> HashResult {
        HashResult::failed(
            PathBuf::from(path),
            FileError::Open {
                path: PathBuf::from(path),
                source: io::Error::new(ErrorKind::PermissionDenied, "denied"),
            },
        )
    }

    #[test]
    fn test_aggregates_successes_and_failures_separately() {
        let mut aggregator = ResultAggregator::new();
        aggregator.record(hashed("/data/a", b"aaa")).unwrap();
        aggregator.record(failed("/data/b")).unwrap();
        aggregator.record(hashed("/data/c", b"ccc")).unwrap();
        assert_eq!(aggregator.len(), 3);

        let report = aggregator.finish(false, Utc::now(), Duration::from_secs(1));
        assert_eq!(report.success_count(), 2);
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.total_bytes(), 6);
        assert!(!report.is_partial());
        assert!(report.digest(Path::new("/data/a")).is_some());
        assert!(report.digest(Path::new("/data/b")).is_none());
    }

    #[test]
    fn test_duplicate_result_is_fatal() {
        let mut aggregator = ResultAggregator::new();
        aggregator.record(hashed("/data/a", b"aaa")).unwrap();

        let err = aggregator.record(hashed("/data/a", b"aaa")).unwrap_err();
        assert!(matches!(err, InternalError::DuplicateResult { .. }));

        // A failure for an already-seen path is just as much a duplicate
        let err = aggregator.record(failed("/data/a")).unwrap_err();
        assert!(matches!(err, InternalError::DuplicateResult { .. }));
    }

    #[test]
    fn test_digest_lines_sorted_by_path() {
        let mut aggregator = ResultAggregator::new();
        aggregator.record(hashed("/data/z", b"z")).unwrap();
        aggregator.record(hashed("/data/a", b"a")).unwrap();

        let report = aggregator.finish(false, Utc::now(), Duration::ZERO);
        let mut out = Vec::new();
        report.write_digest_lines(&mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("/data/a"));
        assert!(lines[1].ends_with("/data/z"));
        assert!(lines[0].starts_with(&hash_bytes(HashAlgorithm::Sha256, b"a").to_hex()));
    }

    #[test]
    fn test_json_report_shape() {
        let mut aggregator = ResultAggregator::new();
        aggregator.record(hashed("/data/a", b"a")).unwrap();
        aggregator.record(failed("/data/b")).unwrap();

        let value = aggregator.finish(true, Utc::now(), Duration::from_millis(250)).to_json();
        assert_eq!(value["partial"], json!(true));
        assert_eq!(value["digests"].as_array().unwrap().len(), 1);
        assert_eq!(value["failures"].as_array().unwrap().len(), 1);
        assert_eq!(value["failures"][0]["path"], json!("/data/b"));
    }
}
