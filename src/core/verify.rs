//! Verify mode
//!
//! Each manifest line is checked independently: parse, hash width, target
//! existence and type, readability, then the hash comparison. Failures are
//! logged and counted; they never stop the batch.

use super::pool::WorkerPool;
use crate::error::{ChecksumError, Result};
use crate::hash::{AlgorithmRegistry, HashAlgorithm, HashScratch};
use crate::manifest::{ChecksumRecord, PathKey};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Counts of a verification run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifySummary {
    /// Algorithm used, if one was selected or detected
    pub algorithm: Option<String>,
    /// Records whose file matched
    pub success: u64,
    /// Records that failed any check
    pub failure: u64,
    /// Paths of the failed records in path order; raw lines when a record did not parse
    pub failed: Vec<String>,
}

impl VerifySummary {
    /// True when no record failed
    pub fn is_success(&self) -> bool {
        self.failure == 0
    }

    /// Records checked
    pub fn total(&self) -> u64 {
        self.success + self.failure
    }
}

impl std::fmt::Display for VerifySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Verification Summary ===")?;
        if let Some(algorithm) = &self.algorithm {
            writeln!(f, "Algorithm: {}", algorithm)?;
        }
        writeln!(f, "Success:   {}", self.success)?;
        writeln!(f, "Failure:   {}", self.failure)?;
        for path in &self.failed {
            writeln!(f, "  FAILED   {}", path)?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct Counters {
    success: AtomicU64,
    failure: AtomicU64,
    failed: Mutex<Vec<String>>,
}

impl Counters {
    /// Run one check; a check that panics still counts as a failure
    fn check(&self, line: &str, check: impl FnOnce() -> Result<()>) {
        let mut guard = PanicGuard {
            counters: self,
            line,
            armed: true,
        };
        let outcome = check();
        guard.armed = false;

        match outcome {
            Ok(()) => {
                self.success.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                log_failure(&e);
                self.fail(line);
            }
        }
    }

    fn fail(&self, line: &str) {
        self.failure.fetch_add(1, Ordering::Relaxed);
        let label = match ChecksumRecord::parse(line) {
            Ok(Some(record)) => record.path,
            _ => line.to_string(),
        };
        match self.failed.lock() {
            Ok(mut failed) => failed.push(label),
            Err(poisoned) => poisoned.into_inner().push(label),
        }
    }

    fn failed_paths(&self) -> Vec<String> {
        let mut failed = match self.failed.lock() {
            Ok(failed) => failed.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        failed.sort_by_cached_key(|p| PathKey::parse(p));
        failed
    }
}

/// Counts its line as failed if dropped before the check returned
struct PanicGuard<'a> {
    counters: &'a Counters,
    line: &'a str,
    armed: bool,
}

impl Drop for PanicGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::error!(line = %self.line, "Verification task panicked");
            self.counters.fail(self.line);
        }
    }
}

fn log_failure(err: &ChecksumError) {
    match err {
        ChecksumError::HashMismatch {
            path,
            expected,
            actual,
        } => {
            tracing::error!(
                path = %path.display(),
                actual = %actual,
                expected = %expected,
                "Hash mismatch"
            );
        }
        ChecksumError::InvalidRecord { line } => {
            tracing::error!(line = %line, "Invalid hash record");
        }
        other => match other.path() {
            Some(path) => tracing::error!(path = %path.display(), error = %other, "Verification failed"),
            None => tracing::error!(error = %other, "Verification failed"),
        },
    }
}

/// Check one manifest line against the tree under `base`
fn verify_line(
    base: &Path,
    line: &str,
    algorithm: &HashAlgorithm,
    scratch: &mut HashScratch,
) -> Result<()> {
    let record = match ChecksumRecord::parse(line)? {
        Some(record) if algorithm.accepts(&record.hash) => record,
        _ => {
            return Err(ChecksumError::InvalidRecord {
                line: line.to_string(),
            })
        }
    };

    let target = base.join(&record.path);
    if !target.exists() {
        return Err(ChecksumError::FileNotFound(target));
    }
    if target.is_dir() {
        return Err(ChecksumError::IsDirectory(target));
    }
    let mut file = File::open(&target).map_err(|_| ChecksumError::Unreadable(target.clone()))?;

    let actual = scratch.hash_reader(&mut file, &target)?;
    if record.hash_matches(&actual) {
        tracing::trace!(path = %record.path, "OK");
        Ok(())
    } else {
        Err(ChecksumError::mismatch(target, record.hash, actual))
    }
}

/// Re-hashes the files listed in a manifest and compares
pub struct VerifyEngine {
    base_path: PathBuf,
    algorithm: Option<HashAlgorithm>,
    seed: u64,
    threads: usize,
}

impl VerifyEngine {
    /// Engine resolving record paths against `base_path`
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            algorithm: None,
            seed: 0,
            threads: 1,
        }
    }

    /// Force an algorithm instead of detecting it from the first record
    pub fn with_algorithm(mut self, algorithm: Option<HashAlgorithm>) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Seed for the xxHash family
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Worker thread count; 1 verifies on the reading thread
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    fn detect(&self, first_line: &str, registry: &AlgorithmRegistry) -> Result<HashAlgorithm> {
        if let Some(algorithm) = self.algorithm {
            return Ok(algorithm);
        }
        let algorithm = ChecksumRecord::hash_width(first_line)
            .and_then(|width| registry.by_hex_len(width))
            .ok_or_else(|| ChecksumError::CannotInferAlgorithm {
                line: first_line.to_string(),
            })?;
        tracing::info!(algorithm = %algorithm, "Detected hash algorithm");
        Ok(algorithm)
    }

    /// Verify every record read from `manifest`; `source` names it in errors
    pub fn run<R: BufRead>(
        &self,
        manifest: R,
        source: &Path,
        registry: &AlgorithmRegistry,
    ) -> Result<VerifySummary> {
        let unreadable = |e| ChecksumError::ManifestUnreadable {
            path: source.to_path_buf(),
            source: e,
        };
        let mut lines = manifest.lines();

        let mut first = None;
        for line in lines.by_ref() {
            let line = line.map_err(unreadable)?;
            if !line.trim().is_empty() {
                first = Some(line);
                break;
            }
        }
        let Some(first) = first else {
            tracing::info!("Checksum file has no records");
            return Ok(VerifySummary {
                algorithm: self.algorithm.map(|a| a.to_string()),
                ..Default::default()
            });
        };

        let algorithm = self.detect(&first, registry)?;
        if self.seed != 0 && !algorithm.uses_seed() {
            tracing::warn!(algorithm = %algorithm, "Seed is ignored by this algorithm");
        }
        let counters = Arc::new(Counters::default());
        let records = std::iter::once(Ok(first)).chain(lines);

        if self.threads > 1 {
            let pool = WorkerPool::new(self.threads, algorithm, self.seed)?;
            for line in records {
                let line = line.map_err(unreadable)?;
                if line.trim().is_empty() {
                    continue;
                }
                let counters = Arc::clone(&counters);
                let base = self.base_path.clone();
                // Completion is tracked through the counters; the handle is not needed.
                let _ = pool.submit(move |scratch| {
                    counters.check(&line, || verify_line(&base, &line, &algorithm, scratch));
                })?;
            }
            pool.join()?;
        } else {
            let mut scratch = HashScratch::new(algorithm, self.seed);
            for line in records {
                let line = line.map_err(unreadable)?;
                if line.trim().is_empty() {
                    continue;
                }
                counters.check(&line, || verify_line(&self.base_path, &line, &algorithm, &mut scratch));
            }
        }

        let summary = VerifySummary {
            algorithm: Some(algorithm.to_string()),
            success: counters.success.load(Ordering::Relaxed),
            failure: counters.failure.load(Ordering::Relaxed),
            failed: counters.failed_paths(),
        };
        tracing::info!(
            success = summary.success,
            failure = summary.failure,
            "Verification completed"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::CreateOrUpdateEngine;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn create_test_tree(dir: &Path) {
        std::fs::create_dir_all(dir.join("sub/inner")).unwrap();
        for i in 0..10 {
            let name = if i % 3 == 0 {
                format!("sub/inner/file{}", i)
            } else {
                format!("file{}", i)
            };
            std::fs::write(dir.join(name), vec![b'a' + i as u8; 1000 * i + 1]).unwrap();
        }
    }

    fn manifest_for(dir: &Path, name: &str) -> String {
        let algorithm = AlgorithmRegistry::standard().by_name(name).unwrap();
        let mut out = Vec::new();
        CreateOrUpdateEngine::new(dir, algorithm)
            .run(&mut out, None)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    fn verify(dir: &Path, manifest: &str, threads: usize) -> Result<VerifySummary> {
        VerifyEngine::new(dir).with_threads(threads).run(
            Cursor::new(manifest.to_string()),
            Path::new("mem"),
            &AlgorithmRegistry::standard(),
        )
    }

    #[test]
    fn test_round_trip_all_succeed() {
        let temp = TempDir::new().unwrap();
        create_test_tree(temp.path());

        for name in ["MD5", "SHA-1", "SHA-256", "SHA-512"] {
            let manifest = manifest_for(temp.path(), name);
            for threads in [1, 4] {
                let summary = verify(temp.path(), &manifest, threads).unwrap();
                assert_eq!(summary.success, 10, "{} with {} threads", name, threads);
                assert!(summary.is_success());
            }
        }
    }

    #[test]
    fn test_tampered_file_is_the_only_failure() {
        let temp = TempDir::new().unwrap();
        create_test_tree(temp.path());
        let manifest = manifest_for(temp.path(), "SHA-256");

        std::fs::write(temp.path().join("file5"), b"tampered").unwrap();

        let summary = verify(temp.path(), &manifest, 3).unwrap();
        assert_eq!((summary.success, summary.failure), (9, 1));
        assert_eq!(summary.failed, vec!["file5".to_string()]);
        assert!(!summary.is_success());
        assert!(summary.to_string().contains("FAILED   file5"));
    }

    #[test]
    fn test_malformed_line_counts_as_failure() {
        let temp = TempDir::new().unwrap();
        create_test_tree(temp.path());
        let mut manifest = manifest_for(temp.path(), "MD5");
        manifest.push_str("not-a-record\n\n");
        manifest.push_str("abcdef  wrong-width\n");

        let summary = verify(temp.path(), &manifest, 1).unwrap();
        assert_eq!((summary.success, summary.failure), (10, 2));
        assert_eq!(summary.failed, vec!["not-a-record".to_string(), "wrong-width".to_string()]);
    }

    #[test]
    fn test_missing_file_and_directory_targets_fail() {
        let temp = TempDir::new().unwrap();
        create_test_tree(temp.path());
        let hash = "0".repeat(32);
        let manifest = format!("{}  gone\n{}  sub\n", hash, hash);

        let summary = verify(temp.path(), &manifest, 2).unwrap();
        assert_eq!((summary.success, summary.failure), (0, 2));
        assert_eq!(summary.failed, vec!["gone".to_string(), "sub".to_string()]);
    }

    #[test]
    fn test_detects_algorithm_from_hash_width() {
        let temp = TempDir::new().unwrap();
        create_test_tree(temp.path());
        let manifest = format!("\n  \n{}", manifest_for(temp.path(), "SHA-384"));

        let summary = verify(temp.path(), &manifest, 1).unwrap();
        assert_eq!(summary.algorithm.as_deref(), Some("SHA-384"));
        assert_eq!(summary.success, 10);
    }

    #[test]
    fn test_undetectable_width_is_fatal() {
        let temp = TempDir::new().unwrap();
        let err = verify(temp.path(), "abc  file\n", 1).unwrap_err();
        assert!(matches!(err, ChecksumError::CannotInferAlgorithm { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_forced_algorithm_verifies_xxhash() {
        let temp = TempDir::new().unwrap();
        create_test_tree(temp.path());
        let registry = AlgorithmRegistry::standard();
        let manifest = manifest_for(temp.path(), "XXH128");

        let summary = VerifyEngine::new(temp.path())
            .with_algorithm(registry.by_name("XXH128"))
            .with_threads(2)
            .run(Cursor::new(manifest), Path::new("mem"), &registry)
            .unwrap();
        assert_eq!((summary.success, summary.failure), (10, 0));
    }

    #[test]
    fn test_panicking_check_counts_as_failure() {
        let counters = Counters::default();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            counters.check("0123  boom", || panic!("hasher blew up"));
        }));
        assert!(outcome.is_err());

        counters.check("4567  fine", || Ok(()));
        assert_eq!(counters.success.load(Ordering::Relaxed), 1);
        assert_eq!(counters.failure.load(Ordering::Relaxed), 1);
        assert_eq!(counters.failed_paths(), vec!["boom".to_string()]);
    }

    #[test]
    fn test_panicking_task_in_pool_counts_as_failure() {
        let algorithm = AlgorithmRegistry::standard().default_algorithm();
        let pool = WorkerPool::new(2, algorithm, 0).unwrap();
        let counters = Arc::new(Counters::default());

        for (i, line) in ["aa  one", "bb  two", "cc  three"].into_iter().enumerate() {
            let counters = Arc::clone(&counters);
            let _ = pool
                .submit(move |_| {
                    counters.check(line, || {
                        if i == 1 {
                            panic!("task failed hard");
                        }
                        Ok(())
                    })
                })
                .unwrap();
        }
        pool.join().unwrap();

        assert_eq!(counters.success.load(Ordering::Relaxed), 2);
        assert_eq!(counters.failure.load(Ordering::Relaxed), 1);
        assert_eq!(counters.failed_paths(), vec!["two".to_string()]);
    }

    #[test]
    fn test_empty_manifest_has_no_records() {
        let temp = TempDir::new().unwrap();
        let summary = verify(temp.path(), "\n\n", 4).unwrap();
        assert_eq!(summary.total(), 0);
        assert!(summary.is_success());
    }
}
