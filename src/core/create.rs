//! Create and update modes
//!
//! The tree is walked on the calling thread. Every file gets a placeholder
//! in a map ordered by [`PathKey`]; with more than one thread the
//! placeholder is a pending task, otherwise the hash is computed on the
//! spot. Once the walk is done the map is resolved in key order, so the
//! manifest is identical whatever the thread count.

use super::pool::{TaskHandle, WorkerPool};
use crate::error::Result;
use crate::fs::{ScanConfig, ScanStats, ScannedFile, TreeScanner};
use crate::hash::{HashAlgorithm, HashScratch};
use crate::manifest::{ManifestWriter, PathKey, PreviousManifest};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

/// Difference between the previous manifest and the fresh scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// File not present in the previous manifest
    NewFile {
        /// Relative path
        path: String,
    },
    /// File whose content hash changed
    HashUpdated {
        /// Relative path
        path: String,
        /// Hash from the previous manifest
        old_hash: String,
        /// Hash computed now
        new_hash: String,
    },
    /// Recorded file that no longer exists
    RecordRemoved {
        /// Relative path
        path: String,
    },
    /// Recorded file that still exists but could not be read; its old record is kept
    RecordKept {
        /// Relative path
        path: String,
    },
}

impl ChangeEvent {
    /// Path the change refers to
    pub fn path(&self) -> &str {
        match self {
            Self::NewFile { path }
            | Self::HashUpdated { path, .. }
            | Self::RecordRemoved { path }
            | Self::RecordKept { path } => path,
        }
    }

    fn log(&self) {
        match self {
            Self::NewFile { path } => {
                tracing::info!(path = %path, "change: new file recorded");
            }
            Self::HashUpdated {
                path,
                old_hash,
                new_hash,
            } => {
                tracing::info!(path = %path, old = %old_hash, new = %new_hash, "change: hash updated");
            }
            Self::RecordRemoved { path } => {
                tracing::info!(path = %path, "change: record removed");
            }
            Self::RecordKept { path } => {
                tracing::warn!(path = %path, "change: file unreadable, previous record kept");
            }
        }
    }
}

/// Outcome of a create or update run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateReport {
    /// Records written to the new manifest
    pub records_written: usize,
    /// Changes against the previous manifest (update mode only), in report order
    pub changes: Vec<ChangeEvent>,
    /// Files that were opened but failed while hashing
    pub hash_failures: usize,
    /// Walk counters
    pub scan: ScanStats,
}

impl UpdateReport {
    /// Number of files newly recorded
    pub fn new_files(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, ChangeEvent::NewFile { .. }))
            .count()
    }

    /// Number of hashes that changed
    pub fn updated(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, ChangeEvent::HashUpdated { .. }))
            .count()
    }

    /// Number of records dropped
    pub fn removed(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, ChangeEvent::RecordRemoved { .. }))
            .count()
    }

    /// Number of old records carried over because the file could not be read
    pub fn kept(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, ChangeEvent::RecordKept { .. }))
            .count()
    }
}

impl std::fmt::Display for UpdateReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Checksum Summary ===")?;
        writeln!(f, "Records written: {}", self.records_written)?;
        if !self.changes.is_empty() {
            writeln!(f, "New files:       {}", self.new_files())?;
            writeln!(f, "Updated:         {}", self.updated())?;
            writeln!(f, "Removed:         {}", self.removed())?;
            writeln!(f, "Kept unreadable: {}", self.kept())?;
        }
        let unreadable = self.scan.unreadable.len() + self.hash_failures;
        if unreadable > 0 {
            writeln!(f, "Unreadable:      {}", unreadable)?;
        }
        if self.scan.walk_errors > 0 {
            writeln!(f, "Walk errors:     {}", self.scan.walk_errors)?;
        }
        Ok(())
    }
}

enum Pending {
    Done(Result<String>),
    Queued(TaskHandle<Result<String>>),
    Unreadable,
}

impl Pending {
    /// `None` for entries the scanner could not open
    fn resolve(self) -> Option<Result<String>> {
        match self {
            Self::Done(result) => Some(result),
            Self::Queued(handle) => Some(handle.wait().and_then(|result| result)),
            Self::Unreadable => None,
        }
    }
}

/// Builds a fresh manifest, optionally diffing it against the previous one
pub struct CreateOrUpdateEngine {
    base_path: PathBuf,
    algorithm: HashAlgorithm,
    seed: u64,
    threads: usize,
    exclude: Option<PathBuf>,
}

impl CreateOrUpdateEngine {
    /// Engine hashing files under `base_path` with `algorithm`
    pub fn new(base_path: impl Into<PathBuf>, algorithm: HashAlgorithm) -> Self {
        Self {
            base_path: base_path.into(),
            algorithm,
            seed: 0,
            threads: 1,
            exclude: None,
        }
    }

    /// Worker thread count; 1 hashes on the walking thread
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Seed for the xxHash family
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// File to leave out of the scan
    pub fn with_exclude(mut self, exclude: Option<PathBuf>) -> Self {
        self.exclude = exclude;
        self
    }

    fn collect(&self) -> Result<(BTreeMap<PathKey, Pending>, ScanStats, Option<WorkerPool>)> {
        let scanner = TreeScanner::new(ScanConfig {
            follow_symlinks: true,
            exclude: self.exclude.clone(),
        });
        let mut pending = BTreeMap::new();

        let (stats, pool) = if self.threads > 1 {
            let pool = WorkerPool::new(self.threads, self.algorithm, self.seed)?;
            let stats = scanner.scan(&self.base_path, |file: ScannedFile| {
                let path = file.path;
                let handle = pool.submit(move |scratch| scratch.hash_file(&path))?;
                pending.insert(file.key, Pending::Queued(handle));
                Ok(())
            })?;
            (stats, Some(pool))
        } else {
            let mut scratch = HashScratch::new(self.algorithm, self.seed);
            let stats = scanner.scan(&self.base_path, |file: ScannedFile| {
                pending.insert(file.key, Pending::Done(scratch.hash_file(&file.path)));
                Ok(())
            })?;
            (stats, None)
        };

        for key in &stats.unreadable {
            pending.insert(key.clone(), Pending::Unreadable);
        }
        Ok((pending, stats, pool))
    }

    /// Walk, hash and write the manifest to `output`.
    ///
    /// With `previous` set, every fresh record is checked against it and
    /// the differences are logged and returned.
    pub fn run<W: Write>(
        &self,
        output: W,
        mut previous: Option<PreviousManifest>,
    ) -> Result<UpdateReport> {
        if self.seed != 0 && !self.algorithm.uses_seed() {
            tracing::warn!(algorithm = %self.algorithm, "Seed is ignored by this algorithm");
        }
        tracing::debug!(
            base = %self.base_path.display(),
            algorithm = %self.algorithm,
            threads = self.threads,
            "Scanning"
        );

        let (pending, scan, pool) = self.collect()?;
        let mut writer = ManifestWriter::new(output);
        let mut report = UpdateReport {
            scan,
            ..Default::default()
        };

        for (key, placeholder) in pending {
            let hash = match placeholder.resolve() {
                Some(Ok(hash)) => Some(hash),
                Some(Err(e)) => {
                    tracing::error!(path = %key, error = %e, "Failed to hash file");
                    report.hash_failures += 1;
                    None
                }
                None => None,
            };

            // An unreadable file is not a removed file: carry its old record over.
            let Some(hash) = hash else {
                if let Some(previous) = previous.as_mut() {
                    let path = key.joined();
                    if let Some(old_hash) = previous.entries.remove(&path) {
                        writer.write_record(&old_hash, &key)?;
                        let change = ChangeEvent::RecordKept { path };
                        change.log();
                        report.changes.push(change);
                    }
                }
                continue;
            };

            if let Some(previous) = previous.as_mut() {
                let path = key.joined();
                let change = match previous.entries.remove(&path) {
                    None => Some(ChangeEvent::NewFile { path }),
                    Some(old_hash) if !old_hash.eq_ignore_ascii_case(&hash) => {
                        Some(ChangeEvent::HashUpdated {
                            path,
                            old_hash,
                            new_hash: hash.clone(),
                        })
                    }
                    Some(_) => None,
                };
                if let Some(change) = change {
                    change.log();
                    report.changes.push(change);
                }
            }

            writer.write_record(&hash, &key)?;
        }

        if let Some(previous) = previous {
            let mut removed: Vec<String> = previous.entries.into_keys().collect();
            removed.sort_by_cached_key(|p| PathKey::parse(p));
            for path in removed {
                let change = ChangeEvent::RecordRemoved { path };
                change.log();
                report.changes.push(change);
            }
        }

        report.records_written = writer.finish()?;
        if let Some(pool) = pool {
            pool.join()?;
        }

        tracing::info!(
            records = report.records_written,
            failures = report.hash_failures,
            "Done"
        );
        Ok(report)
    }
}
