//! Manifest (checksums file) reading and writing
//!
//! One record per line, UTF-8, sorted by [`PathKey`]. The same line parser
//! serves the update-mode loader and the verify pipeline.

mod record;

pub use record::*;

use crate::error::{ChecksumError, Result};
use crate::hash::HashAlgorithm;
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::Path;

/// Conventional manifest file name
pub const DEFAULT_MANIFEST_NAME: &str = "checksums.txt";

/// Path value meaning stdin (verify) or stdout (create)
pub const STDIO_PATH: &str = "-";

/// Previous manifest loaded for update mode
#[derive(Debug, Default)]
pub struct PreviousManifest {
    /// Path -> hash, as recorded
    pub entries: HashMap<String, String>,
    /// Lines that did not parse or whose hash does not fit the algorithm
    pub invalid_lines: usize,
    /// Paths recorded more than once (the later line wins)
    pub duplicates: usize,
}

impl PreviousManifest {
    /// Whether any line was rejected
    pub fn has_errors(&self) -> bool {
        self.invalid_lines > 0 || self.duplicates > 0
    }

    /// Number of usable records
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no usable record was found
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a manifest, logging each rejected line
    pub fn read<R: BufRead>(reader: R, algorithm: &HashAlgorithm, source: &Path) -> Result<Self> {
        let mut manifest = Self::default();

        for line in reader.lines() {
            let line = line.map_err(|e| ChecksumError::ManifestUnreadable {
                path: source.to_path_buf(),
                source: e,
            })?;

            let record = match ChecksumRecord::parse(&line) {
                Ok(Some(record)) if algorithm.accepts(&record.hash) => record,
                Ok(None) => continue,
                Ok(Some(_)) => {
                    manifest.reject(ChecksumError::InvalidRecord { line });
                    continue;
                }
                Err(err) => {
                    manifest.reject(err);
                    continue;
                }
            };

            let path = record.path.clone();
            if manifest.entries.insert(record.path, record.hash).is_some() {
                manifest.reject(ChecksumError::DuplicateRecord { path });
            }
        }

        Ok(manifest)
    }

    fn reject(&mut self, err: ChecksumError) {
        tracing::error!(error = %err, "Rejected hash record");
        match err {
            ChecksumError::DuplicateRecord { .. } => self.duplicates += 1,
            _ => self.invalid_lines += 1,
        }
    }

    /// Load from a file on disk
    pub fn load(path: &Path, algorithm: &HashAlgorithm) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| ChecksumError::ManifestUnreadable {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::read(std::io::BufReader::new(file), algorithm, path)
    }
}

/// Buffered manifest output
pub struct ManifestWriter<W: Write> {
    inner: std::io::BufWriter<W>,
    records: usize,
}

impl<W: Write> ManifestWriter<W> {
    /// Wrap a sink
    pub fn new(inner: W) -> Self {
        Self {
            inner: std::io::BufWriter::new(inner),
            records: 0,
        }
    }

    /// Append one `hash  path` line
    pub fn write_record(&mut self, hash: &str, key: &PathKey) -> std::io::Result<()> {
        writeln!(self.inner, "{}  {}", hash, key)?;
        self.records += 1;
        Ok(())
    }

    /// Flush buffered output
    pub fn finish(mut self) -> std::io::Result<usize> {
        self.inner.flush()?;
        Ok(self.records)
    }
}
