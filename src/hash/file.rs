//! Hashing files through a reusable scratch buffer and context

use super::algorithm::{HashAlgorithm, Hasher, StreamingHash};
use crate::error::{IoResultExt, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read buffer size for file hashing
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Per-thread hashing state: one read buffer and one streaming context.
///
/// Both are created on first use and reused for every following file.
#[derive(Debug)]
pub struct HashScratch {
    algorithm: HashAlgorithm,
    seed: u64,
    buffer: Vec<u8>,
    hasher: Option<Hasher>,
}

impl HashScratch {
    /// Scratch for one algorithm; nothing is allocated yet
    pub fn new(algorithm: HashAlgorithm, seed: u64) -> Self {
        Self {
            algorithm,
            seed,
            buffer: Vec::new(),
            hasher: None,
        }
    }

    /// Algorithm this scratch hashes with
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash everything `reader` yields
    pub fn hash_reader<R: Read>(&mut self, reader: &mut R, path: &Path) -> Result<String> {
        if self.buffer.is_empty() {
            self.buffer = vec![0u8; DEFAULT_BUFFER_SIZE];
        }
        let (algorithm, seed) = (self.algorithm, self.seed);
        let hasher = self.hasher.get_or_insert_with(|| algorithm.hasher(seed));
        hasher.reset();

        loop {
            let n = match reader.read(&mut self.buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    hasher.reset();
                    return Err(e).with_path(path);
                }
            };
            hasher.update(&self.buffer[..n]);
        }

        Ok(hasher.digest())
    }

    /// Hash the file at `path`
    pub fn hash_file(&mut self, path: &Path) -> Result<String> {
        let mut file = File::open(path).with_path(path)?;
        self.hash_reader(&mut file, path)
    }
}

/// Hash a file without keeping scratch state around
pub fn hash_file(algorithm: HashAlgorithm, seed: u64, path: &Path) -> Result<String> {
    HashScratch::new(algorithm, seed).hash_file(path)
}
