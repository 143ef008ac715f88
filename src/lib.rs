//! # treesum - Checksum manifests for directory trees
//!
//! treesum walks a directory, hashes every regular file and writes a
//! manifest with one `<hash>  <relative/path>` line per file, sorted by
//! path. The manifest can later be refreshed (update mode, which reports
//! new, changed and removed files) or checked against the tree (verify
//! mode).
//!
//! ## Features
//!
//! - **Algorithms**: MD5, SHA-1, SHA-2 family (including SHA-512/t), SHA-3,
//!   CRC32, CRC32C, Adler-32, XXH64 and XXH3-128 (both implemented in this
//!   crate, seedable)
//! - **Parallel hashing**: fixed worker pool with per-worker scratch buffers
//! - **Deterministic output**: manifest order never depends on thread count
//! - **Auto-detection**: verify picks the digest from the recorded hash width
//!
//! ## Quick Start
//!
//! ```no_run
//! use treesum::core::{CreateOrUpdateEngine, VerifyEngine};
//! use treesum::hash::AlgorithmRegistry;
//! use std::path::Path;
//!
//! let registry = AlgorithmRegistry::standard();
//! let sha256 = registry.default_algorithm();
//!
//! let mut manifest = Vec::new();
//! let report = CreateOrUpdateEngine::new("/data", sha256)
//!     .with_threads(4)
//!     .run(&mut manifest, None)
//!     .unwrap();
//! println!("Recorded {} files", report.records_written);
//!
//! let summary = VerifyEngine::new("/data")
//!     .run(manifest.as_slice(), Path::new("<memory>"), &registry)
//!     .unwrap();
//! assert!(summary.is_success());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod error;
pub mod fs;
pub mod hash;
pub mod manifest;

// Re-export commonly used types
pub use config::{ChecksumConfig, CliArgs, Mode, SummaryFormat};
pub use core::{CreateOrUpdateEngine, UpdateReport, VerifyEngine, VerifySummary};
pub use error::{ChecksumError, Result};
pub use hash::{AlgorithmRegistry, HashAlgorithm};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use treesum::prelude::*;
    //! ```

    pub use crate::config::{ChecksumConfig, Mode, SummaryFormat};
    pub use crate::core::{ChangeEvent, CreateOrUpdateEngine, UpdateReport, VerifyEngine, VerifySummary};
    pub use crate::error::{ChecksumError, Result};
    pub use crate::fs::{ScanConfig, TreeScanner};
    pub use crate::hash::{hash_file, AlgorithmRegistry, HashAlgorithm, StreamingHash};
    pub use crate::manifest::{ChecksumRecord, PathKey, PreviousManifest};
}
