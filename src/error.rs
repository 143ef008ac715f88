//! Error types for treesum
//!
//! Configuration errors abort a run before any scanning starts. Per-record
//! errors are values that get logged and counted; they never stop a batch.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for treesum operations
#[derive(Error, Debug)]
pub enum ChecksumError {
    /// I/O error during file operations
    #[error("I/O error at '{path}': {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Algorithm name not known to the registry
    #[error("Unsupported hash algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Base directory does not exist
    #[error("Base path not found: {0}")]
    BasePathNotFound(PathBuf),

    /// Base path exists but is not a directory
    #[error("Base path is not a directory: {0}")]
    BasePathNotDirectory(PathBuf),

    /// Manifest path refers to a directory
    #[error("Checksum file is a directory: {0}")]
    ManifestIsDirectory(PathBuf),

    /// Manifest file is missing
    #[error("Checksum file not found: {0}")]
    ManifestNotFound(PathBuf),

    /// Manifest exists but could not be read
    #[error("Checksum file '{path}' cannot be read: {source}")]
    ManifestUnreadable {
        /// Manifest path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// No algorithm matches the hash length of the first record
    #[error("Cannot infer hash algorithm from record: {line}")]
    CannotInferAlgorithm {
        /// First non-blank manifest line
        line: String,
    },

    /// Reading/writing the manifest through stdin/stdout is not allowed in this mode
    #[error("Standard input/output cannot be used as the checksum file in {0} mode")]
    StdinNotAllowed(String),

    /// Generic configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Manifest line does not have the `<hash> <path>` shape
    #[error("Invalid hash record: {line}")]
    InvalidRecord {
        /// Offending line
        line: String,
    },

    /// Same path listed twice in a manifest
    #[error("Duplicate record for file '{path}'")]
    DuplicateRecord {
        /// Duplicated path
        path: String,
    },

    /// Target of a record does not exist
    #[error("File '{0}' does not exist")]
    FileNotFound(PathBuf),

    /// Target of a record is a directory
    #[error("'{0}' is a directory")]
    IsDirectory(PathBuf),

    /// Target of a record cannot be read
    #[error("File '{0}' cannot be read")]
    Unreadable(PathBuf),

    /// Live hash differs from the recorded one
    #[error("hash value of file '{path}' ({actual}) does not match the value in the record ({expected})")]
    HashMismatch {
        /// Record path
        path: PathBuf,
        /// Hash from the manifest
        expected: String,
        /// Hash computed now
        actual: String,
    },

    /// Worker pool failure
    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),
}

impl ChecksumError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a hash mismatch error
    pub fn mismatch(
        path: impl Into<PathBuf>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::HashMismatch {
            path: path.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Whether this error must abort the run before scanning
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedAlgorithm(_)
                | Self::BasePathNotFound(_)
                | Self::BasePathNotDirectory(_)
                | Self::ManifestIsDirectory(_)
                | Self::ManifestNotFound(_)
                | Self::ManifestUnreadable { .. }
                | Self::CannotInferAlgorithm { .. }
                | Self::StdinNotAllowed(_)
                | Self::ConfigError(_)
                | Self::ThreadPoolError(_)
        )
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. }
            | Self::BasePathNotFound(path)
            | Self::BasePathNotDirectory(path)
            | Self::ManifestIsDirectory(path)
            | Self::ManifestNotFound(path)
            | Self::ManifestUnreadable { path, .. }
            | Self::FileNotFound(path)
            | Self::IsDirectory(path)
            | Self::Unreadable(path)
            | Self::HashMismatch { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result type alias for treesum operations
pub type Result<T> = std::result::Result<T, ChecksumError>;

impl From<std::io::Error> for ChecksumError {
    fn from(err: std::io::Error) -> Self {
        ChecksumError::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for ChecksumError {
    fn from(err: serde_json::Error) -> Self {
        ChecksumError::ConfigError(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| ChecksumError::io(path, e))
    }
}
