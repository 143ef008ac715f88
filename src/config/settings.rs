//! Configuration settings for treesum
//!
//! Defines the CLI arguments, the runtime configuration derived from them,
//! and the checks that run before any file is touched.

use crate::error::{ChecksumError, Result};
use crate::hash::{AlgorithmRegistry, HashAlgorithm};
use crate::manifest::{DEFAULT_MANIFEST_NAME, STDIO_PATH};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// treesum - checksum manifests for directory trees
#[derive(Parser, Debug, Clone)]
#[command(name = "treesum")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Create, update and verify checksum manifests of directory trees")]
#[command(long_about = r#"
treesum records a hash for every file below a directory in a plain-text
manifest ("<hash>  <relative/path>" per line, sorted by path) and later
checks the tree against it.

Algorithms:
  MD5, SHA-1, SHA-224, SHA-256, SHA-384, SHA-512,
  CRC32, CRC32C, ADLER32, XXH64, XXH3-128

Examples:
  treesum create -d /data -f /data/checksums.txt   # Record every file
  treesum update -d /data -f /data/checksums.txt   # Refresh, report changes
  treesum -d /data -f /data/checksums.txt          # Verify (default mode)
  treesum create -a xxh128 -f - > sums.txt         # Manifest on stdout
"#)]
pub struct CliArgs {
    /// Operation mode
    #[arg(value_enum, default_value = "verify", value_name = "MODE")]
    pub mode: Mode,

    /// Checksum file ("-" for stdout in create mode, stdin in verify mode)
    #[arg(short = 'f', long = "file", default_value = DEFAULT_MANIFEST_NAME, value_name = "PATH")]
    pub file: PathBuf,

    /// Base directory of the tree
    #[arg(short = 'd', long = "directory", default_value = ".", value_name = "DIR")]
    pub directory: PathBuf,

    /// Hash algorithm (default: SHA-256 for create/update, detected for verify)
    #[arg(short = 'a', long, value_name = "NAME")]
    pub algorithm: Option<String>,

    /// Number of hashing threads (default: half the logical CPUs)
    #[arg(short = 'n', long = "num-threads", value_name = "NUM",
          value_parser = clap::value_parser!(u32).range(1..))]
    pub num_threads: Option<u32>,

    /// Answer yes to every confirmation prompt
    #[arg(short = 'y', long = "yes", visible_alias = "assume-yes")]
    pub yes: bool,

    /// Seed for XXH64 and XXH3-128
    #[arg(long, default_value = "0", value_name = "SEED")]
    pub seed: u64,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long)]
    pub no_color: bool,

    /// Format of the final summary
    #[arg(long, value_enum, default_value = "text", value_name = "FORMAT")]
    pub summary_format: SummaryFormat,
}

impl CliArgs {
    /// Log filter implied by -q / -v; RUST_LOG takes precedence when set
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Operation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Write a fresh manifest
    #[value(alias = "c")]
    Create,
    /// Rewrite the manifest and report differences
    #[value(alias = "u")]
    Update,
    /// Check the tree against the manifest
    #[default]
    #[value(alias = "v")]
    Verify,
}

impl Mode {
    /// Lowercase mode name
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Create => "create",
            Mode::Update => "update",
            Mode::Verify => "verify",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// How the final summary is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object
    Json,
}

/// Runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksumConfig {
    /// Operation mode
    pub mode: Mode,
    /// Manifest path; `-` selects stdin/stdout
    pub manifest: PathBuf,
    /// Base directory of the tree
    pub base_path: PathBuf,
    /// Requested algorithm name
    pub algorithm: Option<String>,
    /// Worker threads
    pub threads: usize,
    /// xxHash seed
    pub seed: u64,
    /// Skip confirmation prompts
    pub assume_yes: bool,
    /// Summary output format
    pub summary_format: SummaryFormat,
}

impl Default for ChecksumConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Verify,
            manifest: PathBuf::from(DEFAULT_MANIFEST_NAME),
            base_path: PathBuf::from("."),
            algorithm: None,
            threads: crate::core::default_threads(),
            seed: 0,
            assume_yes: false,
            summary_format: SummaryFormat::Text,
        }
    }
}

impl ChecksumConfig {
    /// Build from parsed CLI arguments
    pub fn from_cli(args: &CliArgs) -> Self {
        let mut config = Self {
            mode: args.mode,
            manifest: args.file.clone(),
            base_path: args.directory.clone(),
            algorithm: args.algorithm.clone(),
            seed: args.seed,
            assume_yes: args.yes,
            summary_format: args.summary_format,
            ..Default::default()
        };
        if let Some(n) = args.num_threads {
            config.threads = n as usize;
        }
        config
    }

    /// Whether the manifest goes through stdin/stdout
    pub fn uses_stdio(&self) -> bool {
        self.manifest == Path::new(STDIO_PATH)
    }

    /// Check paths and thread count; runs before any scanning
    pub fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(ChecksumError::config("Number of threads must be greater than 0"));
        }
        if !self.base_path.exists() {
            return Err(ChecksumError::BasePathNotFound(self.base_path.clone()));
        }
        if !self.base_path.is_dir() {
            return Err(ChecksumError::BasePathNotDirectory(self.base_path.clone()));
        }

        if self.uses_stdio() {
            if self.mode == Mode::Update {
                return Err(ChecksumError::StdinNotAllowed(self.mode.to_string()));
            }
            return Ok(());
        }

        if self.manifest.is_dir() {
            return Err(ChecksumError::ManifestIsDirectory(self.manifest.clone()));
        }
        if self.mode == Mode::Verify && !self.manifest.exists() {
            return Err(ChecksumError::ManifestNotFound(self.manifest.clone()));
        }
        Ok(())
    }

    /// Resolve the algorithm name.
    ///
    /// Returns `None` in verify mode when no name was given, meaning the
    /// algorithm is detected from the manifest.
    pub fn resolve_algorithm(&self, registry: &AlgorithmRegistry) -> Result<Option<HashAlgorithm>> {
        match &self.algorithm {
            Some(name) => registry
                .by_name(name)
                .map(Some)
                .ok_or_else(|| ChecksumError::UnsupportedAlgorithm(name.clone())),
            None if self.mode == Mode::Verify => Ok(None),
            None => Ok(Some(registry.default_algorithm())),
        }
    }
}
