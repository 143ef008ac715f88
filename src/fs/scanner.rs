//! Directory tree scanner
//!
//! Walks the base directory (following symlinks) and reports every regular,
//! readable file together with its relative path as a [`PathKey`]. The
//! relative path is rebuilt from a depth-indexed component stack instead of
//! stripping prefixes from absolute paths.

use crate::error::{ChecksumError, Result};
use crate::manifest::PathKey;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Follow symbolic links
    pub follow_symlinks: bool,
    /// File to leave out of the scan (the manifest being written)
    pub exclude: Option<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: true,
            exclude: None,
        }
    }
}

/// Counters for one walk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStats {
    /// Files handed to the visitor
    pub files: usize,
    /// Entries skipped because they are not regular files or cannot be read
    pub unreadable: Vec<PathKey>,
    /// Traversal errors (permission denied on a directory, symlink loops)
    pub walk_errors: usize,
}

/// One file found by the scanner
#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// Path relative to the base directory
    pub key: PathKey,
    /// Path usable for opening the file
    pub path: PathBuf,
}

/// Recursive walker producing one entry per regular, readable file
pub struct TreeScanner {
    config: ScanConfig,
    exclude: Option<PathBuf>,
}

impl TreeScanner {
    /// Create a scanner; the exclude path is canonicalized up front
    pub fn new(config: ScanConfig) -> Self {
        let exclude = config
            .exclude
            .as_ref()
            .map(|p| p.canonicalize().unwrap_or_else(|_| p.clone()));
        Self { config, exclude }
    }

    fn is_excluded(&self, path: &Path, name: &OsStr) -> bool {
        let Some(exclude) = &self.exclude else {
            return false;
        };
        if exclude.file_name() != Some(name) {
            return false;
        }
        match path.canonicalize() {
            Ok(canonical) => &canonical == exclude,
            Err(_) => path == exclude,
        }
    }

    /// Walk `root`, calling `visit` for each file in traversal order
    pub fn scan<F>(&self, root: &Path, mut visit: F) -> Result<ScanStats>
    where
        F: FnMut(ScannedFile) -> Result<()>,
    {
        if !root.exists() {
            return Err(ChecksumError::BasePathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ChecksumError::BasePathNotDirectory(root.to_path_buf()));
        }

        let mut stats = ScanStats::default();
        let mut components: Vec<String> = Vec::new();

        let walker = WalkDir::new(root).follow_links(self.config.follow_symlinks);
        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    stats.walk_errors += 1;
                    let path = err.path().map(|p| p.display().to_string()).unwrap_or_default();
                    tracing::error!(path = %path, error = %err, "Error occurred while walking directory");
                    continue;
                }
            };

            let depth = entry.depth();
            if depth == 0 {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry.file_type();

            if file_type.is_dir() {
                components.truncate(depth - 1);
                components.push(name);
                continue;
            }

            if self.is_excluded(entry.path(), entry.file_name()) {
                tracing::debug!(path = %entry.path().display(), "Skipping checksum file");
                continue;
            }

            let mut parts = Vec::with_capacity(depth);
            parts.extend_from_slice(&components[..depth - 1]);
            parts.push(name);
            let key = PathKey::new(parts);

            if !file_type.is_file() || File::open(entry.path()).is_err() {
                tracing::error!(path = %entry.path().display(), "File cannot be read");
                stats.unreadable.push(key);
                continue;
            }

            stats.files += 1;
            visit(ScannedFile {
                key,
                path: entry.into_path(),
            })?;
        }

        Ok(stats)
    }

    /// Collect every file, sorted by path key
    pub fn collect(&self, root: &Path) -> Result<(Vec<ScannedFile>, ScanStats)> {
        let mut files = Vec::new();
        let stats = self.scan(root, |file| {
            files.push(file);
            Ok(())
        })?;
        files.sort_by(|a, b| a.key.cmp(&b.key));
        Ok((files, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_tree(dir: &Path) {
        std::fs::create_dir_all(dir.join("a/b")).unwrap();
        std::fs::create_dir_all(dir.join("empty")).unwrap();
        std::fs::write(dir.join("a/b/deep.txt"), b"deep").unwrap();
        std::fs::write(dir.join("a/one.txt"), b"one").unwrap();
        std::fs::write(dir.join("ab"), b"ab").unwrap();
        std::fs::write(dir.join("top.txt"), b"top").unwrap();
    }

    fn keys(files: &[ScannedFile]) -> Vec<String> {
        files.iter().map(|f| f.key.to_string()).collect()
    }

    #[test]
    fn test_collect_builds_relative_sorted_keys() {
        let temp = TempDir::new().unwrap();
        create_test_tree(temp.path());

        let scanner = TreeScanner::new(ScanConfig::default());
        let (files, stats) = scanner.collect(temp.path()).unwrap();

        assert_eq!(keys(&files), vec!["a/b/deep.txt", "a/one.txt", "ab", "top.txt"]);
        assert_eq!(stats.files, 4);
        assert_eq!(stats.walk_errors, 0);
        assert!(files[0].path.ends_with("a/b/deep.txt"));
    }

    #[test]
    fn test_excludes_manifest() {
        let temp = TempDir::new().unwrap();
        create_test_tree(temp.path());
        let manifest = temp.path().join("checksums.txt");
        std::fs::write(&manifest, b"").unwrap();

        let scanner = TreeScanner::new(ScanConfig {
            exclude: Some(manifest),
            ..Default::default()
        });
        let (files, _) = scanner.collect(temp.path()).unwrap();
        assert!(!keys(&files).contains(&"checksums.txt".to_string()));
        assert_eq!(files.len(), 4);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let temp = TempDir::new().unwrap();
        let scanner = TreeScanner::new(ScanConfig::default());
        let err = scanner.collect(&temp.path().join("missing")).unwrap_err();
        assert!(matches!(err, ChecksumError::BasePathNotFound(_)));

        let file = temp.path().join("file");
        std::fs::write(&file, b"x").unwrap();
        let err = scanner.collect(&file).unwrap_err();
        assert!(matches!(err, ChecksumError::BasePathNotDirectory(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_follows_directory_symlinks() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        std::fs::write(outside.path().join("linked.txt"), b"l").unwrap();
        std::os::unix::fs::symlink(outside.path(), temp.path().join("link")).unwrap();

        let scanner = TreeScanner::new(ScanConfig::default());
        let (files, _) = scanner.collect(temp.path()).unwrap();
        assert_eq!(keys(&files), vec!["link/linked.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_broken_symlink_is_logged_and_skipped() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("ok.txt"), b"ok").unwrap();
        std::os::unix::fs::symlink(temp.path().join("gone"), temp.path().join("dangling")).unwrap();

        let scanner = TreeScanner::new(ScanConfig::default());
        let (files, stats) = scanner.collect(temp.path()).unwrap();
        assert_eq!(keys(&files), vec!["ok.txt"]);
        assert_eq!(stats.unreadable.len() + stats.walk_errors, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_fifo_is_reported_unreadable_with_its_key() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("d")).unwrap();
        std::fs::write(temp.path().join("d/ok"), b"ok").unwrap();
        let status = std::process::Command::new("mkfifo")
            .arg(temp.path().join("d/pipe"))
            .status()
            .unwrap();
        assert!(status.success());

        let scanner = TreeScanner::new(ScanConfig::default());
        let (files, stats) = scanner.collect(temp.path()).unwrap();
        assert_eq!(keys(&files), vec!["d/ok"]);
        assert_eq!(stats.unreadable, vec![PathKey::parse("d/pipe")]);
    }
}
