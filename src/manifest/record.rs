//! Checksum records and their text form
//!
//! A manifest line is `<hash><one or more spaces><path>`. The hash ends at
//! the first space; every space after it is skipped; what remains is the
//! `/`-separated relative path.

use crate::error::{ChecksumError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relative path as an ordered list of components.
///
/// Ordering compares components one by one; a path that is a strict prefix
/// of another sorts first. `["a"] < ["a", "b"] < ["ab"]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PathKey(Vec<String>);

impl PathKey {
    /// Build a key from components; none may contain `/`
    pub fn new(components: Vec<String>) -> Self {
        debug_assert!(components.iter().all(|c| !c.contains('/')));
        Self(components)
    }

    /// Split a `/`-joined manifest path
    pub fn parse(path: &str) -> Self {
        Self(path.split('/').map(str::to_owned).collect())
    }

    /// `/`-joined form used in manifests
    pub fn joined(&self) -> String {
        self.0.join("/")
    }
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.0 {
            if !first {
                f.write_str("/")?;
            }
            f.write_str(component)?;
            first = false;
        }
        Ok(())
    }
}

/// One `(hash, path)` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumRecord {
    /// Hex digest as written in the manifest
    pub hash: String,
    /// Relative path, `/`-joined
    pub path: String,
}

impl ChecksumRecord {
    /// Create a record
    pub fn new(hash: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            path: path.into(),
        }
    }

    /// Parse one manifest line.
    ///
    /// Returns `Ok(None)` for blank lines and `InvalidRecord` when there is
    /// no space, or nothing but spaces after the hash.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        if line.trim().is_empty() {
            return Ok(None);
        }

        let invalid = || ChecksumError::InvalidRecord {
            line: line.to_owned(),
        };

        let split = line.find(' ').ok_or_else(invalid)?;
        let (hash, rest) = line.split_at(split);
        let path = rest.trim_start_matches(' ');
        if path.is_empty() || hash.is_empty() {
            return Err(invalid());
        }

        Ok(Some(Self::new(hash, path)))
    }

    /// Width of the hash field of a raw line, if it has one
    pub fn hash_width(line: &str) -> Option<usize> {
        line.find(' ')
    }

    /// Ordering key for the path
    pub fn key(&self) -> PathKey {
        PathKey::parse(&self.path)
    }

    /// Case-insensitive hash comparison
    pub fn hash_matches(&self, other: &str) -> bool {
        self.hash.eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for ChecksumRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}", self.hash, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key(parts: &[&str]) -> PathKey {
        PathKey::new(parts.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_ordering_prefix_first_then_components() {
        let mut keys = vec![key(&["ab"]), key(&["a", "b"]), key(&["a"])];
        keys.sort();
        assert_eq!(keys, vec![key(&["a"]), key(&["a", "b"]), key(&["ab"])]);
    }

    #[test]
    fn test_ordering_is_per_component() {
        // "a.txt" < "a/..." by characters, but component "a" < "a.txt".
        assert!(key(&["a", "z"]) < key(&["a.txt"]));
        assert!(key(&["dir", "file"]) < key(&["dir2"]));
    }

    #[test]
    fn test_parse_simple() {
        let rec = ChecksumRecord::parse("abcd  dir/file.txt").unwrap().unwrap();
        assert_eq!(rec.hash, "abcd");
        assert_eq!(rec.path, "dir/file.txt");
        assert_eq!(rec.key(), key(&["dir", "file.txt"]));
    }

    #[test]
    fn test_parse_skips_all_spaces_after_hash() {
        let rec = ChecksumRecord::parse("abcd      name with spaces ").unwrap().unwrap();
        assert_eq!(rec.path, "name with spaces ");
        let rec = ChecksumRecord::parse("abcd x").unwrap().unwrap();
        assert_eq!(rec.path, "x");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(ChecksumRecord::parse("abcdef").is_err());
        assert!(ChecksumRecord::parse("abcdef    ").is_err());
        assert!(ChecksumRecord::parse(" leading").is_err());
    }

    #[test]
    fn test_parse_blank_lines_are_skipped() {
        assert_eq!(ChecksumRecord::parse("").unwrap(), None);
        assert_eq!(ChecksumRecord::parse("   \t").unwrap(), None);
    }

    #[test]
    fn test_display_uses_two_spaces() {
        let rec = ChecksumRecord::new("00ff", "a/b");
        assert_eq!(rec.to_string(), "00ff  a/b");
        assert_eq!(key(&["a", "b"]).to_string(), "a/b");
    }

    #[test]
    fn test_hash_matches_ignores_case() {
        let rec = ChecksumRecord::new("00FF", "a");
        assert!(rec.hash_matches("00ff"));
        assert!(!rec.hash_matches("00fe"));
    }

    proptest! {
        #[test]
        fn prop_prefix_sorts_first(
            base in prop::collection::vec("[a-z]{1,4}", 1..4),
            extra in prop::collection::vec("[a-z]{1,4}", 1..3),
        ) {
            let short = PathKey::new(base.clone());
            let mut longer = base;
            longer.extend(extra);
            prop_assert!(short < PathKey::new(longer));
        }

        #[test]
        fn prop_format_then_parse_keeps_fields(
            hash in "[0-9a-f]{8,64}",
            parts in prop::collection::vec("[a-zA-Z0-9._-][a-zA-Z0-9._ -]{0,6}", 1..4),
        ) {
            let path = parts.join("/");
            let rec = ChecksumRecord::new(hash.clone(), path.clone());
            let parsed = ChecksumRecord::parse(&rec.to_string()).unwrap().unwrap();
            prop_assert_eq!(parsed.hash, hash);
            prop_assert_eq!(parsed.path, path);
        }
    }
}
