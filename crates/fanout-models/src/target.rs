//! Targets and target lists.
//!
//! Target files are plain text, one identifier per line. Blank lines are
//! skipped; every other line is a target, whatever it starts with.
//! Duplicates are detected case-insensitively after trimming; the first
//! occurrence wins, both for its spelling and its position in the list.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, TargetError};

/// A single identifier the command is run against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target(String);

impl Target {
    /// Parses a raw line into a target.
    ///
    /// Returns `None` for blank lines.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    /// Returns the target text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the normalized key used for duplicate detection.
    pub fn key(&self) -> String {
        self.0.to_lowercase()
    }

    /// Consumes the target, returning the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Target {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered list of unique targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetList {
    targets: Vec<Target>,
}

impl TargetList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from raw lines, dropping blanks and duplicates.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut targets = Vec::new();
        let mut duplicates = 0usize;

        for line in lines {
            let Some(target) = Target::parse(line.as_ref()) else {
                continue;
            };
            if seen.insert(target.key()) {
                targets.push(target);
            } else {
                duplicates += 1;
            }
        }

        if duplicates > 0 {
            debug!(duplicates, kept = targets.len(), "dropped duplicate targets");
        }

        Self { targets }
    }

    /// Loads targets from a file.
    ///
    /// # Errors
    ///
    /// Returns `TargetError::Read` if the file is missing or unreadable.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|source| TargetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8_lossy(&bytes);
        let list = Self::from_lines(text.lines());
        debug!(path = %path.display(), count = list.len(), "loaded targets");
        Ok(list)
    }

    /// Number of targets.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Returns true if there are no targets.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Returns the target at `index`.
    pub fn get(&self, index: usize) -> Option<&Target> {
        self.targets.get(index)
    }

    /// Iterates targets in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Target> {
        self.targets.iter()
    }
}

impl IntoIterator for TargetList {
    type Item = Target;
    type IntoIter = std::vec::IntoIter<Target>;

    fn into_iter(self) -> Self::IntoIter {
        self.targets.into_iter()
    }
}

impl<'a> IntoIterator for &'a TargetList {
    type Item = &'a Target;
    type IntoIter = std::slice::Iter<'a, Target>;

    fn into_iter(self) -> Self::IntoIter {
        self.targets.iter()
    }
}

impl FromIterator<Target> for TargetList {
    fn from_iter<I: IntoIterator<Item = Target>>(iter: I) -> Self {
        let mut seen = HashSet::new();
        let targets = iter
            .into_iter()
            .filter(|t| seen.insert(t.key()))
            .collect();
        Self { targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_target_parse_trims() {
        let target = Target::parse("  host-1.example.com \t").unwrap();
        assert_eq!(target.as_str(), "host-1.example.com");
        assert_eq!(target.to_string(), "host-1.example.com");
    }

    #[test]
    fn test_target_parse_blank() {
        assert!(Target::parse("").is_none());
        assert!(Target::parse("   ").is_none());
        assert!(Target::parse("\t\r").is_none());
    }

    #[test]
    fn test_hash_prefixed_line_is_a_target() {
        assert_eq!(Target::parse("#web01").unwrap().as_str(), "#web01");

        let list = TargetList::from_lines(["#web01", "db01"]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_dedup_case_and_whitespace() {
        let list = TargetList::from_lines(["a.com", "A.com ", "b.com", ""]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_dedup_first_seen_wins() {
        let list = TargetList::from_lines(["Web01", "db01", "WEB01", "web01"]);
        let names: Vec<&str> = list.iter().map(Target::as_str).collect();
        assert_eq!(names, vec!["Web01", "db01"]);
    }

    #[test]
    fn test_order_preserved() {
        let list = TargetList::from_lines(["c", "a", "b"]);
        let names: Vec<String> = list.into_iter().map(Target::into_inner).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_from_iterator_dedups() {
        let list: TargetList = ["x", "X", "y"]
            .iter()
            .filter_map(|s| Target::parse(s))
            .collect();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_load_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hosts.txt");
        std::fs::write(&path, "alpha\r\n\r\n#gamma\nbeta\nALPHA\n").unwrap();

        let list = TargetList::load(&path).unwrap();
        let names: Vec<&str> = list.iter().map(Target::as_str).collect();
        assert_eq!(names, vec!["alpha", "#gamma", "beta"]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.txt");

        let result = TargetList::load(&path);
        assert!(matches!(result, Err(TargetError::Read { .. })));
    }

    #[test]
    fn test_empty_list() {
        let list = TargetList::new();
        assert!(list.is_empty());
        assert!(list.get(0).is_none());
    }
}
