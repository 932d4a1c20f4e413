use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum KnownFailuresError {
    #[error("Failed to read known-failure list at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Corpus filenames whose comparison failure is tolerated.
///
/// Fixed before a run starts and only consulted once every file has been
/// processed. Crashes on these files are never tolerated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownFailures {
    names: BTreeSet<String>,
}

impl KnownFailures {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an allowlist file: one filename per line, `#` starts a comment
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, KnownFailuresError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| KnownFailuresError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        content
            .lines()
            .map(|line| line.split('#').next().unwrap_or_default().trim())
            .filter(|line| !line.is_empty())
            .collect()
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Union with another registry
    pub fn merged(mut self, other: KnownFailures) -> Self {
        self.names.extend(other.names);
        self
    }
}

impl<S: Into<String>> FromIterator<S> for KnownFailures {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::{create_test_dir, create_test_file};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_literal_list() {
        let known: KnownFailures = ["numbers.conf", "dot-number.conf"].into_iter().collect();

        assert!(known.is_known("numbers.conf"));
        assert!(known.is_known("dot-number.conf"));
        assert!(!known.is_known("numbers.json"));
        assert_eq!(known.len(), 2);
    }

    #[test]
    fn test_parse_ignores_comments_and_blank_lines() {
        let known = KnownFailures::parse(
            "# .NN is lexed as a number here, as a string upstream\n\
             dot-number.conf\n\
             \n\
             \tpadded.conf   # trailing comment\n",
        );

        assert_eq!(known.iter().collect::<Vec<_>>(), vec!["dot-number.conf", "padded.conf"]);
    }

    #[test]
    fn test_load_from_path() {
        let dir = create_test_dir();
        let path = create_test_file(&dir, "known-failures.txt", "a.conf\nb.conf\n");

        let known = KnownFailures::load_from_path(&path).unwrap();

        assert!(known.is_known("a.conf"));
        assert!(known.is_known("b.conf"));
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let dir = create_test_dir();

        let result = KnownFailures::load_from_path(dir.path().join("missing.txt"));

        assert!(matches!(result, Err(KnownFailuresError::Read { .. })));
    }

    #[test]
    fn test_merged_is_a_union() {
        let a: KnownFailures = ["a.conf"].into_iter().collect();
        let b: KnownFailures = ["b.conf", "a.conf"].into_iter().collect();

        let merged = a.merged(b);

        assert_eq!(merged.len(), 2);
        assert!(merged.is_known("b.conf"));
    }

    #[test]
    fn test_empty_registry_knows_nothing() {
        let known = KnownFailures::new();

        assert!(known.is_empty());
        assert!(!known.is_known(""));
    }
}
