//! Immutable per-version file snapshots.
//!
//! A [`FileSnapshot`] maps relative paths to content plus a SHA-256 hash.
//! Snapshots are built once (from the store or from the working copy) and
//! never mutated; the modification detector compares hashes, the merge
//! engine compares content.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// One file's content at a fixed point, with its content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub text: String,
    /// Lowercase hex SHA-256 of `text`.
    pub hash: String,
}

impl FileContent {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let hash = hash_content(&text);
        Self { text, hash }
    }
}

/// Hash file content the way snapshots do (SHA-256, hex).
pub fn hash_content(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// An immutable mapping of relative file path to content at one version.
///
/// Backed by a `BTreeMap` so iteration order (and therefore per-file
/// outcome order) is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSnapshot {
    files: BTreeMap<PathBuf, FileContent>,
}

impl FileSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from `(path, content)` pairs.
    pub fn from_files<P, S, I>(files: I) -> Self
    where
        P: Into<PathBuf>,
        S: Into<String>,
        I: IntoIterator<Item = (P, S)>,
    {
        let files = files
            .into_iter()
            .map(|(p, c)| (p.into(), FileContent::new(c)))
            .collect();
        Self { files }
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.insert(path.into(), FileContent::new(content));
    }

    pub fn get(&self, path: &Path) -> Option<&FileContent> {
        self.files.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Iterate files in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &FileContent)> {
        self.files.iter()
    }

    /// All paths in this snapshot, in order.
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.keys()
    }

    /// The union of paths in `self` and `other`, in order, deduplicated.
    pub fn union_paths<'a>(&'a self, other: &'a FileSnapshot) -> Vec<&'a PathBuf> {
        let mut paths: Vec<&PathBuf> = self.files.keys().chain(other.files.keys()).collect();
        paths.sort();
        paths.dedup();
        paths
    }
}
