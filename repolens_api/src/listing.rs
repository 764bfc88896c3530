use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The kind of node a repository path resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// A regular file.
    File,
    /// A directory.
    Directory,
}

/// Backend-reported metadata for one directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dirent {
    /// Whether the entry is a file or a directory.
    pub kind: NodeKind,
    /// The revision that last changed this entry.
    pub created_rev: u64,
    /// Size in bytes; zero for directories.
    pub size: u64,
}

/// A directory listing at one (revision, path), keyed by child name.
pub type DirentSnapshot = BTreeMap<String, Dirent>;

/// A listing row handed to the presentation layer.
///
/// `name` and `kind` are filled by directory listing; the remaining fields
/// are decorated in place by per-directory log resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Child name within its parent directory.
    pub name: String,
    /// Whether the entry is a file or a directory.
    pub kind: NodeKind,
    /// The entry's most recent changeset number.
    #[serde(default)]
    pub rev: Option<u64>,
    /// Author of that changeset.
    #[serde(default)]
    pub author: Option<String>,
    /// Timestamp of that changeset in seconds since the epoch.
    #[serde(default)]
    pub date: Option<i64>,
    /// Log message of that changeset.
    #[serde(default)]
    pub message: Option<String>,
    /// Size in bytes, for files.
    #[serde(default)]
    pub size: Option<u64>,
}

impl DirEntry {
    /// A bare listing row with no log decoration.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            rev: None,
            author: None,
            date: None,
            message: None,
            size: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dir_entry_decoration_defaults() {
        let json = r#"{ "name": "README.txt", "kind": "File" }"#;
        let entry: DirEntry = serde_json::from_str(json).expect("deserialize entry");
        assert_eq!(entry, DirEntry::new("README.txt", NodeKind::File));
    }

    #[test]
    fn dirent_round_trip() {
        let dirent = Dirent {
            kind: NodeKind::Directory,
            created_rev: 17,
            size: 0,
        };
        let json = serde_json::to_string(&dirent).expect("serialize dirent");
        let decoded: Dirent = serde_json::from_str(&json).expect("deserialize dirent");
        assert_eq!(dirent, decoded);
    }
}
