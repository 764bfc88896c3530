use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// How a changeset affected one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeAction {
    /// The path was added.
    Added,
    /// The path's content or properties were modified.
    Modified,
    /// The path was deleted.
    Deleted,
    /// The path was deleted and re-added in the same changeset.
    Replaced,
}

/// A per-changeset record for one changed path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedPath {
    /// What happened to the path.
    pub action: ChangeAction,
    /// The path this entry was copied or renamed from, reported on the
    /// destination changeset.
    #[serde(default)]
    pub copy_from_path: Option<String>,
    /// The revision the copy source was taken at.
    #[serde(default)]
    pub copy_from_rev: Option<u64>,
}

/// An atomic, numbered set of path changes committed together.
///
/// Changed-path keys carry leading slashes, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changeset {
    /// The changeset's revision number.
    pub revision: u64,
    /// Author recorded on the changeset.
    #[serde(default)]
    pub author: Option<String>,
    /// Raw backend date string; parsing is the backend client's concern.
    #[serde(default)]
    pub date: Option<String>,
    /// Log message recorded on the changeset.
    #[serde(default)]
    pub message: Option<String>,
    /// Every path touched by the changeset.
    #[serde(default)]
    pub changed_paths: BTreeMap<String, ChangedPath>,
}
