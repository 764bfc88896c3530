use std::fmt;

use serde::{Deserialize, Serialize};

/// A revision specifier accepted from callers.
///
/// Callers may name a revision either by number or with the `HEAD` marker
/// meaning "the latest revision the backend knows about". Any other textual
/// form is rejected by [`Rev::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rev {
    /// The latest available revision.
    Head,
    /// A specific numbered revision.
    Number(u64),
}

impl Rev {
    /// Parse a caller-supplied revision string.
    ///
    /// Accepts a non-negative integer or the literal `HEAD`
    /// (case-insensitive). Returns `None` for anything else; the browsing
    /// core maps that to its invalid-revision error.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("HEAD") {
            return Some(Self::Head);
        }
        raw.parse().ok().map(Self::Number)
    }
}

impl fmt::Display for Rev {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Head => write!(f, "HEAD"),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

/// A single revision in a file's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Revision number. History ordering is purely by this id.
    pub id: u64,
    /// Commit timestamp in seconds since the epoch, when the backend's
    /// date string could be parsed.
    #[serde(default)]
    pub date: Option<i64>,
    /// Author recorded on the changeset.
    #[serde(default)]
    pub author: Option<String>,
    /// Log message recorded on the changeset.
    #[serde(default)]
    pub message: Option<String>,
    /// The chronologically earlier revision of the same logical file,
    /// if any. Set by the history chaining step.
    #[serde(default)]
    pub prev: Option<Box<Revision>>,
    /// The path this revision's log entry was reported against. Tracks
    /// the file's older names across renames and copies.
    pub path: String,
    /// File size at this revision, when known.
    #[serde(default)]
    pub size: Option<u64>,
    /// Owner of a lock on the path, when known.
    #[serde(default)]
    pub lock_owner: Option<String>,
}

/// Options controlling per-file history collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LogOptions {
    /// Record every changeset in the scanned range, not just those that
    /// touched the target path.
    #[serde(default)]
    pub show_all_dir_logs: bool,
    /// Follow history across copy boundaries. When false, traversal stops
    /// at the first copy.
    #[serde(default)]
    pub cross_copies: bool,
}
