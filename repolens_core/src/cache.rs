//! Memoization of directory listings per (revision, path).

use std::collections::HashMap;
use std::rc::Rc;

use repolens_api::DirentSnapshot;

/// An append-only cache of directory-listing snapshots.
///
/// Entries are keyed by revision and normalized path and live as long as
/// the owning repository view; nothing is ever invalidated, since a view
/// is bound to one revision at construction. Not internally synchronized:
/// one logical caller drives a view at a time.
#[derive(Debug, Default)]
pub struct DirentCache {
    entries: HashMap<String, Rc<DirentSnapshot>>,
}

impl DirentCache {
    /// An empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the cache key for a revision and an optional directory path.
    ///
    /// The root directory is keyed by the revision alone.
    #[must_use]
    pub fn key(rev: u64, path: Option<&str>) -> String {
        match path {
            Some(path) => format!("{rev}/{path}"),
            None => rev.to_string(),
        }
    }

    /// Look up a stored snapshot.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Rc<DirentSnapshot>> {
        self.entries.get(key).cloned()
    }

    /// Store a snapshot and return the shared handle to it.
    pub fn insert(&mut self, key: String, snapshot: DirentSnapshot) -> Rc<DirentSnapshot> {
        let snapshot = Rc::new(snapshot);
        self.entries.insert(key, Rc::clone(&snapshot));
        snapshot
    }

    /// Number of cached snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no snapshots yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use repolens_api::{Dirent, NodeKind};

    use super::*;

    fn snapshot(names: &[&str]) -> DirentSnapshot {
        names
            .iter()
            .map(|name| {
                (
                    (*name).to_owned(),
                    Dirent {
                        kind: NodeKind::File,
                        created_rev: 1,
                        size: 10,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn keys_distinguish_revision_and_path() {
        assert_eq!(DirentCache::key(5, None), "5");
        assert_eq!(DirentCache::key(5, Some("trunk/src")), "5/trunk/src");
        assert_ne!(
            DirentCache::key(5, Some("trunk")),
            DirentCache::key(6, Some("trunk"))
        );
    }

    #[test]
    fn get_returns_the_stored_snapshot() {
        let mut cache = DirentCache::new();
        let key = DirentCache::key(5, Some("trunk"));
        let stored = cache.insert(key.clone(), snapshot(&["a.txt"]));

        let found = cache.get(&key).expect("cached snapshot");
        assert!(Rc::ptr_eq(&stored, &found));
        assert!(cache.get(&DirentCache::key(6, Some("trunk"))).is_none());
    }

    #[test]
    fn len_tracks_inserts() {
        let mut cache = DirentCache::new();
        assert!(cache.is_empty());
        cache.insert(DirentCache::key(5, None), snapshot(&[]));
        cache.insert(DirentCache::key(5, Some("trunk")), snapshot(&[]));
        assert_eq!(cache.len(), 2);
    }
}
