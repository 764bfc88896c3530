//! History collection with rename tracking, and revision chaining.

use repolens_api::{Changeset, Revision};

use crate::paths::compare_paths;

/// Reconstructs one target path's history from a changeset stream.
///
/// Backends report renames and copies as metadata on the destination path,
/// so the collector walks revisions newest-to-oldest and rewrites the
/// tracked path to the copy source whenever the current name was itself a
/// copy target. [`LogCollector::observe`] must therefore be driven in
/// descending revision order.
#[derive(Debug)]
pub struct LogCollector {
    /// The tracked path, held with a leading slash internally.
    path: String,
    revisions: Vec<Revision>,
    show_all: bool,
}

impl LogCollector {
    /// Start collecting history for `path`.
    ///
    /// With `show_all` set, every observed changeset is recorded, not just
    /// those that touched the tracked path.
    #[must_use]
    pub fn new(path: &str, show_all: bool) -> Self {
        let path = if path.is_empty() {
            "/".to_owned()
        } else if path.starts_with('/') {
            path.to_owned()
        } else {
            format!("/{path}")
        };
        Self {
            path,
            revisions: Vec::new(),
            show_all,
        }
    }

    /// Fold one changeset into the collected history.
    ///
    /// `date` is the changeset's timestamp as parsed by the backend client,
    /// if available. Changesets must arrive in descending revision order
    /// for rename tracking to hold.
    pub fn observe(&mut self, changeset: &Changeset, date: Option<i64>) {
        let mut changed: Vec<&str> = changeset
            .changed_paths
            .keys()
            .map(String::as_str)
            .collect();
        changed.sort_by(|a, b| compare_paths(a, b));

        let mut this_path: Option<String> = None;
        if let Some(change) = changeset.changed_paths.get(&self.path) {
            this_path = Some(match &change.copy_from_path {
                // History continues under the old name.
                Some(source) => source.clone(),
                None => self.path.clone(),
            });
        } else {
            for changed_path in &changed {
                // A copied ancestor moves our history under the copy
                // source. The sort puts deeper ancestors later, so the
                // deepest copied ancestor wins.
                let Some(rest) = self.path.strip_prefix(changed_path) else {
                    continue;
                };
                if !rest.starts_with('/') {
                    continue;
                }
                if let Some(source) = &changeset.changed_paths[*changed_path].copy_from_path {
                    this_path = Some(format!("{source}{rest}"));
                }
            }
        }

        if self.show_all || this_path.is_some() {
            self.revisions.push(Revision {
                id: changeset.revision,
                date,
                author: changeset.author.clone(),
                message: changeset.message.clone(),
                prev: None,
                // Recorded against the pre-rewrite name, slash stripped.
                path: self.path[1..].to_owned(),
                size: None,
                lock_owner: None,
            });
        }
        if let Some(path) = this_path {
            self.path = path;
        }
    }

    /// The collected revisions, in arrival (descending-id) order.
    #[must_use]
    pub fn into_history(self) -> Vec<Revision> {
        self.revisions
    }
}

/// Order collected revisions ascending by id and link each record's
/// `prev` to the immediately preceding one.
///
/// Walking `prev` from the newest record visits every record exactly once
/// in strictly decreasing id order; the earliest record's `prev` is
/// `None`.
#[must_use]
pub fn link_history(mut revisions: Vec<Revision>) -> Vec<Revision> {
    revisions.sort_by_key(|revision| revision.id);
    let mut prev: Option<Box<Revision>> = None;
    for revision in &mut revisions {
        revision.prev = prev.take();
        prev = Some(Box::new(revision.clone()));
    }
    revisions
}
