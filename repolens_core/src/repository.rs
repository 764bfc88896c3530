//! The repository browsing facade bound to one backend revision.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::rc::Rc;

use repolens_api::{DirEntry, DirentSnapshot, LogOptions, NodeKind, Rev, Revision};
use tempfile::NamedTempFile;

use crate::cache::DirentCache;
use crate::client::SvnClient;
use crate::diff::FileDiff;
use crate::history::{link_history, LogCollector};
use crate::paths;
use crate::{Error, Result};

/// A browsing view of one repository, permanently bound to a revision.
///
/// Construction resolves the backend's youngest revision; every later
/// operation either succeeds or fails independently, with no further
/// state transitions. Directory listings are memoized for the lifetime of
/// the view. One logical caller drives a view at a time.
pub struct Repository {
    name: String,
    root_url: String,
    rev: u64,
    youngest: u64,
    client: Box<dyn SvnClient>,
    dirents: DirentCache,
}

/// Decoration data resolved for one created-revision.
#[derive(Debug, Clone, Default)]
struct ChangesetInfo {
    rev: Option<u64>,
    author: Option<String>,
    date: Option<i64>,
    message: Option<String>,
}

impl Repository {
    /// Open a view of the repository at `root_url`.
    ///
    /// The youngest revision is resolved by listing the root at `HEAD` and
    /// taking the maximum created-revision among its entries. With no
    /// requested revision (or `HEAD`) the view binds to the youngest;
    /// a numbered request beyond the youngest is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRevision`] when the requested revision
    /// exceeds the youngest, or a client error if the root listing fails.
    pub fn open(
        name: impl Into<String>,
        root_url: impl Into<String>,
        rev: Option<Rev>,
        client: Box<dyn SvnClient>,
    ) -> Result<Self> {
        let name = name.into();
        let root_url = root_url.into();

        let head_listing = client.list_entries(&root_url, Rev::Head)?;
        let youngest = head_listing
            .values()
            .map(|dirent| dirent.created_rev)
            .max()
            .unwrap_or(0);

        let rev = match rev {
            None | Some(Rev::Head) => youngest,
            Some(Rev::Number(number)) => {
                if number > youngest {
                    return Err(Error::InvalidRevision {
                        rev: number.to_string(),
                    });
                }
                number
            }
        };

        let mut dirents = DirentCache::new();
        if rev == youngest {
            // The HEAD root listing is also the listing at the youngest
            // revision; an older binding must fetch its own.
            dirents.insert(DirentCache::key(rev, None), head_listing);
        }

        Ok(Self {
            name,
            root_url,
            rev,
            youngest,
            client,
            dirents,
        })
    }

    /// The display name this view was opened under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The backend URL of the repository root.
    #[must_use]
    pub fn root_url(&self) -> &str {
        &self.root_url
    }

    /// The revision this view is bound to.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.rev
    }

    /// The youngest revision resolved at construction.
    #[must_use]
    pub const fn youngest_revision(&self) -> u64 {
        self.youngest
    }

    /// Whether `path_parts` names a file or a directory at the bound
    /// revision. The empty path is always a directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ItemNotFound`] when the name is absent from its
    /// parent's listing, or a client error if the listing fails.
    pub fn item_type(&mut self, path_parts: &[&str]) -> Result<NodeKind> {
        let Some((name, parent)) = path_parts.split_last() else {
            return Ok(NodeKind::Directory);
        };
        let rev = self.rev;
        let dirents = self.get_dirents(parent, rev)?;
        dirents
            .get(*name)
            .map(|dirent| dirent.kind)
            .ok_or_else(|| Error::ItemNotFound {
                path: paths::join(path_parts),
            })
    }

    /// List the directory at `path_parts`, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a client error if the backend listing fails.
    pub fn list_directory(&mut self, path_parts: &[&str]) -> Result<Vec<DirEntry>> {
        let rev = self.rev;
        let dirents = self.get_dirents(path_parts, rev)?;
        Ok(dirents
            .iter()
            .map(|(name, dirent)| DirEntry::new(name.clone(), dirent.kind))
            .collect())
    }

    /// Stream the file at `path_parts` into temporary storage and return
    /// a reader over it along with the effective revision.
    ///
    /// The reader deletes its backing file when dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRevision`] for a revision beyond the
    /// youngest, [`Error::TempFile`] when backing storage fails, or a
    /// client error from the content fetch.
    pub fn open_file(&self, path_parts: &[&str], rev: Option<Rev>) -> Result<(FileContents, u64)> {
        let rev = self.effective_rev(rev)?;
        let url = self.url_for(path_parts);

        let mut file = NamedTempFile::new().map_err(|source| Error::TempFile { source })?;
        self.client.cat(&url, Rev::Number(rev), &mut file)?;
        file.seek(SeekFrom::Start(0))
            .map_err(|source| Error::TempFile { source })?;

        Ok((FileContents { inner: file }, rev))
    }

    /// Decorate a batch of directory entries with their most recent
    /// changeset metadata and sizes, in place.
    ///
    /// Resolution is keyed by each entry's created-revision and memoized
    /// within the batch, so entries sharing a created-revision cost one
    /// backend log query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ItemNotFound`] when an entry's name is absent from
    /// the directory listing, or a client error from the log queries.
    pub fn directory_log(
        &mut self,
        path_parts: &[&str],
        entries: &mut [DirEntry],
        _options: &LogOptions,
    ) -> Result<()> {
        let rev = self.rev;
        let dirents = self.get_dirents(path_parts, rev)?;

        let mut memo: HashMap<u64, ChangesetInfo> = HashMap::new();
        for entry in entries.iter_mut() {
            let Some(dirent) = dirents.get(&entry.name) else {
                return Err(Error::ItemNotFound {
                    path: if path_parts.is_empty() {
                        entry.name.clone()
                    } else {
                        format!("{}/{}", paths::join(path_parts), entry.name)
                    },
                });
            };

            let info = match memo.get(&dirent.created_rev) {
                Some(info) => info.clone(),
                None => {
                    let info = self.last_changeset(dirent.created_rev)?;
                    memo.insert(dirent.created_rev, info.clone());
                    info
                }
            };

            entry.rev = info.rev;
            entry.author = info.author;
            entry.date = info.date;
            entry.message = info.message;
            entry.size = Some(dirent.size);
        }
        Ok(())
    }

    /// Collect the ordered, `prev`-linked history of the file at
    /// `path_parts`, oldest first.
    ///
    /// The scan always runs from the bound revision down to revision 1;
    /// `rev` is validated against the view but does not narrow the scan.
    /// With `cross_copies` unset, traversal stops at the first copy
    /// boundary; with `show_all_dir_logs`, every changeset in range is
    /// recorded.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRevision`] for a revision beyond the
    /// youngest, or a client error from the changeset stream.
    pub fn file_log(
        &self,
        path_parts: &[&str],
        rev: Option<Rev>,
        options: &LogOptions,
    ) -> Result<Vec<Revision>> {
        self.effective_rev(rev)?;

        let full_name = paths::join(path_parts);
        let url = self.url_for(path_parts);

        let mut collector = LogCollector::new(&full_name, options.show_all_dir_logs);
        self.client.log(
            &[url.as_str()],
            Rev::Number(self.rev),
            Rev::Number(1),
            true,
            !options.cross_copies,
            &mut |changeset| {
                let date = changeset
                    .date
                    .as_deref()
                    .and_then(|raw| self.client.parse_date(raw));
                collector.observe(&changeset, date);
                Ok(())
            },
        )?;

        Ok(link_history(collector.into_history()))
    }

    /// Prepare a textual diff between two (path, revision) pairs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TempFile`] when backing storage fails, or a client
    /// error from either content fetch.
    pub fn diff(
        &self,
        path_parts1: &[&str],
        rev1: Rev,
        path_parts2: &[&str],
        rev2: Rev,
        diff_options: &[String],
    ) -> Result<FileDiff> {
        FileDiff::fetch(
            self.client.as_ref(),
            &self.url_for(path_parts1),
            rev1,
            &self.url_for(path_parts2),
            rev2,
            diff_options,
        )
    }

    fn effective_rev(&self, rev: Option<Rev>) -> Result<u64> {
        match rev {
            None | Some(Rev::Head) => Ok(self.rev),
            Some(Rev::Number(number)) => {
                if number > self.youngest {
                    return Err(Error::InvalidRevision {
                        rev: number.to_string(),
                    });
                }
                Ok(number)
            }
        }
    }

    fn url_for(&self, path_parts: &[&str]) -> String {
        if path_parts.is_empty() {
            self.root_url.clone()
        } else {
            format!("{}/{}", self.root_url, paths::join(path_parts))
        }
    }

    fn get_dirents(&mut self, path_parts: &[&str], rev: u64) -> Result<Rc<DirentSnapshot>> {
        let (key, url) = if path_parts.is_empty() {
            (DirentCache::key(rev, None), self.root_url.clone())
        } else {
            let path = paths::join(path_parts);
            let key = DirentCache::key(rev, Some(&path));
            (key, format!("{}/{}", self.root_url, path))
        };

        if let Some(snapshot) = self.dirents.get(&key) {
            return Ok(snapshot);
        }
        let snapshot = self.client.list_entries(&url, Rev::Number(rev))?;
        Ok(self.dirents.insert(key, snapshot))
    }

    fn last_changeset(&self, rev: u64) -> Result<ChangesetInfo> {
        let mut info: Option<ChangesetInfo> = None;
        self.client.log(
            &[self.root_url.as_str()],
            Rev::Number(rev),
            Rev::Number(rev),
            false,
            false,
            &mut |changeset| {
                if info.is_none() {
                    let date = changeset
                        .date
                        .as_deref()
                        .and_then(|raw| self.client.parse_date(raw));
                    info = Some(ChangesetInfo {
                        rev: Some(changeset.revision),
                        author: changeset.author,
                        date,
                        message: changeset.message,
                    });
                }
                Ok(())
            },
        )?;
        Ok(info.unwrap_or_default())
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("name", &self.name)
            .field("root_url", &self.root_url)
            .field("rev", &self.rev)
            .field("youngest", &self.youngest)
            .finish_non_exhaustive()
    }
}

/// A reader over fetched file content backed by a temporary file.
///
/// The backing file is removed when the reader is dropped; removal of an
/// already-deleted file is silently tolerated.
#[derive(Debug)]
pub struct FileContents {
    inner: NamedTempFile,
}

impl FileContents {
    /// Filesystem path of the backing temporary file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }
}

impl Read for FileContents {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::io::Write;

    use repolens_api::{Changeset, Dirent};

    use crate::client::{ClientError, ClientResult};

    use super::*;

    struct RootOnlyClient {
        root: DirentSnapshot,
    }

    impl SvnClient for RootOnlyClient {
        fn list_entries(&self, _url: &str, _rev: Rev) -> ClientResult<DirentSnapshot> {
            Ok(self.root.clone())
        }

        fn log(
            &self,
            _urls: &[&str],
            _from: Rev,
            _to: Rev,
            _discover_changed_paths: bool,
            _stop_on_copy: bool,
            _visit: &mut dyn FnMut(Changeset) -> ClientResult<()>,
        ) -> ClientResult<()> {
            Ok(())
        }

        fn cat(&self, url: &str, _rev: Rev, _sink: &mut dyn Write) -> ClientResult<()> {
            Err(ClientError::CommandFailed {
                command: format!("cat {url}"),
                status: "1".into(),
                stderr: "no content in this fixture".into(),
            })
        }

        fn parse_date(&self, raw: &str) -> Option<i64> {
            raw.parse().ok()
        }
    }

    fn root_client() -> Box<RootOnlyClient> {
        let mut root = BTreeMap::new();
        root.insert(
            "trunk".to_owned(),
            Dirent {
                kind: NodeKind::Directory,
                created_rev: 5,
                size: 0,
            },
        );
        root.insert(
            "README.txt".to_owned(),
            Dirent {
                kind: NodeKind::File,
                created_rev: 3,
                size: 42,
            },
        );
        Box::new(RootOnlyClient { root })
    }

    #[test]
    fn open_binds_to_youngest_by_default() -> Result<()> {
        let repo = Repository::open("demo", "http://svn.example.com/repo", None, root_client())?;
        assert_eq!(repo.revision(), 5);
        assert_eq!(repo.youngest_revision(), 5);
        Ok(())
    }

    #[test]
    fn open_rejects_revision_beyond_youngest() {
        let result = Repository::open(
            "demo",
            "http://svn.example.com/repo",
            Some(Rev::Number(9)),
            root_client(),
        );
        assert!(matches!(result, Err(Error::InvalidRevision { .. })));
    }

    #[test]
    fn open_accepts_older_revision() -> Result<()> {
        let repo = Repository::open(
            "demo",
            "http://svn.example.com/repo",
            Some(Rev::Number(3)),
            root_client(),
        )?;
        assert_eq!(repo.revision(), 3);
        assert_eq!(repo.youngest_revision(), 5);
        Ok(())
    }

    #[test]
    fn empty_path_is_always_a_directory() -> Result<()> {
        let mut repo =
            Repository::open("demo", "http://svn.example.com/repo", None, root_client())?;
        assert_eq!(repo.item_type(&[])?, NodeKind::Directory);
        Ok(())
    }

    #[test]
    fn item_type_reports_missing_names() -> Result<()> {
        let mut repo =
            Repository::open("demo", "http://svn.example.com/repo", None, root_client())?;
        assert_eq!(repo.item_type(&["README.txt"])?, NodeKind::File);
        assert_eq!(repo.item_type(&["trunk"])?, NodeKind::Directory);
        let missing = repo.item_type(&["nope.txt"]);
        assert!(matches!(missing, Err(Error::ItemNotFound { path }) if path == "nope.txt"));
        Ok(())
    }
}
