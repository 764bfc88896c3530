//! The seam between the browsing core and a version-control backend.

use std::io::Write;

use repolens_api::{Changeset, DirentSnapshot, Rev};

/// Result type for backend client operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Failures reported by a backend client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The backend process could not be started.
    #[error("failed to spawn {binary}: {source}")]
    Spawn {
        /// The binary that failed to start.
        binary: String,
        /// Source I/O error returned by the standard library.
        #[source]
        source: std::io::Error,
    },
    /// The backend reported a failure for the issued command.
    #[error("`{command}` failed ({status}): {stderr}")]
    CommandFailed {
        /// The command that was issued.
        command: String,
        /// The process exit status.
        status: String,
        /// Captured standard error, trimmed.
        stderr: String,
    },
    /// The backend produced output the client could not interpret.
    #[error("unexpected {context} output: {line}")]
    UnexpectedOutput {
        /// What was being parsed.
        context: &'static str,
        /// The offending line.
        line: String,
    },
    /// An I/O error occurred while talking to the backend.
    #[error("backend I/O error: {source}")]
    Io {
        /// Source I/O error returned by the standard library.
        #[from]
        source: std::io::Error,
    },
}

/// Blocking access to a centralized version-control backend.
///
/// Every call blocks until the backend responds; there are no retries and
/// no cancellation. Process-wide backend bootstrap, authentication wiring
/// and wire-protocol details live entirely behind implementations of this
/// trait.
pub trait SvnClient {
    /// List the directory at `url` as of `rev`, keyed by child name.
    ///
    /// # Errors
    ///
    /// Implementations surface any transport or backend failure.
    fn list_entries(&self, url: &str, rev: Rev) -> ClientResult<DirentSnapshot>;

    /// Stream the changesets touching `urls` from `from` down to `to`.
    ///
    /// Changesets are delivered newest-to-oldest when `from > to`. With
    /// `discover_changed_paths` set, each changeset carries its full
    /// changed-path map; with `stop_on_copy`, traversal halts at the first
    /// copy boundary.
    ///
    /// # Errors
    ///
    /// Fails on transport or backend errors, or when `visit` itself
    /// returns an error.
    fn log(
        &self,
        urls: &[&str],
        from: Rev,
        to: Rev,
        discover_changed_paths: bool,
        stop_on_copy: bool,
        visit: &mut dyn FnMut(Changeset) -> ClientResult<()>,
    ) -> ClientResult<()>;

    /// Stream the file content at `url` as of `rev` into `sink`.
    ///
    /// # Errors
    ///
    /// Implementations surface any transport or backend failure.
    fn cat(&self, url: &str, rev: Rev, sink: &mut dyn Write) -> ClientResult<()>;

    /// Parse a backend date string into seconds since the epoch.
    ///
    /// Returns `None` when the string cannot be interpreted; history
    /// records then carry no timestamp.
    fn parse_date(&self, raw: &str) -> Option<i64>;
}
