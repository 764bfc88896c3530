//! Core library for repolens' repository browsing workflow.
//!
//! The crate adapts a centralized version-control backend to the uniform
//! browsing contract a web viewer consumes:
//! - revision-aware path resolution and history reconstruction
//! - directory-listing memoization per (revision, path)
//! - file content and diff streaming through temporary storage
//!
//! The backend itself is reached through the [`client::SvnClient`] seam;
//! `repolens_svn` provides the command-line implementation.

#![warn(
    clippy::all,
    clippy::cargo,
    clippy::nursery,
    clippy::pedantic,
    missing_docs
)]
#![cfg_attr(
    not(test),
    deny(
        clippy::dbg_macro,
        clippy::expect_used,
        clippy::panic,
        clippy::print_stderr,
        clippy::print_stdout,
        clippy::todo,
        clippy::unwrap_used
    )
)]

/// Directory-listing memoization.
pub mod cache;
/// The backend collaborator seam.
pub mod client;
/// File diffing through temporary storage.
pub mod diff;
/// History collection and revision chaining.
pub mod history;
/// Repository path ordering and joining.
pub mod paths;
/// The repository browsing facade.
pub mod repository;

/// Shared data models, re-exported for consumers of the core.
pub use repolens_api as api;

/// Common result type for the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the browsing core.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested revision is unparsable or exceeds the youngest known
    /// revision.
    #[error("invalid revision: {rev}")]
    InvalidRevision {
        /// The offending revision as supplied by the caller.
        rev: String,
    },
    /// The path is absent from its parent's listing.
    #[error("item not found in repository: {path}")]
    ItemNotFound {
        /// The path that failed to resolve.
        path: String,
    },
    /// The backend client failed; propagated unchanged, never locally
    /// recovered.
    #[error("backend client error: {source}")]
    Client {
        /// The underlying client failure.
        #[from]
        source: client::ClientError,
    },
    /// Temporary storage for content or diff plumbing could not be
    /// allocated or read back.
    #[error("temporary storage failure: {source}")]
    TempFile {
        /// Source I/O error returned by the standard library.
        #[source]
        source: std::io::Error,
    },
}
