//! Textual diffing of two fetched file revisions.

use std::env;
use std::io::{self, Read, Seek, SeekFrom};
use std::process::{Child, Command, Stdio};

use repolens_api::Rev;
use tempfile::NamedTempFile;

use crate::client::{ClientError, SvnClient};
use crate::{Error, Result};

/// Reads the diff tool binary from `$DIFF`, falling back to `diff`.
fn diff_binary() -> String {
    match env::var("DIFF") {
        Ok(value) if !value.trim().is_empty() => value.trim().to_owned(),
        _ => "diff".to_owned(),
    }
}

/// Two file revisions fetched into temporary storage, ready to diff.
///
/// Both backing files are removed when the value (or the stream spawned
/// from it) is dropped, on every exit path.
#[derive(Debug)]
pub struct FileDiff {
    left: NamedTempFile,
    right: NamedTempFile,
    options: Vec<String>,
}

impl FileDiff {
    pub(crate) fn fetch(
        client: &dyn SvnClient,
        left_url: &str,
        left_rev: Rev,
        right_url: &str,
        right_rev: Rev,
        options: &[String],
    ) -> Result<Self> {
        let left = fetch_side(client, left_url, left_rev)?;
        let right = fetch_side(client, right_url, right_rev)?;
        Ok(Self {
            left,
            right,
            options: options.to_vec(),
        })
    }

    /// Whether either side looks binary.
    ///
    /// Sniffs the first KiB of each fetched side for NUL bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TempFile`] when the backing files cannot be read.
    pub fn is_binary(&mut self) -> Result<bool> {
        Ok(sniff_binary(&mut self.left)? || sniff_binary(&mut self.right)?)
    }

    /// Spawn the diff tool over both sides and stream its output.
    ///
    /// The diff tool's own exit status is not inspected: "differences
    /// found" is an expected outcome, and the stream simply ends when the
    /// tool does.
    ///
    /// # Errors
    ///
    /// Returns a spawn failure when the diff binary cannot be started.
    pub fn stream(self) -> Result<DiffStream> {
        let binary = diff_binary();
        let mut command = Command::new(&binary);
        command
            .args(&self.options)
            .arg(self.left.path())
            .arg(self.right.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        let child = command.spawn().map_err(|source| Error::Client {
            source: ClientError::Spawn { binary, source },
        })?;

        Ok(DiffStream {
            child,
            _left: self.left,
            _right: self.right,
        })
    }
}

/// A readable byte stream over the diff tool's output.
///
/// Holds the temporary files alive while the tool runs; dropping the
/// stream reaps the child process and removes both files.
#[derive(Debug)]
pub struct DiffStream {
    child: Child,
    _left: NamedTempFile,
    _right: NamedTempFile,
}

impl Read for DiffStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.child.stdout.as_mut() {
            Some(stdout) => stdout.read(buf),
            None => Ok(0),
        }
    }
}

impl Drop for DiffStream {
    fn drop(&mut self) {
        // Reap the child even when the caller stops reading early; kill
        // failures on an already-exited child are irrelevant.
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn fetch_side(client: &dyn SvnClient, url: &str, rev: Rev) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new().map_err(|source| Error::TempFile { source })?;
    client.cat(url, rev, &mut file)?;
    file.seek(SeekFrom::Start(0))
        .map_err(|source| Error::TempFile { source })?;
    Ok(file)
}

fn sniff_binary(file: &mut NamedTempFile) -> Result<bool> {
    file.seek(SeekFrom::Start(0))
        .map_err(|source| Error::TempFile { source })?;
    let mut head = Vec::with_capacity(1024);
    file.by_ref()
        .take(1024)
        .read_to_end(&mut head)
        .map_err(|source| Error::TempFile { source })?;
    Ok(head.contains(&0))
}
