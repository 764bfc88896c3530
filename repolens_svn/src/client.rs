//! `SvnClient` implementation over the `svn` command-line client.

use std::collections::BTreeMap;
use std::env;
use std::io::Write;
use std::process::{Command, Output, Stdio};

use repolens_api::{ChangeAction, ChangedPath, Changeset, Dirent, DirentSnapshot, NodeKind, Rev};
use repolens_core::client::{ClientError, ClientResult, SvnClient};

/// Reads the Subversion binary path from `$SVN`, falling back to `svn`.
fn binary_from_env() -> String {
    match env::var("SVN") {
        Ok(value) if !value.trim().is_empty() => value.trim().to_owned(),
        _ => "svn".to_owned(),
    }
}

/// A blocking Subversion backend that shells out to the `svn` client.
///
/// All invocations run non-interactively; credential configuration is the
/// client installation's concern, not this crate's.
#[derive(Debug, Clone)]
pub struct CommandClient {
    binary: String,
}

impl CommandClient {
    /// A client using the `$SVN` environment variable or `svn`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            binary: binary_from_env(),
        }
    }

    /// A client using an explicit binary path.
    #[must_use]
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// The binary this client invokes.
    #[must_use]
    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn run(&self, args: &[&str]) -> ClientResult<Output> {
        let output = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ClientError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if output.status.success() {
            Ok(output)
        } else {
            Err(ClientError::CommandFailed {
                command: format!("{} {}", self.binary, args.join(" ")),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            })
        }
    }
}

impl Default for CommandClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SvnClient for CommandClient {
    fn list_entries(&self, url: &str, rev: Rev) -> ClientResult<DirentSnapshot> {
        let rev_arg = rev.to_string();
        let output = self.run(&[
            "list",
            "--verbose",
            "--non-interactive",
            "--revision",
            &rev_arg,
            url,
        ])?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut entries = BTreeMap::new();
        for line in stdout.lines() {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            let (name, dirent) = parse_list_line(line)?;
            entries.insert(name, dirent);
        }
        Ok(entries)
    }

    fn log(
        &self,
        urls: &[&str],
        from: Rev,
        to: Rev,
        discover_changed_paths: bool,
        stop_on_copy: bool,
        visit: &mut dyn FnMut(Changeset) -> ClientResult<()>,
    ) -> ClientResult<()> {
        let range = format!("{from}:{to}");
        let mut args = vec!["log", "--non-interactive", "--revision", range.as_str()];
        if discover_changed_paths {
            args.push("--verbose");
        }
        if stop_on_copy {
            args.push("--stop-on-copy");
        }
        args.extend_from_slice(urls);

        let output = self.run(&args)?;
        parse_log_output(&String::from_utf8_lossy(&output.stdout), visit)
    }

    fn cat(&self, url: &str, rev: Rev, sink: &mut dyn Write) -> ClientResult<()> {
        let rev_arg = rev.to_string();
        let mut child = Command::new(&self.binary)
            .args(["cat", "--non-interactive", "--revision", &rev_arg, url])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| ClientError::Spawn {
                binary: self.binary.clone(),
                source,
            })?;

        if let Some(mut stdout) = child.stdout.take() {
            std::io::copy(&mut stdout, sink)?;
        }

        let output = child.wait_with_output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ClientError::CommandFailed {
                command: format!("{} cat --revision {rev_arg} {url}", self.binary),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            })
        }
    }

    fn parse_date(&self, raw: &str) -> Option<i64> {
        let raw = raw.trim();
        // Subversion's own date cstrings are ISO-8601 with microseconds.
        if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.timestamp());
        }
        // Log headers append a human-readable form in parentheses.
        let head = raw.split(" (").next()?;
        chrono::DateTime::parse_from_str(head.trim(), "%Y-%m-%d %H:%M:%S %z")
            .ok()
            .map(|parsed| parsed.timestamp())
    }
}

fn unexpected(context: &'static str, line: &str) -> ClientError {
    ClientError::UnexpectedOutput {
        context,
        line: line.to_owned(),
    }
}

/// Split the next whitespace-delimited token off `s`, returning the token
/// and the unconsumed remainder.
fn take_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(end) => Some((&s[..end], &s[end..])),
        None => Some((s, "")),
    }
}

/// Parse one `svn list --verbose` row into a named dirent.
///
/// Rows read `rev author [size] month day year-or-time name`; directories
/// carry no size column and end with a slash. Names may contain spaces.
fn parse_list_line(line: &str) -> ClientResult<(String, Dirent)> {
    let (rev_token, rest) = take_token(line).ok_or_else(|| unexpected("svn list", line))?;
    let created_rev: u64 = rev_token
        .parse()
        .map_err(|_| unexpected("svn list", line))?;

    let (_author, rest) = take_token(rest).ok_or_else(|| unexpected("svn list", line))?;

    // A numeric token here is the size; otherwise it is already the month
    // of the date column and the row is a directory.
    let (size, rest) = match take_token(rest) {
        Some((token, after)) => match token.parse::<u64>() {
            Ok(size) => (size, after),
            Err(_) => (0, rest),
        },
        None => return Err(unexpected("svn list", line)),
    };

    let mut rest = rest;
    for _ in 0..3 {
        let (_date_token, after) = take_token(rest).ok_or_else(|| unexpected("svn list", line))?;
        rest = after;
    }

    let name = rest.trim();
    if name.is_empty() {
        return Err(unexpected("svn list", line));
    }

    Ok(match name.strip_suffix('/') {
        Some(dir_name) => (
            dir_name.to_owned(),
            Dirent {
                kind: NodeKind::Directory,
                created_rev,
                size,
            },
        ),
        None => (
            name.to_owned(),
            Dirent {
                kind: NodeKind::File,
                created_rev,
                size,
            },
        ),
    })
}

fn is_separator(line: &str) -> bool {
    !line.is_empty() && line.bytes().all(|byte| byte == b'-')
}

/// Parse `r5 | alice | 2026-02-23 ... | 1 line` header fields.
fn parse_log_header(line: &str) -> ClientResult<(u64, Option<String>, Option<String>)> {
    let mut fields = line.split(" | ");
    let revision = fields
        .next()
        .and_then(|field| field.trim().strip_prefix('r'))
        .and_then(|digits| digits.parse().ok())
        .ok_or_else(|| unexpected("svn log header", line))?;

    let author = fields
        .next()
        .map(str::trim)
        .filter(|field| !field.is_empty() && *field != "(no author)")
        .map(str::to_owned);
    let date = fields
        .next()
        .map(str::trim)
        .filter(|field| !field.is_empty() && *field != "(no date)")
        .map(str::to_owned);

    Ok((revision, author, date))
}

/// Parse one `Changed paths:` row, e.g.
/// `   A /trunk/new.txt (from /trunk/old.txt:3)`.
fn parse_changed_path(line: &str) -> ClientResult<(String, ChangedPath)> {
    let trimmed = line.trim();
    let (action_token, path_part) = trimmed
        .split_once(' ')
        .ok_or_else(|| unexpected("svn log changed path", line))?;

    let action = match action_token {
        "A" => ChangeAction::Added,
        "M" => ChangeAction::Modified,
        "D" => ChangeAction::Deleted,
        "R" => ChangeAction::Replaced,
        _ => return Err(unexpected("svn log changed path", line)),
    };

    let path_part = path_part.trim();
    if let Some(prefix) = path_part.strip_suffix(')') {
        if let Some((path, from)) = prefix.rsplit_once(" (from ") {
            let (copy_path, copy_rev) = from
                .rsplit_once(':')
                .ok_or_else(|| unexpected("svn log changed path", line))?;
            let copy_rev: u64 = copy_rev
                .parse()
                .map_err(|_| unexpected("svn log changed path", line))?;
            return Ok((
                path.trim().to_owned(),
                ChangedPath {
                    action,
                    copy_from_path: Some(copy_path.to_owned()),
                    copy_from_rev: Some(copy_rev),
                },
            ));
        }
    }

    Ok((
        path_part.to_owned(),
        ChangedPath {
            action,
            copy_from_path: None,
            copy_from_rev: None,
        },
    ))
}

/// Fold an `svn log` transcript into changesets, invoking `visit` once per
/// changeset in output order (newest first for a descending range).
fn parse_log_output(
    text: &str,
    visit: &mut dyn FnMut(Changeset) -> ClientResult<()>,
) -> ClientResult<()> {
    let mut lines = text.lines().peekable();

    while let Some(line) = lines.next() {
        if !is_separator(line.trim_end()) {
            continue;
        }
        let Some(header) = lines.next() else {
            break;
        };
        let (revision, author, date) = parse_log_header(header)?;

        let mut changed_paths = BTreeMap::new();
        if lines
            .peek()
            .is_some_and(|peeked| peeked.trim_end() == "Changed paths:")
        {
            lines.next();
            while let Some(peeked) = lines.peek() {
                if peeked.trim().is_empty() || is_separator(peeked.trim_end()) {
                    break;
                }
                let (path, change) = parse_changed_path(peeked)?;
                changed_paths.insert(path, change);
                lines.next();
            }
        }

        // One blank line separates the header block from the message.
        if lines.peek().is_some_and(|peeked| peeked.trim().is_empty()) {
            lines.next();
        }

        let mut message_lines = Vec::new();
        while let Some(peeked) = lines.peek() {
            if is_separator(peeked.trim_end()) {
                break;
            }
            message_lines.push(*peeked);
            lines.next();
        }
        let message = if message_lines.is_empty() {
            None
        } else {
            Some(message_lines.join("\n"))
        };

        visit(Changeset {
            revision,
            author,
            date,
            message,
            changed_paths,
        })?;
    }
    Ok(())
}
