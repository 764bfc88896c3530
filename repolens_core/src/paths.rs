//! Ordering and joining of slash-delimited repository paths.

use std::cmp::Ordering;

/// Compare two repository paths into a strict total order.
///
/// Children sort after their parents but before greater siblings of their
/// parents. Ties on a common prefix are broken by the first differing
/// byte, treating end-of-string as a sentinel below `/` and `/` below any
/// other byte; when only one side has a separator exactly where the other
/// side ends, the separator side sorts greater.
///
/// Changed-path lists are sorted with this order before history scanning,
/// so a rewrite from the deepest copied ancestor always wins.
#[must_use]
pub fn compare_paths(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut i = 0;
    while i < a.len().min(b.len()) && a[i] == b[i] {
        i += 1;
    }

    // End-of-string sentinel, below every real byte.
    let ca = a.get(i).copied().unwrap_or(0);
    let cb = b.get(i).copied().unwrap_or(0);

    if ca == b'/' && i == b.len() {
        return Ordering::Greater;
    }
    if cb == b'/' && i == a.len() {
        return Ordering::Less;
    }
    if i < a.len() && ca == b'/' {
        return Ordering::Less;
    }
    if i < b.len() && cb == b'/' {
        return Ordering::Greater;
    }

    ca.cmp(&cb)
}

/// Join path parts into a slash-delimited repository path.
#[must_use]
pub fn join(parts: &[&str]) -> String {
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_table() {
        use Ordering::{Equal, Greater, Less};

        let cases: &[(&str, &str, Ordering)] = &[
            // Equal strings compare equal.
            ("/trunk", "/trunk", Equal),
            ("", "", Equal),
            // Children sort after their parents.
            ("/a", "/a/b", Less),
            ("/a/b", "/a", Greater),
            ("/trunk", "/trunk/src/main.c", Less),
            // A boundary separator against a terminating path.
            ("/a/", "/a", Greater),
            ("/a", "/a/", Less),
            // Children sort before greater siblings of their parents.
            ("/a/x", "/ab", Less),
            ("/ab", "/a/x", Greater),
            // Siblings order lexicographically.
            ("/trunk/alpha", "/trunk/beta", Less),
            ("/trunk/beta", "/trunk/alpha", Greater),
            // End-of-string sorts below a separator.
            ("", "/a", Less),
            ("/a", "", Greater),
            // Plain byte comparison past the common prefix.
            ("/abc", "/abd", Less),
            ("/ab0", "/abZ", Less),
        ];

        for (a, b, expected) in cases {
            assert_eq!(
                compare_paths(a, b),
                *expected,
                "compare_paths({a:?}, {b:?})"
            );
        }
    }

    #[test]
    fn reflexive_for_arbitrary_paths() {
        for path in ["", "/", "/trunk", "/trunk/a b/c.txt"] {
            assert_eq!(compare_paths(path, path), Ordering::Equal);
        }
    }

    #[test]
    fn sorted_changed_paths_put_parents_first() {
        let mut paths = vec!["/a/b/c", "/ab", "/a", "/a/b"];
        paths.sort_by(|x, y| compare_paths(x, y));
        assert_eq!(paths, vec!["/a", "/a/b", "/a/b/c", "/ab"]);
    }

    #[test]
    fn join_builds_repository_paths() {
        assert_eq!(join(&["trunk", "src", "main.c"]), "trunk/src/main.c");
        assert_eq!(join(&[]), "");
    }
}
