//! `Godeps` manifest parsing.
//!
//! One package per line:
//!
//! ```text
//! github.com/foo/bar  v1.2.3    # pinned for the new API
//! code.google.com/p/baz 42
//! ```
//!
//! Everything from the first `#` is a comment. Blank and comment-only lines
//! are skipped silently; lines with fewer than two tokens are malformed.

use std::io::{self, BufRead};

/// Name of the manifest looked up in the invocation directory.
pub const DEFAULT_MANIFEST: &str = "Godeps";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Import path, e.g. `github.com/foo/bar`
    pub package: String,
    /// Revision handed as-is to the VCS checkout command
    pub revision: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// Blank or comment-only
    Skip,
    /// Fewer than two tokens after stripping
    Malformed { line: usize },
    Entry(ManifestEntry),
}

/// Parse one raw manifest line. `line_number` is 1-based and only used to
/// label malformed lines.
pub fn parse_line(raw: &str, line_number: usize) -> ParsedLine {
    let content = raw.split('#').next().unwrap_or_default().trim();
    if content.is_empty() {
        return ParsedLine::Skip;
    }

    let mut tokens = content.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (Some(package), Some(revision)) => ParsedLine::Entry(ManifestEntry {
            package: package.to_string(),
            revision: revision.to_string(),
        }),
        _ => ParsedLine::Malformed { line: line_number },
    }
}

/// Iterate `(line_number, text)` over a manifest, 1-based. Invalid UTF-8 is
/// replaced rather than aborting the scan; line endings are stripped.
pub fn numbered_lines<R: BufRead>(
    mut reader: R,
) -> impl Iterator<Item = io::Result<(usize, String)>> {
    let mut number = 0;
    let mut buf = Vec::new();
    std::iter::from_fn(move || {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => None,
            Ok(_) => {
                number += 1;
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                    if buf.last() == Some(&b'\r') {
                        buf.pop();
                    }
                }
                Some(Ok((number, String::from_utf8_lossy(&buf).into_owned())))
            }
            Err(e) => Some(Err(e)),
        }
    })
}

/// Parse a whole manifest, keeping line numbers.
pub fn parse_manifest<R: BufRead>(reader: R) -> io::Result<Vec<(usize, ParsedLine)>> {
    numbered_lines(reader)
        .map(|item| item.map(|(number, text)| (number, parse_line(&text, number))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(package: &str, revision: &str) -> ParsedLine {
        ParsedLine::Entry(ManifestEntry {
            package: package.to_string(),
            revision: revision.to_string(),
        })
    }

    #[test]
    fn test_entry_with_trailing_comment() {
        assert_eq!(
            parse_line("github.com/foo/bar v1.2.3 # pin", 1),
            entry("github.com/foo/bar", "v1.2.3")
        );
    }

    #[test]
    fn test_comment_only_line_is_skipped() {
        assert_eq!(parse_line("   # just a comment", 3), ParsedLine::Skip);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        assert_eq!(parse_line("", 1), ParsedLine::Skip);
        assert_eq!(parse_line(" \t  ", 2), ParsedLine::Skip);
    }

    #[test]
    fn test_single_token_is_malformed() {
        assert_eq!(
            parse_line("github.com/foo/bar", 7),
            ParsedLine::Malformed { line: 7 }
        );
        assert_eq!(
            parse_line("github.com/foo/bar # v1.0", 8),
            ParsedLine::Malformed { line: 8 }
        );
    }

    #[test]
    fn test_extra_tokens_are_ignored() {
        assert_eq!(
            parse_line("github.com/foo/bar abc123 extra stuff", 1),
            entry("github.com/foo/bar", "abc123")
        );
    }

    #[test]
    fn test_tabs_and_padding() {
        assert_eq!(
            parse_line("\tgolang.org/x/net\t\tdeadbeef  ", 1),
            entry("golang.org/x/net", "deadbeef")
        );
    }

    #[test]
    fn test_comment_without_space() {
        assert_eq!(
            parse_line("gopkg.in/yaml.v2 v2.4.0#latest", 1),
            entry("gopkg.in/yaml.v2", "v2.4.0")
        );
    }

    #[test]
    fn test_numbered_lines_strips_line_endings() {
        let input = "a 1\r\n\nb 2";
        let lines: Vec<(usize, String)> = numbered_lines(input.as_bytes())
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(
            lines,
            [
                (1, "a 1".to_string()),
                (2, String::new()),
                (3, "b 2".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_manifest_keeps_physical_line_numbers() {
        let input = "\
github.com/foo/bar v1.2.3
# comment

github.com/lonely
github.com/baz/qux abc123
";
        let parsed = parse_manifest(input.as_bytes()).unwrap();
        assert_eq!(parsed.len(), 5);
        assert_eq!(parsed[0], (1, entry("github.com/foo/bar", "v1.2.3")));
        assert_eq!(parsed[1], (2, ParsedLine::Skip));
        assert_eq!(parsed[2], (3, ParsedLine::Skip));
        assert_eq!(parsed[3], (4, ParsedLine::Malformed { line: 4 }));
        assert_eq!(parsed[4], (5, entry("github.com/baz/qux", "abc123")));
    }
}
