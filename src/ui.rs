//! Terminal output.
//!
//! Every diagnostic line starts with `>> `. Progress goes to stdout, warnings
//! and fatal errors go to stderr. The pinning pipeline never prints directly;
//! it talks to a [`Reporter`] so tests can capture what would be shown.
//!
//! ## Components
//!
//! - `Reporter` / `ConsoleReporter` - the diagnostic stream
//! - `Table` - column-aligned table used by `gopin status` and `gopin doctor`

use colored::*;
use std::cmp;

pub const PREFIX: &str = ">>";

/// Indentation applied to continuation lines of captured tool output.
const OUTPUT_INDENT: &str = "\n     ";

/// Sink for pipeline diagnostics.
pub trait Reporter: Sync {
    /// Progress message, written to stdout.
    fn info(&self, msg: &str);
    /// Recoverable problem, written to stderr.
    fn warn(&self, msg: &str);
    /// Extra detail, only shown with `--verbose`.
    fn detail(&self, msg: &str) {
        let _ = msg;
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter {
    pub verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Reporter for ConsoleReporter {
    fn info(&self, msg: &str) {
        println!("{} {}", PREFIX.green(), msg);
    }

    fn warn(&self, msg: &str) {
        eprintln!("{} {}", PREFIX.yellow(), msg);
    }

    fn detail(&self, msg: &str) {
        if self.verbose {
            println!("{} {}", PREFIX.cyan(), msg.dimmed());
        }
    }
}

/// Print a fatal error the same way warnings look, but in red.
pub fn fatal(msg: &str) {
    eprintln!("{} {}", PREFIX.red(), msg);
}

/// Re-join captured tool output so every line after the first is indented
/// under the `>> output:` label.
pub fn format_output(out: &[u8]) -> String {
    let text = String::from_utf8_lossy(out);
    let text = text.trim_end_matches(['\n', '\r']);
    text.split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .collect::<Vec<_>>()
        .join(OUTPUT_INDENT)
}

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are dropped.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn print(&self) {
        let (_, term_width) = console::Term::stdout().size();
        for line in self.render(term_width as usize) {
            println!("{}", line);
        }
    }

    /// Lay the table out within `max_width` columns. Cells that do not fit
    /// are cut and end with `…`; the last column absorbs the shrinking first.
    pub fn render(&self, max_width: usize) -> Vec<String> {
        if self.headers.is_empty() {
            return Vec::new();
        }

        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = cmp::max(widths[i], visible_len(cell));
            }
        }

        let gaps = 2 * (self.headers.len() - 1);
        let mut total: usize = widths.iter().sum::<usize>() + gaps;
        for i in (0..widths.len()).rev() {
            if total <= max_width {
                break;
            }
            let shrink = cmp::min(total - max_width, widths[i].saturating_sub(8));
            widths[i] -= shrink;
            total -= shrink;
        }

        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        let header: Vec<String> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| pad(h, widths[i]).bold().to_string())
            .collect();
        lines.push(header.join("  ").trim_end().to_string());
        let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
        lines.push(rule.join("  ").dimmed().to_string());

        for row in &self.rows {
            let cells: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, cell)| pad(&truncate(cell, widths[i]), widths[i]))
                .collect();
            lines.push(cells.join("  ").trim_end().to_string());
        }
        lines
    }
}

fn visible_len(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

fn pad(s: &str, width: usize) -> String {
    let len = visible_len(s);
    if len >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - len))
    }
}

fn truncate(s: &str, width: usize) -> String {
    let plain = strip_ansi(s);
    if plain.chars().count() <= width {
        return s.to_string();
    }
    let kept: String = plain.chars().take(width.saturating_sub(1)).collect();
    format!("{}…", kept)
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Reporter that keeps every line in memory.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingReporter {
    infos: std::sync::Mutex<Vec<String>>,
    warnings: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingReporter {
    pub fn infos(&self) -> Vec<String> {
        self.infos.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
impl Reporter for RecordingReporter {
    fn info(&self, msg: &str) {
        self.infos.lock().unwrap().push(msg.to_string());
    }

    fn warn(&self, msg: &str) {
        self.warnings.lock().unwrap().push(msg.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_output_indents_continuation_lines() {
        let out = b"error: pathspec 'nope' did not match\nhint: try again\n";
        assert_eq!(
            format_output(out),
            "error: pathspec 'nope' did not match\n     hint: try again"
        );
    }

    #[test]
    fn test_format_output_single_line() {
        assert_eq!(format_output(b"abort: unknown revision"), "abort: unknown revision");
    }

    #[test]
    fn test_format_output_crlf() {
        assert_eq!(format_output(b"one\r\ntwo\r\n"), "one\n     two");
    }

    #[test]
    fn test_table_drops_rows_with_wrong_width() {
        let mut table = Table::new(&["Package", "Revision"]);
        table.add_row(vec!["github.com/foo/bar".to_string()]);
        assert!(table.is_empty());
        table.add_row(vec!["github.com/foo/bar".to_string(), "v1".to_string()]);
        assert!(!table.is_empty());
    }

    #[test]
    fn test_table_render_truncates_to_width() {
        colored::control::set_override(false);
        let mut table = Table::new(&["Package", "Revision"]);
        table.add_row(vec![
            "github.com/some/very/long/package/path".to_string(),
            "0123456789abcdef0123456789abcdef".to_string(),
        ]);
        let lines = table.render(50);
        assert_eq!(lines.len(), 3);
        for line in &lines {
            assert!(line.chars().count() <= 50, "line too wide: {line:?}");
        }
        assert!(lines[2].contains('…'));
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[1;32mgit\x1b[0m"), "git");
    }
}
