//! `gopin status`: compare each pinned revision with what is checked out.
//!
//! Read-only: nothing is fetched and nothing is checked out.

use anyhow::Result;
use colored::*;
use std::io::BufRead;
use std::path::Path;

use crate::config::GoEnv;
use crate::deps::ImportResolver;
use crate::manifest::{self, ManifestEntry, ParsedLine};
use crate::runner::{Invocation, SystemRunner, ToolRunner};
use crate::ui::{ConsoleReporter, Reporter, Table};
use crate::vcs::{self, VcsInfo};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryState {
    /// Checked-out revision matches the pin
    Pinned,
    Differs,
    /// Package directory not found
    Missing,
    UnknownVcs,
    /// VCS tool absent or failed to report a revision
    Unreadable,
}

impl EntryState {
    fn label(&self) -> ColoredString {
        match self {
            EntryState::Pinned => "pinned".green(),
            EntryState::Differs => "differs".yellow(),
            EntryState::Missing => "missing".red(),
            EntryState::UnknownVcs => "unknown vcs".red(),
            EntryState::Unreadable => "unreadable".yellow(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntryStatus {
    pub entry: ManifestEntry,
    pub vcs: Option<&'static VcsInfo>,
    pub current: Option<String>,
    pub state: EntryState,
}

pub fn run(manifest: Option<&Path>) -> Result<()> {
    let cwd = super::current_dir()?;
    let go = GoEnv::from_env()?;
    let path = super::manifest_path(manifest, &cwd);
    let reader = super::open_manifest(&path)?;

    let reporter = ConsoleReporter::default();
    let runner = SystemRunner::default();
    let resolver = ImportResolver::new(go, cwd);
    let statuses = collect(reader, &resolver, &runner, &reporter)?;

    if statuses.is_empty() {
        reporter.info(&format!("no packages listed in {}", path.display()));
        return Ok(());
    }

    let mut table = Table::new(&["Package", "Pinned", "VCS", "Current", "State"]);
    for status in &statuses {
        table.add_row(vec![
            status.entry.package.bold().to_string(),
            status.entry.revision.clone(),
            status.vcs.map(|v| v.name).unwrap_or("-").to_string(),
            status.current.clone().unwrap_or_else(|| "-".to_string()),
            status.state.label().to_string(),
        ]);
    }
    table.print();
    Ok(())
}

/// Status of every entry, in manifest order. Malformed lines are warned
/// about and left out.
pub fn collect<B: BufRead, R: ToolRunner + ?Sized>(
    reader: B,
    resolver: &ImportResolver,
    runner: &R,
    reporter: &dyn Reporter,
) -> Result<Vec<EntryStatus>> {
    let mut out = Vec::new();
    for (number, parsed) in manifest::parse_manifest(reader)? {
        match parsed {
            ParsedLine::Skip => {}
            ParsedLine::Malformed { .. } => {
                reporter.warn(&format!("bad line {}, skipping...", number));
            }
            ParsedLine::Entry(entry) => out.push(inspect(entry, resolver, runner)),
        }
    }
    Ok(out)
}

fn inspect<R: ToolRunner + ?Sized>(
    entry: ManifestEntry,
    resolver: &ImportResolver,
    runner: &R,
) -> EntryStatus {
    let mut status = EntryStatus {
        entry,
        vcs: None,
        current: None,
        state: EntryState::Missing,
    };

    let Ok(dir) = resolver.resolve(&status.entry.package) else {
        return status;
    };
    let Some(vcs) = vcs::detect(&dir).vcs else {
        status.state = EntryState::UnknownVcs;
        return status;
    };
    status.vcs = Some(vcs);

    status.current = runner.lookup(vcs.tool).and_then(|tool| {
        let invocation = Invocation {
            program: tool.to_string_lossy().into_owned(),
            args: vcs.current_args(),
            dir: Some(dir.clone()),
        };
        let output = runner.run(&invocation).ok().filter(|o| o.success())?;
        String::from_utf8_lossy(&output.combined)
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
    });

    status.state = match &status.current {
        None => EntryState::Unreadable,
        Some(current) if revisions_match(&status.entry.revision, current) => EntryState::Pinned,
        Some(_) => EntryState::Differs,
    };
    status
}

/// Hash prefixes on either side count as a match; hg marks a dirty tree
/// with a trailing `+`.
fn revisions_match(pinned: &str, current: &str) -> bool {
    let current = current.trim_end_matches('+');
    if pinned == current {
        return true;
    }
    let is_hex = |s: &str| s.len() >= 7 && s.chars().all(|c| c.is_ascii_hexdigit());
    is_hex(pinned) && is_hex(current) && (pinned.starts_with(current) || current.starts_with(pinned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::FakeRunner;
    use crate::ui::RecordingReporter;
    use std::fs;

    fn resolver_with(packages: &[(&str, Option<&str>)]) -> (tempfile::TempDir, ImportResolver) {
        let dir = tempfile::tempdir().unwrap();
        let gopath = dir.path().join("go");
        for (import_path, marker) in packages {
            let pkg = gopath.join("src").join(import_path);
            fs::create_dir_all(&pkg).unwrap();
            if let Some(marker) = marker {
                fs::create_dir_all(pkg.join(marker)).unwrap();
            }
        }
        let env = GoEnv {
            goroot: None,
            gopath: vec![gopath],
        };
        let resolver = ImportResolver::new(env, dir.path().to_path_buf());
        (dir, resolver)
    }

    #[test]
    fn test_revisions_match() {
        assert!(revisions_match("v1.2.3", "v1.2.3"));
        assert!(revisions_match("abc1234", "abc1234def5678"));
        assert!(revisions_match("abc1234def5678", "abc1234+"));
        assert!(!revisions_match("abc", "abcdef"));
        assert!(!revisions_match("v1.2.3", "abc1234def5678"));
    }

    #[test]
    fn test_collect_states() {
        let (_dir, resolver) = resolver_with(&[
            ("github.com/foo/bar", Some(".git")),
            ("github.com/baz/qux", Some(".git")),
            ("example.com/plain", None),
        ]);
        let manifest = "\
github.com/foo/bar abc123
github.com/baz/qux abc123def
example.com/plain v1
github.com/not/fetched v2
broken
";
        // FakeRunner prints "abc123" for every successful command.
        let runner = FakeRunner::default();
        let reporter = RecordingReporter::default();
        let statuses = collect(manifest.as_bytes(), &resolver, &runner, &reporter).unwrap();

        let states: Vec<EntryState> = statuses.iter().map(|s| s.state.clone()).collect();
        assert_eq!(
            states,
            [
                EntryState::Pinned,
                EntryState::Differs,
                EntryState::UnknownVcs,
                EntryState::Missing,
            ]
        );
        assert_eq!(statuses[0].current.as_deref(), Some("abc123"));
        assert_eq!(reporter.warnings(), ["bad line 5, skipping..."]);

        let git = runner.calls_to("/usr/bin/git");
        assert_eq!(git[0].args, ["rev-parse", "HEAD"]);
    }

    #[test]
    fn test_missing_tool_is_unreadable() {
        let (_dir, resolver) = resolver_with(&[("hg.example.org/repo", Some(".hg"))]);
        let runner = FakeRunner::missing(&["hg"]);
        let reporter = RecordingReporter::default();
        let statuses =
            collect("hg.example.org/repo 42\n".as_bytes(), &resolver, &runner, &reporter).unwrap();
        assert_eq!(statuses[0].state, EntryState::Unreadable);
        assert!(runner.calls().is_empty());
    }
}
