//! Default command: pin every manifest entry.
//!
//! Lines are processed in file order. A failure on one line is reported and
//! the scan moves on; only setup problems (no working directory, no fetch
//! tool, no GOPATH, unreadable manifest) are fatal.

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::io::BufRead;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{GoEnv, Settings};
use crate::deps::{Fetcher, ImportResolver};
use crate::manifest::{self, ManifestEntry, ParsedLine};
use crate::pin::{PinError, PinOutcome, Pinner};
use crate::runner::{SystemRunner, ToolRunner};
use crate::ui::{self, ConsoleReporter, Reporter};

#[derive(Debug, Clone, Default)]
pub struct PinOptions {
    /// Manifest path; defaults to `Godeps` in the working directory
    pub manifest: Option<PathBuf>,
    /// Concurrent fetches; `None` uses the settings file
    pub jobs: Option<usize>,
    /// Per-command deadline; `None` uses the settings file
    pub timeout: Option<Duration>,
    pub dry_run: bool,
    pub verbose: bool,
}

/// Counts for the closing summary line.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub lines: usize,
    pub pinned: usize,
    pub planned: usize,
    pub failed: usize,
    pub malformed: usize,
}

impl Summary {
    fn record(&mut self, result: &Result<PinOutcome, PinError>) {
        match result {
            Ok(PinOutcome::Pinned { .. }) => self.pinned += 1,
            Ok(PinOutcome::Planned(_)) => self.planned += 1,
            Err(_) => self.failed += 1,
        }
    }

    /// `done: X pinned, Y failed, Z skipped`, with "planned" in a dry run.
    pub fn describe(&self) -> String {
        let done = if self.planned > 0 {
            format!("{} planned", self.planned)
        } else {
            format!("{} pinned", self.pinned)
        };
        format!(
            "done: {}, {} failed, {} skipped",
            done, self.failed, self.malformed
        )
    }
}

/// `gopin [-f FILE]`
pub fn run(options: &PinOptions) -> Result<()> {
    let cwd = super::current_dir()?;
    let settings = Settings::load()?;

    let tool = which::which(&settings.fetch_tool)
        .ok()
        .with_context(|| format!("{} tool not found in PATH", settings.fetch_tool))?;
    let go = GoEnv::from_env()?;

    let manifest_path = super::manifest_path(options.manifest.as_deref(), &cwd);
    let reader = super::open_manifest(&manifest_path)?;

    let reporter = ConsoleReporter::new(options.verbose);
    let runner = SystemRunner::new(options.timeout.or_else(|| settings.timeout()));
    let fetcher = Fetcher::new(tool.to_string_lossy());
    let resolver = ImportResolver::new(go, cwd);
    let pinner = Pinner::new(&runner, &fetcher, &resolver, &reporter).dry_run(options.dry_run);

    let jobs = options.jobs.unwrap_or(settings.jobs).max(1);
    let summary = pin_manifest(reader, &pinner, &reporter, jobs)?;
    reporter.info(&summary.describe());
    Ok(())
}

/// Drive `pinner` over every line of a manifest.
pub fn pin_manifest<B: BufRead, R: ToolRunner + ?Sized>(
    reader: B,
    pinner: &Pinner<'_, R>,
    reporter: &dyn Reporter,
    jobs: usize,
) -> Result<Summary> {
    if jobs > 1 {
        return pin_concurrently(reader, pinner, reporter, jobs);
    }

    let mut summary = Summary::default();
    for item in manifest::numbered_lines(reader) {
        let Some((number, text)) = read_or_stop(item, summary.lines, reporter) else {
            break;
        };
        summary.lines = number;
        if let Some(entry) = accept_line(&text, number, reporter, &mut summary) {
            let result = pinner.pin(&entry);
            report(&entry, &result, reporter);
            summary.record(&result);
        }
    }
    Ok(summary)
}

/// Parse everything, fetch on a bounded pool, then locate and check out
/// sequentially in file order.
fn pin_concurrently<B: BufRead, R: ToolRunner + ?Sized>(
    reader: B,
    pinner: &Pinner<'_, R>,
    reporter: &dyn Reporter,
    jobs: usize,
) -> Result<Summary> {
    let mut summary = Summary::default();
    let mut entries: Vec<ManifestEntry> = Vec::new();
    for item in manifest::numbered_lines(reader) {
        let Some((number, text)) = read_or_stop(item, summary.lines, reporter) else {
            break;
        };
        summary.lines = number;
        if let Some(entry) = accept_line(&text, number, reporter, &mut summary) {
            entries.push(entry);
        }
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .context("could not start fetch workers")?;
    let fetched: Vec<Result<(), PinError>> =
        pool.install(|| entries.par_iter().map(|entry| pinner.fetch(entry)).collect());

    for (entry, fetch) in entries.iter().zip(fetched) {
        let result = fetch.and_then(|()| pinner.settle(entry));
        report(entry, &result, reporter);
        summary.record(&result);
    }
    Ok(summary)
}

fn read_or_stop(
    item: std::io::Result<(usize, String)>,
    last_line: usize,
    reporter: &dyn Reporter,
) -> Option<(usize, String)> {
    match item {
        Ok(line) => Some(line),
        Err(e) => {
            reporter.warn(&format!(
                "could not read line {}: {}, stopping",
                last_line + 1,
                e
            ));
            None
        }
    }
}

fn accept_line(
    text: &str,
    number: usize,
    reporter: &dyn Reporter,
    summary: &mut Summary,
) -> Option<ManifestEntry> {
    match manifest::parse_line(text, number) {
        ParsedLine::Skip => None,
        ParsedLine::Malformed { line } => {
            reporter.warn(&format!("bad line {}, skipping...", line));
            summary.malformed += 1;
            None
        }
        ParsedLine::Entry(entry) => Some(entry),
    }
}

fn report(entry: &ManifestEntry, result: &Result<PinOutcome, PinError>, reporter: &dyn Reporter) {
    match result {
        Ok(outcome) => reporter.detail(&format!("{}: {}", entry.package, outcome.stage())),
        Err(err) => {
            reporter.warn(&err.to_string());
            if let Some(out) = err.output() {
                reporter.warn(&format!("output: {}", ui::format_output(out)));
            }
            if let Some(cause) = err.cause() {
                reporter.detail(&cause);
            }
            reporter.detail(&format!("{}: stopped after {}", entry.package, err.stage()));
        }
    }
}
