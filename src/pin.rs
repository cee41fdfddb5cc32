//! Revision pinning for a single manifest entry.
//!
//! Each entry walks `Parsed → Fetched → Located → VcsDetected → CheckedOut`.
//! Any stage may stop the entry with a [`PinError`]; the caller reports it
//! and moves on to the next entry. The package directory is passed
//! explicitly to detection and to the checkout command, so the process
//! working directory is never changed.

use crate::deps::{FetchError, Fetcher, ImportResolver, ResolveError};
use crate::manifest::ManifestEntry;
use crate::runner::{Invocation, ToolOutput, ToolRunner};
use crate::ui::{self, Reporter};
use crate::vcs::{self, VcsInfo};
use std::fmt;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Parsed,
    Fetched,
    Located,
    VcsDetected,
    CheckedOut,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Parsed => "parsed",
            Stage::Fetched => "fetched",
            Stage::Located => "located",
            Stage::VcsDetected => "vcs detected",
            Stage::CheckedOut => "checked out",
        };
        f.write_str(name)
    }
}

/// Why an entry could not be pinned.
#[derive(Debug)]
pub enum PinError {
    Fetch {
        package: String,
        source: FetchError,
    },
    Locate {
        package: String,
        source: ResolveError,
    },
    UnknownVcs {
        package: String,
        dir: PathBuf,
    },
    ToolMissing {
        tool: &'static str,
    },
    Spawn {
        tool: &'static str,
        dir: PathBuf,
        source: io::Error,
    },
    Checkout {
        package: String,
        vcs: &'static VcsInfo,
        output: ToolOutput,
    },
}

impl PinError {
    /// Last stage the entry reached before failing.
    pub fn stage(&self) -> Stage {
        match self {
            PinError::Fetch { .. } => Stage::Parsed,
            PinError::Locate { .. } => Stage::Fetched,
            PinError::UnknownVcs { .. } => Stage::Located,
            PinError::ToolMissing { .. } | PinError::Spawn { .. } | PinError::Checkout { .. } => {
                Stage::VcsDetected
            }
        }
    }

    /// Captured tool output worth showing under the warning.
    pub fn output(&self) -> Option<&[u8]> {
        match self {
            PinError::Fetch {
                source: FetchError::Failed(output),
                ..
            } if !output.combined.is_empty() => Some(output.combined.as_slice()),
            PinError::Checkout { output, .. } if !output.combined.is_empty() => {
                Some(output.combined.as_slice())
            }
            _ => None,
        }
    }

    /// Underlying cause, for verbose output.
    pub fn cause(&self) -> Option<String> {
        match self {
            PinError::Fetch { source, .. } => Some(source.to_string()),
            PinError::Locate { source, .. } => Some(source.to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for PinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PinError::Fetch { package, .. } => write!(f, "error getting: {}", package),
            PinError::Locate { package, .. } => write!(
                f,
                "could not get information about {} - version not set",
                package
            ),
            PinError::UnknownVcs { package, .. } => {
                write!(f, "unknown VCS type for package {}", package)
            }
            PinError::ToolMissing { tool } => write!(f, "tool '{}' was not found in PATH", tool),
            PinError::Spawn { tool, dir, source } => {
                write!(f, "could not run '{}' in {}: {}", tool, dir.display(), source)
            }
            PinError::Checkout { output, .. } => {
                write!(f, "error setting version: {}", output.state)
            }
        }
    }
}

impl std::error::Error for PinError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinOutcome {
    Pinned {
        vcs: &'static VcsInfo,
        dir: PathBuf,
    },
    /// Dry run: the checkout that would have been run.
    Planned(Invocation),
}

impl PinOutcome {
    pub fn stage(&self) -> Stage {
        match self {
            PinOutcome::Pinned { .. } => Stage::CheckedOut,
            PinOutcome::Planned(_) => Stage::VcsDetected,
        }
    }
}

pub struct Pinner<'a, R: ToolRunner + ?Sized> {
    runner: &'a R,
    fetcher: &'a Fetcher,
    resolver: &'a ImportResolver,
    reporter: &'a dyn Reporter,
    dry_run: bool,
}

impl<'a, R: ToolRunner + ?Sized> Pinner<'a, R> {
    pub fn new(
        runner: &'a R,
        fetcher: &'a Fetcher,
        resolver: &'a ImportResolver,
        reporter: &'a dyn Reporter,
    ) -> Self {
        Self {
            runner,
            fetcher,
            resolver,
            reporter,
            dry_run: false,
        }
    }

    /// Skip fetching and only print the checkout that would run.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run every stage for `entry`.
    pub fn pin(&self, entry: &ManifestEntry) -> Result<PinOutcome, PinError> {
        self.fetch(entry)?;
        self.settle(entry)
    }

    /// `Parsed → Fetched`. Safe to call from several threads at once.
    pub fn fetch(&self, entry: &ManifestEntry) -> Result<(), PinError> {
        if self.dry_run {
            self.reporter.detail(&format!(
                "would run: {}",
                self.fetcher.invocation(&entry.package)
            ));
            return Ok(());
        }

        self.reporter
            .info(&format!("getting package {}", entry.package));
        let output = self
            .fetcher
            .fetch(self.runner, &entry.package)
            .map_err(|source| PinError::Fetch {
                package: entry.package.clone(),
                source,
            })?;
        if !output.combined.is_empty() {
            self.reporter
                .detail(&format!("output: {}", ui::format_output(&output.combined)));
        }
        Ok(())
    }

    /// `Fetched → Located → VcsDetected → CheckedOut`.
    pub fn settle(&self, entry: &ManifestEntry) -> Result<PinOutcome, PinError> {
        let dir = self
            .resolver
            .resolve(&entry.package)
            .map_err(|source| PinError::Locate {
                package: entry.package.clone(),
                source,
            })?;
        self.reporter
            .detail(&format!("{} is at {}", entry.package, dir.display()));

        let detection = vcs::detect(&dir);
        for err in &detection.errors {
            self.reporter.warn(&format!(
                "could not check for dir '{}' in {}",
                err.marker,
                dir.display()
            ));
            self.reporter.detail(&format!("{}: {}", err.path.display(), err.source));
        }
        let Some(vcs) = detection.vcs else {
            return Err(PinError::UnknownVcs {
                package: entry.package.clone(),
                dir,
            });
        };

        self.reporter.info(&format!(
            "setting package {} ({}) to version: {}",
            entry.package, vcs.name, entry.revision
        ));

        let invocation = Invocation::new(vcs.tool, vcs.checkout_args(&entry.revision)).in_dir(&dir);
        if self.dry_run {
            self.reporter.info(&format!("would run: {}", invocation));
            return Ok(PinOutcome::Planned(invocation));
        }

        let Some(tool_path) = self.runner.lookup(vcs.tool) else {
            return Err(PinError::ToolMissing { tool: vcs.tool });
        };
        self.reporter.detail(&format!("running {}", invocation));

        let invocation = Invocation {
            program: tool_path.to_string_lossy().into_owned(),
            ..invocation
        };
        let output = self
            .runner
            .run(&invocation)
            .map_err(|source| PinError::Spawn {
                tool: vcs.tool,
                dir: dir.clone(),
                source,
            })?;
        if !output.success() {
            return Err(PinError::Checkout {
                package: entry.package.clone(),
                vcs,
                output,
            });
        }

        Ok(PinOutcome::Pinned { vcs, dir })
    }
}
