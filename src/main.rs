//! # gopin CLI Entry Point
//!
//! Parses arguments with clap and routes to the command handlers. Without a
//! subcommand, every entry of the manifest is pinned.
//!
//! Fatal errors are printed with the usual `>> ` prefix and exit with
//! status 1. Per-package problems are only warnings; the exit status stays 0.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use gopin::commands;
use gopin::ui;

#[derive(Parser)]
#[command(name = "gopin")]
#[command(about = "Pin Go dependencies to the revisions listed in a Godeps file", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Godeps file path (default: Godeps in the current dir)
    #[arg(short = 'f', long = "file", global = true, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Number of packages to fetch concurrently
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    jobs: Option<u16>,

    /// Give up on any external command after this many seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Show what would be checked out without fetching or changing anything
    #[arg(long)]
    dry_run: bool,

    /// Show commands being run and their output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare pinned revisions with what is checked out
    Status,
    /// Check that the fetch tool, GOPATH and VCS tools are available
    Doctor,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            ui::fatal(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Some(Commands::Status) => {
            commands::status::run(cli.file.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Doctor) => {
            let healthy = commands::doctor::run_doctor()?;
            Ok(if healthy {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        None => {
            let options = commands::pin::PinOptions {
                manifest: cli.file,
                jobs: cli.jobs.map(usize::from),
                timeout: cli.timeout.filter(|secs| *secs > 0).map(Duration::from_secs),
                dry_run: cli.dry_run,
                verbose: cli.verbose,
            };
            commands::pin::run(&options)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
