//! # gopin - pin Go dependencies to exact revisions
//!
//! gopin reads a `Godeps` manifest (one `<import-path> <revision>` per line),
//! downloads each package with `go get -u -d`, works out which
//! version-control system manages the download and checks out the pinned
//! revision with that system's own tool.
//!
//! ## Quick Start
//!
//! ```bash
//! # Pin everything listed in ./Godeps
//! gopin
//!
//! # Use another manifest, fetching four packages at a time
//! gopin -f deps/Godeps.prod -j 4
//!
//! # Compare pins with what is checked out
//! gopin status
//! ```
//!
//! ## Module Organization
//!
//! - [`manifest`] - Manifest line parsing
//! - [`vcs`] - VCS registry and detection
//! - [`deps`] - Package fetching and import-path resolution
//! - [`pin`] - Per-entry pinning pipeline
//! - [`commands`] - CLI command handlers

/// CLI command handlers.
pub mod commands;

/// Settings file and GOPATH/GOROOT environment.
pub mod config;

/// Package fetching and import-path resolution.
pub mod deps;

/// `Godeps` manifest parsing.
pub mod manifest;

/// Fetch → locate → detect → checkout for one entry.
pub mod pin;

/// External command execution.
pub mod runner;

/// Terminal output.
pub mod ui;

/// Version-control registry and detection.
pub mod vcs;
