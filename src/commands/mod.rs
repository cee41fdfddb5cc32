//! CLI command handlers.
//!
//! - `pin` - the default command, pins every manifest entry
//! - `status` - compares pinned and checked-out revisions
//! - `doctor` - reports which external tools are available

pub mod doctor;
pub mod pin;
pub mod status;

use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::manifest::DEFAULT_MANIFEST;

pub(crate) fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().context("could not get current dir")
}

/// `explicit` if given, otherwise `Godeps` in `cwd`. Relative paths are
/// taken relative to `cwd`.
pub fn manifest_path(explicit: Option<&Path>, cwd: &Path) -> PathBuf {
    match explicit {
        Some(path) => cwd.join(path),
        None => cwd.join(DEFAULT_MANIFEST),
    }
}

pub(crate) fn open_manifest(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path)
        .with_context(|| format!("could not open Godeps file: {}", path.display()))?;
    Ok(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest_path() {
        let cwd = Path::new("/work/project");
        assert_eq!(manifest_path(None, cwd), PathBuf::from("/work/project/Godeps"));
    }

    #[test]
    fn test_relative_manifest_path() {
        let cwd = Path::new("/work/project");
        assert_eq!(
            manifest_path(Some(Path::new("deps/Godeps.prod")), cwd),
            PathBuf::from("/work/project/deps/Godeps.prod")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_absolute_manifest_path() {
        let cwd = Path::new("/work/project");
        assert_eq!(
            manifest_path(Some(Path::new("/etc/Godeps")), cwd),
            PathBuf::from("/etc/Godeps")
        );
    }

    #[test]
    fn test_missing_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = open_manifest(&dir.path().join("Godeps")).unwrap_err();
        assert!(err.to_string().starts_with("could not open Godeps file:"));
    }
}
