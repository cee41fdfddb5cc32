//! Import-path resolution.
//!
//! Mirrors a find-only package lookup in a GOPATH workspace: nothing is
//! parsed, only the directory that would hold the package is located.

use crate::config::GoEnv;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    InvalidPath(String),
    NotFound { package: String, searched: Vec<PathBuf> },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::InvalidPath(package) => {
                write!(f, "invalid import path: {:?}", package)
            }
            ResolveError::NotFound { package, searched } => {
                write!(f, "cannot find package {:?} in any of:", package)?;
                for dir in searched {
                    write!(f, "\n\t{}", dir.display())?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ResolveError {}

/// Locates package sources on disk.
#[derive(Debug, Clone)]
pub struct ImportResolver {
    env: GoEnv,
    /// Directory imports are resolved from (the invocation directory).
    src_dir: PathBuf,
}

impl ImportResolver {
    pub fn new(env: GoEnv, src_dir: PathBuf) -> Self {
        Self { env, src_dir }
    }

    /// Directory holding `package`.
    ///
    /// Lookup order: local (`./`, `../`) paths against the source directory,
    /// then `vendor/` directories from the source directory up to its GOPATH
    /// `src` root, then GOROOT, then each GOPATH entry.
    pub fn resolve(&self, package: &str) -> Result<PathBuf, ResolveError> {
        if is_local_import(package) {
            let dir = self.src_dir.join(package);
            return if dir.is_dir() {
                Ok(dir)
            } else {
                Err(ResolveError::NotFound {
                    package: package.to_string(),
                    searched: vec![dir],
                })
            };
        }

        validate_import_path(package)?;

        let mut searched = Vec::new();
        for candidate in self.candidates(package) {
            if candidate.is_dir() {
                return Ok(candidate);
            }
            searched.push(candidate);
        }

        Err(ResolveError::NotFound {
            package: package.to_string(),
            searched,
        })
    }

    fn candidates(&self, package: &str) -> Vec<PathBuf> {
        let rel = import_to_relative(package);
        let mut out: Vec<PathBuf> = self
            .vendor_dirs()
            .into_iter()
            .map(|vendor| vendor.join(&rel))
            .collect();
        out.extend(self.env.src_roots().into_iter().map(|root| root.join(&rel)));
        out
    }

    /// `vendor` directories visible from the source directory, innermost
    /// first, ending with `<gopath>/src/vendor`. Only applies inside a
    /// GOPATH `src` tree.
    fn vendor_dirs(&self) -> Vec<PathBuf> {
        let Some(root) = self
            .env
            .gopath
            .iter()
            .map(|gopath| gopath.join("src"))
            .find(|root| self.src_dir.starts_with(root))
        else {
            return Vec::new();
        };

        self.src_dir
            .ancestors()
            .take_while(|dir| dir.starts_with(&root))
            .map(|dir| dir.join("vendor"))
            .collect()
    }
}

fn is_local_import(package: &str) -> bool {
    package == "." || package == ".." || package.starts_with("./") || package.starts_with("../")
}

fn validate_import_path(package: &str) -> Result<(), ResolveError> {
    let invalid = || ResolveError::InvalidPath(package.to_string());
    if package.is_empty() || package.starts_with('/') || package.contains('\\') {
        return Err(invalid());
    }
    if Path::new(package).is_absolute() {
        return Err(invalid());
    }
    for segment in package.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(invalid());
        }
    }
    Ok(())
}

fn import_to_relative(package: &str) -> PathBuf {
    package.split('/').collect()
}
