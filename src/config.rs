//! Settings and build environment.
//!
//! `~/.gopin/config.toml` is optional:
//!
//! ```toml
//! fetch_tool = "go"   # binary used for `get -u -d`
//! jobs = 4            # concurrent fetches
//! timeout = 300       # seconds per external command
//! ```
//!
//! Command-line flags override the file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const GOPATH_VAR: &str = "GOPATH";
pub const GOROOT_VAR: &str = "GOROOT";

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub fetch_tool: String,
    pub jobs: usize,
    /// Seconds; absent means no deadline.
    pub timeout: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fetch_tool: "go".to_string(),
            jobs: 1,
            timeout: None,
        }
    }
}

impl Settings {
    /// Load the user settings file, falling back to defaults when it does
    /// not exist.
    pub fn load() -> Result<Self> {
        match settings_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("could not read settings file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid settings file {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        if settings.fetch_tool.trim().is_empty() {
            anyhow::bail!("fetch_tool must not be empty");
        }
        Ok(settings)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.filter(|secs| *secs > 0).map(Duration::from_secs)
    }
}

pub fn settings_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".gopin").join("config.toml"))
}

/// Source roots used to resolve import paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoEnv {
    pub goroot: Option<PathBuf>,
    /// `GOPATH` entries in search order.
    pub gopath: Vec<PathBuf>,
}

impl GoEnv {
    /// Read `GOPATH`/`GOROOT` from the process environment. An unset or
    /// empty `GOPATH` is an error.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(env::var_os(GOPATH_VAR), env::var_os(GOROOT_VAR))
    }

    pub fn from_vars(gopath: Option<OsString>, goroot: Option<OsString>) -> Result<Self> {
        let gopath: Vec<PathBuf> = gopath
            .as_deref()
            .map(|value| {
                env::split_paths(value)
                    .filter(|p| !p.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();
        if gopath.is_empty() {
            anyhow::bail!("{} not set", GOPATH_VAR);
        }

        let goroot = goroot
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        Ok(Self { goroot, gopath })
    }

    /// `src` directories in search order: GOROOT first, then each GOPATH.
    pub fn src_roots(&self) -> Vec<PathBuf> {
        self.goroot
            .iter()
            .chain(self.gopath.iter())
            .map(|root| root.join("src"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.fetch_tool, "go");
        assert_eq!(settings.jobs, 1);
        assert!(settings.timeout().is_none());
    }

    #[test]
    fn test_settings_parse() {
        let settings = Settings::parse(
            r#"
fetch_tool = "/usr/local/go/bin/go"
jobs = 4
timeout = 120
"#,
        )
        .unwrap();
        assert_eq!(settings.fetch_tool, "/usr/local/go/bin/go");
        assert_eq!(settings.jobs, 4);
        assert_eq!(settings.timeout(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let settings = Settings::parse("timeout = 0").unwrap();
        assert!(settings.timeout().is_none());
    }

    #[test]
    fn test_settings_rejects_unknown_keys() {
        assert!(Settings::parse("fetchtool = \"go\"").is_err());
    }

    #[test]
    fn test_settings_rejects_empty_tool() {
        assert!(Settings::parse("fetch_tool = \"  \"").is_err());
    }

    #[test]
    fn test_missing_settings_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_gopath_required() {
        assert!(GoEnv::from_vars(None, None).is_err());
        assert!(GoEnv::from_vars(Some(OsString::new()), None).is_err());
    }

    #[test]
    fn test_gopath_list() {
        let joined = env::join_paths(["/home/me/go", "/opt/shared/go"]).unwrap();
        let go = GoEnv::from_vars(Some(joined), Some(OsString::from("/usr/lib/go"))).unwrap();
        assert_eq!(
            go.gopath,
            [PathBuf::from("/home/me/go"), PathBuf::from("/opt/shared/go")]
        );
        assert_eq!(
            go.src_roots(),
            [
                PathBuf::from("/usr/lib/go/src"),
                PathBuf::from("/home/me/go/src"),
                PathBuf::from("/opt/shared/go/src"),
            ]
        );
    }

    #[test]
    fn test_empty_goroot_ignored() {
        let go = GoEnv::from_vars(Some(OsString::from("/go")), Some(OsString::new())).unwrap();
        assert!(go.goroot.is_none());
    }
}
