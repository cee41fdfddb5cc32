//! Package download via the external fetch tool.
//!
//! The tool is asked for an updated, download-only copy of the source
//! (`<tool> get -u -d <import-path>`). Nothing here touches the network
//! directly.

use crate::runner::{Invocation, ToolOutput, ToolRunner};
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum FetchError {
    /// The tool could not be started.
    Spawn(io::Error),
    /// The tool ran and reported failure.
    Failed(ToolOutput),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Spawn(e) => write!(f, "could not start fetch tool: {}", e),
            FetchError::Failed(output) => write!(f, "{}", output.state),
        }
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Clone)]
pub struct Fetcher {
    tool: String,
}

impl Fetcher {
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }

    pub fn invocation(&self, package: &str) -> Invocation {
        Invocation::new(&self.tool, ["get", "-u", "-d", package])
    }

    /// Download or update `package`. On success the captured tool output is
    /// returned for verbose display.
    pub fn fetch<R: ToolRunner + ?Sized>(
        &self,
        runner: &R,
        package: &str,
    ) -> Result<ToolOutput, FetchError> {
        let output = runner
            .run(&self.invocation(package))
            .map_err(FetchError::Spawn)?;
        if output.success() {
            Ok(output)
        } else {
            Err(FetchError::Failed(output))
        }
    }
}
